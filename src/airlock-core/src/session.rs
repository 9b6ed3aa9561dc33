//! Bootstrap session: one launch, start to finish.
//!
//! The session object owns the configuration and argument vector for a
//! single launch and carries the "packaged path was used" flag as an
//! explicit field. Diagnostic helpers that only make sense after a packaged
//! launch fail with a structured error instead of asserting.
//!
//! Exactly one session drives a process; the pipelines here are strictly
//! sequential and the final invoke blocks until the module terminates.

use std::path::PathBuf;

use log::info;

use crate::args::Arguments;
use crate::bundle::DistributionBundle;
use crate::cache;
use crate::classifier::{classify, Signature};
use crate::config::Config;
use crate::context::{EntryPoint, EntrySpec, LoadingContext, NativeContext};
use crate::error::{BootstrapError, Result};
use crate::locator::locate_module;
use crate::origin::Origin;

/// State for one bootstrap launch.
pub struct BootstrapSession {
    config: Config,
    arguments: Arguments,
    packaged: bool,
    cached_libraries: Vec<PathBuf>,
}

impl BootstrapSession {
    pub fn new(config: Config, arguments: Arguments) -> Self {
        Self {
            config,
            arguments,
            packaged: false,
            cached_libraries: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Whether this session went through the packaged (bundle + cache)
    /// bootstrap path. Read-only to the rest of the system.
    pub fn was_packaged(&self) -> bool {
        self.packaged
    }

    /// Cached support-library paths, in bundle order.
    ///
    /// # Errors
    /// Fails with `NotPackaged` when the packaged bootstrap path was not
    /// taken; there is no cache to report on in that case.
    pub fn packaged_library_paths(&self) -> Result<&[PathBuf]> {
        if !self.packaged {
            return Err(BootstrapError::NotPackaged);
        }
        Ok(&self.cached_libraries)
    }

    /// Machine-readable description of a packaged launch, for diagnostics.
    pub fn launch_report(&self) -> Result<serde_json::Value> {
        let libraries: Vec<String> = self
            .packaged_library_paths()?
            .iter()
            .map(|p| p.display().to_string())
            .collect();

        Ok(serde_json::json!({
            "packaged": self.packaged,
            "cache_dir": self.config.cache.path.display().to_string(),
            "libraries": libraries,
            "arguments": self.arguments.raw(),
        }))
    }

    /// Packaged path: make the library cache current, then resolve the
    /// framework entry from a context over the cached libraries only.
    pub fn prepare_packaged(
        &mut self,
        bundle: &DistributionBundle,
        version: &str,
    ) -> Result<Box<dyn EntryPoint>> {
        info!(
            "packaged launch from bundle {} (version {})",
            bundle.path().display(),
            version
        );

        self.cached_libraries = cache::ensure_cache(&self.config.cache.path, bundle, version)?;
        self.packaged = true;

        let context = NativeContext::new(vec![Origin::open(&self.config.cache.path)?]);
        context.resolve_entry(&EntrySpec::new(
            &self.config.entry.framework_module,
            &self.config.entry.framework_symbol,
        ))
    }

    /// Run the packaged path to completion. Blocks for the lifetime of the
    /// framework.
    pub fn run_packaged(&mut self, bundle: &DistributionBundle, version: &str) -> Result<()> {
        let entry = self.prepare_packaged(bundle, version)?;
        entry.invoke(self.arguments.raw())
    }

    /// Hosted path: classify the configured origins, fall back to the
    /// module locator when classification did not see the target, and
    /// resolve the module entry from a child context shielded by the
    /// system-origin parent boundary.
    pub fn prepare_hosted(&mut self) -> Result<Box<dyn EntryPoint>> {
        let origins = self
            .config
            .origins
            .iter()
            .map(Origin::open)
            .collect::<Result<Vec<_>>>()?;

        info!("hosted launch over {} origins", origins.len());
        let classification = classify(origins, Signature::all())?;

        let mut module_origins: Vec<Origin> = classification.unmatched().to_vec();
        match classification.target() {
            Some(target) => {
                // Dev environments put the module on the origin list
                // directly; no search needed.
                module_origins.push(target.clone());
            }
            None => {
                let path = locate_module(
                    self.config.module.path.as_deref(),
                    &self.arguments.launch_directory(),
                    &self.config.module.prefix,
                    &self.config.module.extension,
                )?;
                module_origins.push(Origin::open(path)?);
            }
        }

        let system: Vec<Origin> = classification
            .system_origins()
            .into_iter()
            .cloned()
            .collect();

        let parent = NativeContext::new(system);
        let context = NativeContext::with_parent(module_origins, parent);
        context.resolve_entry(&EntrySpec::new(
            &self.config.entry.module_name,
            &self.config.entry.module_symbol,
        ))
    }

    /// Run the hosted path to completion. Blocks for the lifetime of the
    /// module.
    pub fn run_hosted(&mut self) -> Result<()> {
        let entry = self.prepare_hosted()?;
        entry.invoke(self.arguments.raw())
    }
}
