//! Loading contexts and entry invocation.
//!
//! A loading context is an ownership-bearing handle over a set of origins.
//! Its visible namespace is exactly the union of those origins' loadable
//! libraries, with no inheritance from the caller unless a parent context is
//! explicitly chained. A context exposes two effectful operations and
//! nothing else: resolving a named entry, and invoking it.
//!
//! The native implementation resolves entries with `libloading`. Entry
//! symbols use the conventional C main shape,
//! `extern "C" fn(argc, argv) -> status`; the symbol's actual argument shape
//! cannot be verified through the dynamic loader, so a mismatch surfaces as
//! a module failure at invocation, not at resolution.

use std::cell::OnceCell;
use std::env::consts::{DLL_EXTENSION, DLL_PREFIX};
use std::ffi::{c_char, c_int, CString};
use std::fs::{self, File};
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use libloading::Library;
use log::{debug, info};
use tar::Archive;
use tempfile::TempDir;

use crate::error::{BootstrapError, Result};
use crate::origin::{Origin, OriginKind};

/// A named entry: a module (library) name plus the symbol to invoke on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySpec {
    pub module: String,
    pub symbol: String,
}

impl EntrySpec {
    pub fn new(module: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            symbol: symbol.into(),
        }
    }
}

/// C ABI shape every entry symbol must have.
pub type EntryFn = unsafe extern "C" fn(c_int, *const *const c_char) -> c_int;

/// A resolved, invocable entry symbol.
pub trait EntryPoint {
    /// Call the entry with the raw argument vector. Blocks until the module
    /// terminates. Every failure, including panics crossing this boundary,
    /// is re-wrapped as `TargetExecution`.
    fn invoke(&self, args: &[String]) -> Result<()>;
}

impl std::fmt::Debug for dyn EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn EntryPoint")
    }
}

/// An isolated namespace from which entries can be resolved.
pub trait LoadingContext {
    fn resolve_entry(&self, spec: &EntrySpec) -> Result<Box<dyn EntryPoint>>;
}

/// Loading context backed by the platform's dynamic loader.
pub struct NativeContext {
    origins: Vec<Origin>,
    parent: Option<Box<NativeContext>>,
    /// Scratch directory for libraries materialized out of archive origins.
    /// Created on first use, removed when the context is dropped.
    scratch: OnceCell<TempDir>,
}

impl NativeContext {
    /// Context over exactly the given origins, inheriting nothing.
    pub fn new(origins: Vec<Origin>) -> Self {
        Self {
            origins,
            parent: None,
            scratch: OnceCell::new(),
        }
    }

    /// Child context chained to a protective parent boundary. Resolution
    /// tries this context's own origins first, then the parent's.
    pub fn with_parent(origins: Vec<Origin>, parent: NativeContext) -> Self {
        Self {
            origins,
            parent: Some(Box::new(parent)),
            scratch: OnceCell::new(),
        }
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    /// Find and, for archive origins, materialize the library file for
    /// `module` within this context's namespace.
    fn find_library(&self, module: &str) -> Result<Option<PathBuf>> {
        let plain = format!("{module}.{DLL_EXTENSION}");
        let prefixed = format!("{DLL_PREFIX}{module}.{DLL_EXTENSION}");

        for origin in &self.origins {
            match origin.kind() {
                OriginKind::Library => {
                    let name = origin.path().file_name().and_then(|n| n.to_str());
                    if name == Some(plain.as_str()) || name == Some(prefixed.as_str()) {
                        return Ok(Some(origin.path().to_path_buf()));
                    }
                }
                OriginKind::Directory => {
                    for candidate in [origin.path().join(&plain), origin.path().join(&prefixed)]
                    {
                        if candidate.is_file() {
                            return Ok(Some(candidate));
                        }
                    }
                }
                OriginKind::Archive => {
                    let has_lib = origin.entries()?.iter().any(|e| {
                        let name = e.rsplit('/').next().unwrap_or(e);
                        name == plain || name == prefixed
                    });
                    if has_lib {
                        return self.materialize(origin, &plain, &prefixed).map(Some);
                    }
                }
            }
        }

        match &self.parent {
            Some(parent) => parent.find_library(module),
            None => Ok(None),
        }
    }

    /// Extract the matching library entry from an archive origin into the
    /// context's scratch directory.
    fn materialize(&self, origin: &Origin, plain: &str, prefixed: &str) -> Result<PathBuf> {
        let scratch = self.scratch_dir()?;

        let file = File::open(origin.path()).map_err(|e| {
            BootstrapError::io(
                format!("failed to open origin archive: {}", origin.path().display()),
                e,
            )
        })?;
        let mut archive = Archive::new(GzDecoder::new(file));
        let entries = archive
            .entries()
            .map_err(|e| self.archive_error(origin, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| self.archive_error(origin, e))?;
            let path = entry.path().map_err(|e| self.archive_error(origin, e))?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                continue;
            };

            if name == plain || name == prefixed {
                let dest = scratch.join(&name);
                let mut out = File::create(&dest).map_err(|e| {
                    BootstrapError::io(format!("failed to create {}", dest.display()), e)
                })?;
                io::copy(&mut entry, &mut out)
                    .map_err(|e| self.archive_error(origin, e))?;

                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(&dest, fs::Permissions::from_mode(0o755)).map_err(
                        |e| BootstrapError::io(format!("failed to chmod {}", dest.display()), e),
                    )?;
                }

                debug!(
                    "materialized {} from {}",
                    dest.display(),
                    origin.path().display()
                );
                return Ok(dest);
            }
        }

        // The entry listing said it was there; treat the mismatch as a
        // truncated or rewritten archive.
        Err(BootstrapError::io(
            format!("library vanished from archive: {}", origin.path().display()),
            io::Error::new(io::ErrorKind::NotFound, "archive entry disappeared"),
        ))
    }

    fn scratch_dir(&self) -> Result<&Path> {
        if let Some(dir) = self.scratch.get() {
            return Ok(dir.path());
        }

        let dir = TempDir::new()
            .map_err(|e| BootstrapError::io("failed to create context scratch directory", e))?;
        Ok(self.scratch.get_or_init(|| dir).path())
    }

    fn archive_error(&self, origin: &Origin, e: io::Error) -> BootstrapError {
        BootstrapError::io(
            format!("failed to read origin archive: {}", origin.path().display()),
            e,
        )
    }
}

impl LoadingContext for NativeContext {
    fn resolve_entry(&self, spec: &EntrySpec) -> Result<Box<dyn EntryPoint>> {
        let resolution_failure = |detail: String, source| BootstrapError::SymbolResolution {
            module: spec.module.clone(),
            symbol: spec.symbol.clone(),
            detail,
            source,
        };

        let path = self.find_library(&spec.module)?.ok_or_else(|| {
            resolution_failure("no loadable library for this module in the context".into(), None)
        })?;

        let library = unsafe { Library::new(&path) }.map_err(|e| {
            resolution_failure(
                format!("loader rejected {}", path.display()),
                Some(Box::new(e) as crate::error::Cause),
            )
        })?;

        let mut symbol_name = spec.symbol.clone().into_bytes();
        symbol_name.push(0);
        let func = unsafe { library.get::<EntryFn>(&symbol_name) }.map_err(|e| {
            resolution_failure(
                format!("symbol missing from {}", path.display()),
                Some(Box::new(e) as crate::error::Cause),
            )
        })?;
        let func = *func;

        info!("resolved entry {}::{} at {}", spec.module, spec.symbol, path.display());

        Ok(Box::new(NativeEntry {
            spec: spec.clone(),
            _library: library,
            func,
        }))
    }
}

/// Entry resolved by `NativeContext`. Keeps the library mapped for as long
/// as the entry is alive; the function pointer is only valid alongside it.
struct NativeEntry {
    spec: EntrySpec,
    _library: Library,
    func: EntryFn,
}

impl EntryPoint for NativeEntry {
    fn invoke(&self, args: &[String]) -> Result<()> {
        let name = format!("{}::{}", self.spec.module, self.spec.symbol);

        let cstrings = args
            .iter()
            .map(|a| CString::new(a.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BootstrapError::TargetExecution {
                cause: format!("argument not representable for {name}"),
                source: Some(Box::new(e)),
            })?;
        let argv: Vec<*const c_char> = cstrings.iter().map(|c| c.as_ptr()).collect();

        info!("invoking {} with {} arguments", name, args.len());
        guard_invoke(&name, || unsafe {
            (self.func)(argv.len() as c_int, argv.as_ptr())
        })
    }
}

/// Run an entry call behind the single failure boundary the caller relies
/// on: a non-zero status or a panic escaping the call both come back as one
/// structured `TargetExecution` carrying the original cause.
pub fn guard_invoke(name: &str, call: impl FnOnce() -> c_int) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(0) => Ok(()),
        Ok(status) => Err(BootstrapError::TargetExecution {
            cause: format!("{name} exited with status {status}"),
            source: None,
        }),
        Err(payload) => Err(BootstrapError::TargetExecution {
            cause: format!("{name} panicked: {}", panic_message(&*payload)),
            source: None,
        }),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
