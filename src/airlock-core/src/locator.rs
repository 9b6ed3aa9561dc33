//! Target module location.
//!
//! Runs only when classification did not find the target-module signature
//! among the supplied origins, i.e. outside a dev-style multi-origin
//! environment. Two layered fallbacks of increasing cost:
//!
//! 1. An explicit override path from configuration. It must exist and must
//!    not be a directory; no further search happens once it is set.
//! 2. A non-recursive scan of the launch directory for filenames with the
//!    required prefix and extension (case-sensitive). Exactly one match is
//!    accepted.
//!
//! Identification here is purely filename-convention based; the locator
//! never inspects file contents. Content signatures are the classifier's
//! job.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{BootstrapError, Result};

/// Resolve the single target module file.
///
/// # Arguments
/// * `override_path` - explicit module path from configuration, if any
/// * `search_dir` - launch directory for the scan fallback
/// * `prefix` - required filename prefix (case-sensitive)
/// * `extension` - required filename suffix, including the dot
///
/// # Errors
/// `ModuleNotFound` for a bad override, an empty scan, or a scan that could
/// not list the directory; `AmbiguousModule` when the scan finds more than
/// one candidate.
pub fn locate_module(
    override_path: Option<&Path>,
    search_dir: &Path,
    prefix: &str,
    extension: &str,
) -> Result<PathBuf> {
    if let Some(path) = override_path {
        // The override short-circuits the scan entirely, even when it is
        // wrong and a scan would have succeeded.
        if !path.exists() || path.is_dir() {
            return Err(BootstrapError::ModuleNotFound {
                reason: format!(
                    "configured module path is not a usable file: {}",
                    path.display()
                ),
            });
        }
        info!("using configured module path: {}", path.display());
        return Ok(path.to_path_buf());
    }

    let mut candidates = scan_directory(search_dir, prefix, extension)?;

    match candidates.len() {
        0 => Err(BootstrapError::ModuleNotFound {
            reason: format!(
                "no {}*{} file in {} (put the module next to the launcher, or set the module path)",
                prefix,
                extension,
                search_dir.display()
            ),
        }),
        1 => {
            let found = candidates.remove(0);
            info!("located module by scan: {}", found.display());
            Ok(found)
        }
        _ => {
            candidates.sort();
            Err(BootstrapError::AmbiguousModule { candidates })
        }
    }
}

fn scan_directory(search_dir: &Path, prefix: &str, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(search_dir).map_err(|e| BootstrapError::ModuleNotFound {
        reason: format!("cannot list {}: {}", search_dir.display(), e),
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BootstrapError::ModuleNotFound {
            reason: format!("cannot list {}: {}", search_dir.display(), e),
        })?;

        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if name.starts_with(prefix) && name.ends_with(extension) {
            candidates.push(entry.path());
        }
    }

    Ok(candidates)
}
