//! Distribution bundle handling.
//!
//! A packaged airlock release ships as a launcher executable next to a
//! tar.gz bundle whose `libs/` directory carries the framework's support
//! libraries. The bundle is read-only: the bootstrap extracts libraries out
//! of it into the cache directory, never the other way around.

use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::debug;
use tar::Archive;

use crate::config::Config;
use crate::error::{BootstrapError, Result};

/// Well-known directory inside the bundle holding the support libraries.
pub const BUNDLE_LIBS_DIR: &str = "libs";

/// Default bundle filename, looked up next to the running executable.
pub const BUNDLE_FILE_NAME: &str = "bundle.tar.gz";

/// A located distribution bundle.
#[derive(Debug, Clone)]
pub struct DistributionBundle {
    path: PathBuf,
}

impl DistributionBundle {
    /// Open the bundle at `path`.
    ///
    /// # Errors
    /// Fails with `Packaging` if the path is missing or is a directory;
    /// there is nothing to enumerate outside a packaged run.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Err(BootstrapError::Packaging(format!(
                "bundle not found: {}",
                path.display()
            )));
        }
        if path.is_dir() {
            return Err(BootstrapError::Packaging(format!(
                "bundle is a directory, expected an archive: {}",
                path.display()
            )));
        }

        Ok(Self { path })
    }

    /// Detect packaged mode: the configured bundle path if set, otherwise a
    /// `bundle.tar.gz` sibling of the running executable.
    ///
    /// Returns `Ok(None)` when neither exists; the launcher then takes the
    /// hosted path. A configured path that does not open is an error, since
    /// the operator explicitly asked for it.
    pub fn locate(config: &Config) -> Result<Option<Self>> {
        if let Some(path) = &config.bundle.path {
            return Self::open(path).map(Some);
        }

        let exe = match env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                debug!("cannot determine executable path: {}", e);
                return Ok(None);
            }
        };

        let sibling = exe
            .parent()
            .map(|dir| dir.join(BUNDLE_FILE_NAME))
            .filter(|p| p.exists());

        match sibling {
            Some(path) => Self::open(path).map(Some),
            None => Ok(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the support libraries bundled under `libs/`, in archive
    /// order.
    ///
    /// # Errors
    /// Fails with `Packaging` if the bundle has no `libs/` entries, and
    /// with `Io` if the archive cannot be read.
    pub fn list_bundled_libraries(&self) -> Result<Vec<String>> {
        let mut archive = self.reader()?;
        let entries = archive
            .entries()
            .map_err(|e| self.read_error(e))?;

        let mut libraries = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.read_error(e))?;
            if entry.header().entry_type().is_dir() {
                continue;
            }

            let path = entry.path().map_err(|e| self.read_error(e))?;
            if let Some(name) = library_name(&path) {
                libraries.push(name);
            }
        }

        if libraries.is_empty() {
            return Err(BootstrapError::Packaging(format!(
                "bundle {} has no {}/ entries",
                self.path.display(),
                BUNDLE_LIBS_DIR
            )));
        }

        Ok(libraries)
    }

    /// Copy the bundled library `name` to `dest` by exact name.
    ///
    /// # Errors
    /// Fails with `Packaging` if the bundle has no such library, and with
    /// `Io` on any filesystem failure.
    pub fn copy_library(&self, name: &str, dest: &Path) -> Result<()> {
        let mut archive = self.reader()?;
        let entries = archive
            .entries()
            .map_err(|e| self.read_error(e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| self.read_error(e))?;
            let path = entry.path().map_err(|e| self.read_error(e))?;

            if library_name(&path).as_deref() == Some(name) {
                let mut out = File::create(dest).map_err(|e| {
                    BootstrapError::io(format!("failed to create {}", dest.display()), e)
                })?;
                io::copy(&mut entry, &mut out).map_err(|e| {
                    BootstrapError::io(
                        format!("failed to extract {} to {}", name, dest.display()),
                        e,
                    )
                })?;
                return Ok(());
            }
        }

        Err(BootstrapError::Packaging(format!(
            "library {} not present in bundle {}",
            name,
            self.path.display()
        )))
    }

    fn reader(&self) -> Result<Archive<GzDecoder<File>>> {
        let file = File::open(&self.path).map_err(|e| {
            BootstrapError::io(format!("failed to open bundle: {}", self.path.display()), e)
        })?;
        Ok(Archive::new(GzDecoder::new(file)))
    }

    fn read_error(&self, e: io::Error) -> BootstrapError {
        BootstrapError::io(format!("failed to read bundle: {}", self.path.display()), e)
    }
}

/// If `path` is directly inside the bundle's `libs/` directory, return the
/// bare library filename.
fn library_name(path: &Path) -> Option<String> {
    let mut components = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .skip_while(|c| c.as_ref() == ".");

    match (components.next(), components.next(), components.next()) {
        (Some(dir), Some(name), None) if dir == BUNDLE_LIBS_DIR => Some(name.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_archive;
    use tempfile::TempDir;

    #[test]
    fn test_list_bundled_libraries_in_order() {
        let temp = TempDir::new().unwrap();
        let bundle_path = temp.path().join(BUNDLE_FILE_NAME);
        build_archive(
            &bundle_path,
            &[
                ("libs/a.lib", "aaa"),
                ("libs/b.lib", "bbb"),
                ("manifest.txt", "not a lib"),
                ("libs/nested/deep.lib", "skipped, not directly under libs/"),
            ],
        );

        let bundle = DistributionBundle::open(&bundle_path).unwrap();
        assert_eq!(bundle.list_bundled_libraries().unwrap(), ["a.lib", "b.lib"]);
    }

    #[test]
    fn test_no_libs_dir_is_packaging_error() {
        let temp = TempDir::new().unwrap();
        let bundle_path = temp.path().join(BUNDLE_FILE_NAME);
        build_archive(&bundle_path, &[("manifest.txt", "x")]);

        let bundle = DistributionBundle::open(&bundle_path).unwrap();
        let err = bundle.list_bundled_libraries().unwrap_err();
        assert!(matches!(err, BootstrapError::Packaging(_)));
    }

    #[test]
    fn test_open_rejects_missing_and_directory() {
        let temp = TempDir::new().unwrap();

        let missing = DistributionBundle::open(temp.path().join("absent.tar.gz"));
        assert!(matches!(missing, Err(BootstrapError::Packaging(_))));

        let dir = DistributionBundle::open(temp.path());
        assert!(matches!(dir, Err(BootstrapError::Packaging(_))));
    }

    #[test]
    fn test_copy_library() {
        let temp = TempDir::new().unwrap();
        let bundle_path = temp.path().join(BUNDLE_FILE_NAME);
        build_archive(&bundle_path, &[("libs/a.lib", "payload")]);

        let bundle = DistributionBundle::open(&bundle_path).unwrap();
        let dest = temp.path().join("a.lib");
        bundle.copy_library("a.lib", &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "payload");

        let err = bundle.copy_library("missing.lib", &dest).unwrap_err();
        assert!(matches!(err, BootstrapError::Packaging(_)));
    }
}
