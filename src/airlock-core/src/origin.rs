//! Origins: the units of loadable code the bootstrap reasons about.
//!
//! An origin is either a directory tree (dev environments), a tar.gz module
//! archive, or a plain dynamic library file. Origins are discovered once per
//! launch and never mutated; their entry listing is read lazily and cached
//! for the lifetime of the value.

use std::cell::OnceCell;
use std::env::consts::DLL_EXTENSION;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::{BootstrapError, Result};

/// What kind of on-disk artifact an origin is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    /// A directory tree; entries are the relative paths of contained files.
    Directory,
    /// A tar.gz archive; entries are the relative paths of archived files.
    Archive,
    /// A bare dynamic library; it has no inner entries to classify, but is
    /// directly loadable by a context.
    Library,
}

/// An opaque handle to a unit of loadable code.
#[derive(Debug, Clone)]
pub struct Origin {
    path: PathBuf,
    kind: OriginKind,
    entries: OnceCell<Vec<String>>,
}

impl Origin {
    /// Open an origin at `path`, classifying it by shape.
    ///
    /// Directories become `Directory` origins, files with the platform's
    /// dynamic-library extension become `Library` origins, and every other
    /// regular file is treated as a tar.gz `Archive`.
    ///
    /// # Errors
    /// Fails with `Io` if the path does not exist or cannot be inspected.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = fs::metadata(&path)
            .map_err(|e| BootstrapError::io(format!("cannot open origin: {}", path.display()), e))?;

        let kind = if metadata.is_dir() {
            OriginKind::Directory
        } else if path.extension().and_then(|ext| ext.to_str()) == Some(DLL_EXTENSION) {
            OriginKind::Library
        } else {
            OriginKind::Archive
        };

        Ok(Self {
            path,
            kind,
            entries: OnceCell::new(),
        })
    }

    /// Stable identifier of this origin.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> OriginKind {
        self.kind
    }

    /// Relative paths of the files this origin contains, `/`-separated.
    ///
    /// Listed on first call and cached. Directory listings are sorted so the
    /// result does not depend on filesystem iteration order; archive
    /// listings keep archive order.
    pub fn entries(&self) -> Result<&[String]> {
        if let Some(entries) = self.entries.get() {
            return Ok(entries);
        }

        let listed = match self.kind {
            OriginKind::Directory => list_directory(&self.path)?,
            OriginKind::Archive => list_archive(&self.path)?,
            OriginKind::Library => Vec::new(),
        };

        Ok(self.entries.get_or_init(|| listed))
    }

    /// Whether this origin contains the given relative path.
    pub fn contains(&self, relative: &str) -> Result<bool> {
        Ok(self.entries()?.iter().any(|e| e == relative))
    }

    /// Whether this origin contains every one of the given relative paths.
    pub fn contains_all(&self, relative: &[&str]) -> Result<bool> {
        for path in relative {
            if !self.contains(path)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn list_directory(root: &Path) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    walk(root, root, &mut entries)?;
    entries.sort();
    Ok(entries)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    let reader = fs::read_dir(dir)
        .map_err(|e| BootstrapError::io(format!("failed to list origin directory: {}", dir.display()), e))?;

    for entry in reader {
        let entry = entry
            .map_err(|e| BootstrapError::io(format!("failed to list origin directory: {}", dir.display()), e))?;
        let path = entry.path();

        if path.is_dir() {
            walk(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(to_slash_path(relative));
        }
    }

    Ok(())
}

fn list_archive(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .map_err(|e| BootstrapError::io(format!("failed to open origin archive: {}", path.display()), e))?;
    let tar = GzDecoder::new(file);
    let mut archive = Archive::new(tar);

    let mut entries = Vec::new();
    let iter = archive
        .entries()
        .map_err(|e| BootstrapError::io(format!("failed to read origin archive: {}", path.display()), e))?;

    for entry in iter {
        let entry = entry
            .map_err(|e| BootstrapError::io(format!("failed to read origin archive: {}", path.display()), e))?;

        if entry.header().entry_type().is_dir() {
            continue;
        }

        let entry_path = entry
            .path()
            .map_err(|e| BootstrapError::io(format!("bad entry path in archive: {}", path.display()), e))?;

        let name = to_slash_path(&entry_path);
        let name = name.strip_prefix("./").unwrap_or(name.as_str()).to_string();
        if !name.is_empty() {
            entries.push(name);
        }
    }

    Ok(entries)
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_archive;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_directory_origin_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("hull")).unwrap();
        fs::write(temp.path().join("hull/framework.manifest"), "hull").unwrap();
        fs::write(temp.path().join("readme.txt"), "docs").unwrap();

        let origin = Origin::open(temp.path()).unwrap();
        assert_eq!(origin.kind(), OriginKind::Directory);
        assert_eq!(origin.entries().unwrap(), ["hull/framework.manifest", "readme.txt"]);
        assert!(origin.contains("hull/framework.manifest").unwrap());
        assert!(!origin.contains("missing").unwrap());
    }

    #[test]
    fn test_archive_origin_entries() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("orbit-1.0.mod");
        build_archive(
            &archive,
            &[("orbit/module.manifest", "orbit"), ("orbit/data.bin", "x")],
        );

        let origin = Origin::open(&archive).unwrap();
        assert_eq!(origin.kind(), OriginKind::Archive);
        assert!(origin
            .contains_all(&["orbit/module.manifest", "orbit/data.bin"])
            .unwrap());
        assert!(!origin.contains_all(&["orbit/module.manifest", "absent"]).unwrap());
    }

    #[test]
    fn test_library_origin_has_no_entries() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join(format!("orbit.{}", DLL_EXTENSION));
        let mut f = File::create(&lib).unwrap();
        f.write_all(b"\x7fELF").unwrap();

        let origin = Origin::open(&lib).unwrap();
        assert_eq!(origin.kind(), OriginKind::Library);
        assert!(origin.entries().unwrap().is_empty());
    }

    #[test]
    fn test_missing_origin_is_io_error() {
        let err = Origin::open("/nonexistent/origin").unwrap_err();
        assert!(matches!(err, BootstrapError::Io { .. }));
    }
}
