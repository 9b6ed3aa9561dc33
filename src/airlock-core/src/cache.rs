//! Version-locked library cache.
//!
//! Packaged launches extract the bundled support libraries into a flat
//! on-disk cache, gated by a single `versionlock` marker file. The cache is
//! trusted if and only if the lock contents equal the current build version
//! byte-for-byte; everything else (absence, truncation, another version)
//! marks it stale and forces a full re-extraction.
//!
//! The lock is written strictly LAST, after every library copy succeeded.
//! A crash mid-extraction therefore leaves the cache marked invalid and the
//! next launch retries cleanly. Individual library corruption under a
//! correct lock is deliberately not detected; cache correctness is an
//! all-or-nothing contract anchored on the version string alone.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::bundle::DistributionBundle;
use crate::error::{BootstrapError, Result};

/// Marker file holding the version string of the cached extraction.
pub const VERSION_LOCK_FILE: &str = "versionlock";

/// Whether the cache at `cache_dir` is valid for `version`.
///
/// True iff `cache_dir/versionlock` exists and its full contents equal
/// `version` exactly, with no trimming. No other filesystem content is
/// inspected.
pub fn is_cache_valid(cache_dir: &Path, version: &str) -> bool {
    match fs::read(cache_dir.join(VERSION_LOCK_FILE)) {
        Ok(contents) => contents == version.as_bytes(),
        Err(_) => false,
    }
}

/// Extract `libraries` from `bundle` into `cache_dir` and write the version
/// lock.
///
/// Creates the cache directory if absent and empties it first: every
/// non-directory entry directly inside is deleted. A directory entry found
/// here signals an unexpected layout; it is logged and skipped, never
/// removed.
///
/// # Errors
/// Any I/O failure aborts the refresh as `Io`. Partial extraction is
/// possible, but the lock is only written after every copy succeeded, so a
/// failed refresh always leaves the cache invalid.
pub fn refresh_cache(
    cache_dir: &Path,
    bundle: &DistributionBundle,
    libraries: &[String],
    version: &str,
) -> Result<()> {
    info!(
        "Unpacking support libraries for version {} into {}",
        version,
        cache_dir.display()
    );

    fs::create_dir_all(cache_dir).map_err(|e| {
        BootstrapError::io(
            format!("failed to create cache directory: {}", cache_dir.display()),
            e,
        )
    })?;

    // Empty a possibly stale cache before copying.
    let entries = fs::read_dir(cache_dir).map_err(|e| {
        BootstrapError::io(
            format!("failed to list cache directory: {}", cache_dir.display()),
            e,
        )
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            BootstrapError::io(
                format!("failed to list cache directory: {}", cache_dir.display()),
                e,
            )
        })?;
        let path = entry.path();

        if path.is_dir() {
            warn!(
                "found directory while cleaning cache, leaving it alone: {}",
                path.display()
            );
        } else {
            fs::remove_file(&path).map_err(|e| {
                BootstrapError::io(format!("failed to remove stale {}", path.display()), e)
            })?;
        }
    }

    for library in libraries {
        let dest = cache_dir.join(library);
        info!("Unpacking {} to {}", library, dest.display());
        bundle.copy_library(library, &dest)?;
    }

    // Lock last: only a fully extracted cache is ever marked valid.
    let lock = cache_dir.join(VERSION_LOCK_FILE);
    fs::write(&lock, version)
        .map_err(|e| BootstrapError::io(format!("failed to write {}", lock.display()), e))?;

    Ok(())
}

/// Validity gate plus refresh: make sure the cache matches `version`,
/// extracting only when stale, and return the cached library paths in
/// bundle order.
///
/// A valid cache performs zero file copies; repeated launches of the same
/// build are idempotent.
pub fn ensure_cache(
    cache_dir: &Path,
    bundle: &DistributionBundle,
    version: &str,
) -> Result<Vec<PathBuf>> {
    let libraries = bundle.list_bundled_libraries()?;

    if is_cache_valid(cache_dir, version) {
        info!(
            "Library cache {} already valid for version {}",
            cache_dir.display(),
            version
        );
    } else {
        refresh_cache(cache_dir, bundle, &libraries, version)?;
    }

    Ok(libraries.iter().map(|lib| cache_dir.join(lib)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_archive;
    use tempfile::TempDir;

    fn test_bundle(dir: &Path) -> DistributionBundle {
        let path = dir.join("bundle.tar.gz");
        build_archive(&path, &[("libs/a.lib", "alpha"), ("libs/b.lib", "beta")]);
        DistributionBundle::open(path).unwrap()
    }

    #[test]
    fn test_validity_is_exact_byte_equality() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        let lock = cache.join(VERSION_LOCK_FILE);

        assert!(!is_cache_valid(&cache, "2.3.0")); // absent

        fs::write(&lock, "2.3.0").unwrap();
        assert!(is_cache_valid(&cache, "2.3.0"));

        fs::write(&lock, "2.3.0\n").unwrap(); // trailing newline is a mismatch
        assert!(!is_cache_valid(&cache, "2.3.0"));

        fs::write(&lock, "2.3").unwrap(); // truncated
        assert!(!is_cache_valid(&cache, "2.3.0"));

        fs::write(&lock, "").unwrap(); // empty
        assert!(!is_cache_valid(&cache, "2.3.0"));

        fs::write(&lock, "2.4.0").unwrap(); // different valid-looking version
        assert!(!is_cache_valid(&cache, "2.3.0"));
    }

    #[test]
    fn test_refresh_then_valid() {
        let temp = TempDir::new().unwrap();
        let bundle = test_bundle(temp.path());
        let cache = temp.path().join("cache");

        let paths = ensure_cache(&cache, &bundle, "2.3.0").unwrap();
        assert_eq!(paths, [cache.join("a.lib"), cache.join("b.lib")]);
        assert_eq!(fs::read_to_string(cache.join("a.lib")).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(cache.join("b.lib")).unwrap(), "beta");
        assert!(is_cache_valid(&cache, "2.3.0"));
    }

    #[test]
    fn test_valid_cache_performs_no_copies() {
        let temp = TempDir::new().unwrap();
        let bundle = test_bundle(temp.path());
        let cache = temp.path().join("cache");

        ensure_cache(&cache, &bundle, "2.3.0").unwrap();

        // Scribble over a cached library; a second ensure with the same
        // version must not touch it.
        fs::write(cache.join("a.lib"), "sentinel").unwrap();
        ensure_cache(&cache, &bundle, "2.3.0").unwrap();
        assert_eq!(fs::read_to_string(cache.join("a.lib")).unwrap(), "sentinel");
    }

    #[test]
    fn test_version_bump_forces_reextraction() {
        let temp = TempDir::new().unwrap();
        let bundle = test_bundle(temp.path());
        let cache = temp.path().join("cache");

        ensure_cache(&cache, &bundle, "2.3.0").unwrap();
        fs::write(cache.join("a.lib"), "sentinel").unwrap();

        ensure_cache(&cache, &bundle, "2.4.0").unwrap();
        assert_eq!(fs::read_to_string(cache.join("a.lib")).unwrap(), "alpha");
        assert!(is_cache_valid(&cache, "2.4.0"));
        assert!(!is_cache_valid(&cache, "2.3.0"));
    }

    #[test]
    fn test_cleanup_skips_directories() {
        let temp = TempDir::new().unwrap();
        let bundle = test_bundle(temp.path());
        let cache = temp.path().join("cache");

        fs::create_dir_all(cache.join("unexpected-dir")).unwrap();
        fs::write(cache.join("leftover.lib"), "old").unwrap();

        let libs = bundle.list_bundled_libraries().unwrap();
        refresh_cache(&cache, &bundle, &libs, "2.3.0").unwrap();

        assert!(cache.join("unexpected-dir").is_dir());
        assert!(!cache.join("leftover.lib").exists());
        assert!(is_cache_valid(&cache, "2.3.0"));
    }

    #[test]
    fn test_failed_copy_leaves_cache_invalid() {
        let temp = TempDir::new().unwrap();
        let bundle = test_bundle(temp.path());
        let cache = temp.path().join("cache");

        // Ask for a library the bundle does not carry: the refresh aborts
        // before the lock is written.
        let libs = vec!["a.lib".to_string(), "ghost.lib".to_string()];
        assert!(refresh_cache(&cache, &bundle, &libs, "2.3.0").is_err());

        assert!(!cache.join(VERSION_LOCK_FILE).exists());
        assert!(!is_cache_valid(&cache, "2.3.0"));
    }
}
