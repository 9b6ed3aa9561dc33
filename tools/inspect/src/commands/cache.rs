use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use airlock_core::cache::{is_cache_valid, VERSION_LOCK_FILE};

/// Report whether a cache directory would be trusted for `version`.
pub fn run(path: &Path, version: &str) -> Result<()> {
    println!("{}", format!("Cache: {}", path.display()).bright_blue());

    let lock = path.join(VERSION_LOCK_FILE);
    match std::fs::read_to_string(&lock) {
        Ok(contents) => println!("  {} lock contents: {:?}", "→".dimmed(), contents),
        Err(_) => println!("  {} no {} file", "→".dimmed(), VERSION_LOCK_FILE),
    }

    if is_cache_valid(path, version) {
        println!("  {} valid for version {}", "✓".green(), version);
    } else {
        println!(
            "  {} stale for version {} (a launch would re-extract)",
            "✗".red(),
            version
        );
    }

    Ok(())
}
