use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use airlock_core::{locate_module, BootstrapError};

/// Run the filename-convention scan and show what a launch would pick.
pub fn run(path: &Path, prefix: &str, extension: &str) -> Result<()> {
    println!(
        "{}",
        format!(
            "Scanning {} for {}*{}",
            path.display(),
            prefix,
            extension
        )
        .bright_blue()
    );

    match locate_module(None, path, prefix, extension) {
        Ok(found) => {
            println!("  {} {}", "✓".green(), found.display());
            Ok(())
        }
        Err(BootstrapError::AmbiguousModule { candidates }) => {
            println!("  {} multiple candidates:", "✗".red());
            for candidate in candidates {
                println!("    {} {}", "→".dimmed(), candidate.display());
            }
            anyhow::bail!("ambiguous module");
        }
        Err(err) => {
            println!("  {} {}", "✗".red(), err);
            Err(err.into())
        }
    }
}
