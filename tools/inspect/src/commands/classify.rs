use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use airlock_core::{classify, Origin, Signature};

/// Classify origins exactly the way a hosted launch would.
pub fn run(paths: &[PathBuf]) -> Result<()> {
    let origins = paths
        .iter()
        .map(Origin::open)
        .collect::<airlock_core::Result<Vec<_>>>()
        .context("cannot open origins")?;

    let classification =
        classify(origins, Signature::all()).context("classification failed")?;

    println!("{}", "Matched signatures".bright_blue());
    for signature in Signature::all() {
        match classification.origin(signature.id) {
            Some(origin) => println!(
                "  {} {:?} -> {}",
                "✓".green(),
                signature.id,
                origin.path().display()
            ),
            None => println!("  {} {:?} -> (none)", "·".dimmed(), signature.id),
        }
    }

    println!();
    println!("{}", "System boundary".bright_blue());
    for origin in classification.system_origins() {
        println!("  {} {}", "→".dimmed(), origin.path().display());
    }

    println!();
    println!("{}", "Unmatched (candidate module archives)".bright_blue());
    for origin in classification.unmatched() {
        println!("  {} {}", "→".dimmed(), origin.path().display());
    }

    Ok(())
}
