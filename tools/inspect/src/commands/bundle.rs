use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use airlock_core::DistributionBundle;

/// List the support libraries a bundle would extract, in order.
pub fn run(path: &Path) -> Result<()> {
    let bundle = DistributionBundle::open(path)
        .context(format!("cannot open bundle: {}", path.display()))?;
    let libraries = bundle
        .list_bundled_libraries()
        .context("cannot enumerate bundled libraries")?;

    println!("{}", format!("Bundle: {}", path.display()).bright_blue());
    println!();
    for library in &libraries {
        println!("  {} {}", "→".dimmed(), library);
    }
    println!();
    println!("{} libraries", libraries.len());

    Ok(())
}
