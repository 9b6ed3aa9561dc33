use anyhow::{Context, Result};
use std::path::Path;

use airlock_core::{Arguments, BootstrapSession, Config, DistributionBundle};

/// Print the JSON launch plan for a packaged run: which libraries the cache
/// would hold and in what order, without invoking anything.
pub fn run(bundle_path: &Path, version: &str) -> Result<()> {
    let bundle = DistributionBundle::open(bundle_path)
        .context(format!("cannot open bundle: {}", bundle_path.display()))?;

    let mut config = Config::load()?;
    config.bundle.path = Some(bundle_path.to_path_buf());

    let mut session = BootstrapSession::new(config, Arguments::default());

    // Resolution may fail (no framework library on this machine); the cache
    // work and the report still happen.
    let resolution = session.prepare_packaged(&bundle, version);
    let report = session
        .launch_report()
        .context("no launch report for this session")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Err(err) = resolution {
        anyhow::bail!("launch plan written, but the entry would not resolve: {err}");
    }
    Ok(())
}
