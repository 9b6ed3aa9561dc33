use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Airlock bundle and classification inspection tool
#[derive(Parser)]
#[command(name = "airlock-inspect")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the support libraries bundled in a distribution archive
    Bundle {
        /// Path to the bundle (tar.gz)
        path: PathBuf,
    },

    /// Check a library cache against a version string
    Cache {
        /// Cache directory
        path: PathBuf,

        /// Version to validate against
        #[arg(long)]
        version: String,
    },

    /// Classify a list of origins the way a launch would
    Classify {
        /// Origin paths (directories, module archives, libraries)
        paths: Vec<PathBuf>,
    },

    /// Run the module scan fallback over a directory
    Locate {
        /// Directory to scan
        path: PathBuf,

        /// Required filename prefix
        #[arg(long, default_value = "orbit")]
        prefix: String,

        /// Required filename extension
        #[arg(long, default_value = ".mod")]
        extension: String,
    },

    /// Print the JSON launch plan a packaged run would use
    Report {
        /// Path to the bundle (tar.gz)
        bundle: PathBuf,

        /// Version the cache would be locked to
        #[arg(long)]
        version: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bundle { path } => commands::bundle::run(&path),
        Commands::Cache { path, version } => commands::cache::run(&path, &version),
        Commands::Classify { paths } => commands::classify::run(&paths),
        Commands::Locate {
            path,
            prefix,
            extension,
        } => commands::locate::run(&path, &prefix, &extension),
        Commands::Report { bundle, version } => commands::report::run(&bundle, &version),
    }
}
