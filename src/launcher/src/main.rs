// ============================================================================
// Airlock launcher - one-shot bootstrap for the hull framework
//
// Packaged installs ship this binary next to a bundle.tar.gz; the launcher
// unpacks the bundled support libraries into the version-locked cache and
// hands the process over to the framework entry. Dev environments skip the
// bundle and classify the configured origin list instead.
//
// The final invoke blocks for the lifetime of the framework or module; this
// process has no job left once the handoff happened.
// ============================================================================

use std::env;
use std::process::ExitCode;

use log::{error, info};

use airlock_core::{Arguments, BootstrapError, BootstrapSession, Config, DistributionBundle};

/// Build version used as the cache lock value.
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_fatal(&err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), BootstrapError> {
    let config = Config::load()?;
    let arguments = Arguments::parse(env::args().skip(1));

    if !config.provider.enabled {
        // The skip toggle exists so another provider can take over the
        // launch; nothing for us to do.
        info!("airlock provider disabled by configuration, not launching");
        return Ok(());
    }

    let bundle = if config.provider.dev_mode {
        None
    } else {
        DistributionBundle::locate(&config)?
    };

    let mut session = BootstrapSession::new(config, arguments);

    match bundle {
        Some(bundle) => {
            session.run_packaged(&bundle, VERSION)?;
        }
        None => {
            session.run_hosted()?;
        }
    }

    Ok(())
}

/// Print the structured fatal report. Every setup failure ends here with
/// enough context (paths, names, cause chain) to diagnose without a
/// debugger.
fn report_fatal(err: &BootstrapError) {
    error!("bootstrap failed: {err}");

    eprintln!("-- airlock bootstrap failed --");
    eprintln!("{err}");

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }

    match err {
        BootstrapError::ModuleNotFound { .. } | BootstrapError::AmbiguousModule { .. } => {
            eprintln!();
            eprintln!("Make sure exactly one game module sits next to the launcher,");
            eprintln!("or point AIRLOCK_MODULE_PATH at it directly.");
        }
        BootstrapError::TargetExecution { .. } => {
            eprintln!();
            eprintln!("The game module itself crashed; the cause above comes from the module.");
        }
        _ => {}
    }
}
