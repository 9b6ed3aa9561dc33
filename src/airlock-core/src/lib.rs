//! Airlock core library
//!
//! Shared bootstrap code for the airlock launcher and the inspect tool.
//!
//! This crate provides:
//! - **args**: launch argument vector plus the derived `--key value` view
//! - **config**: `.airlock.yaml` parsing and environment overrides
//! - **origin**: loadable units (directories, archives, bare libraries)
//! - **bundle**: the distribution bundle shipped next to the launcher
//! - **cache**: the version-locked support-library cache
//! - **classifier**: signature-based origin classification
//! - **locator**: filename-convention fallback search for the game module
//! - **context**: loading contexts and entry-symbol invocation
//! - **session**: one launch, start to finish
//!
//! # Design principle
//!
//! Everything here is a thin, sequential bootstrap: no threads, no retries,
//! no background state. The launched module inherits the process; once the
//! entry symbol is invoked the bootstrap's job is over.

pub mod args;
pub mod bundle;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod locator;
pub mod origin;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types at crate root
pub use args::Arguments;
pub use bundle::DistributionBundle;
pub use cache::{ensure_cache, is_cache_valid, refresh_cache};
pub use classifier::{classify, Classification, Signature, SignatureId, SignatureRole};
pub use config::Config;
pub use context::{EntryPoint, EntrySpec, LoadingContext, NativeContext};
pub use error::{BootstrapError, Result};
pub use locator::locate_module;
pub use origin::{Origin, OriginKind};
pub use session::BootstrapSession;
