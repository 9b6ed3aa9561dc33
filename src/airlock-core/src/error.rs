//! Error taxonomy for the bootstrap pipeline.
//!
//! Every failure the bootstrap can produce falls into one of these
//! categories. None of them is retried within a launch; the only implicit
//! retry is cache re-extraction on the next run, which the lock-last
//! invariant in `cache` guarantees.

use std::io;
use std::path::PathBuf;

use crate::classifier::SignatureId;

/// A boxed error cause carried across the invocation boundary.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All failure modes of the bootstrap pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The distribution bundle has the wrong shape (missing, not a regular
    /// file, or no `libs/` directory inside). Not retryable.
    #[error("distribution bundle unusable: {0}")]
    Packaging(String),

    /// A filesystem operation failed during cache refresh, origin listing,
    /// or library extraction. Fatal for this launch, but self-healing: the
    /// version lock is only written after a complete refresh.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The target module could not be located, either through the explicit
    /// override or the directory scan.
    #[error("module not found: {reason}")]
    ModuleNotFound { reason: String },

    /// The directory scan found more than one candidate module.
    #[error("multiple candidate modules found: {}", format_candidates(.candidates))]
    AmbiguousModule { candidates: Vec<PathBuf> },

    /// One origin satisfied more than one signature. This is a packaging
    /// configuration error and is reported rather than resolved by
    /// enumeration order.
    #[error("origin {origin} matches multiple signatures: {signatures:?}")]
    SignatureConflict {
        origin: PathBuf,
        signatures: Vec<SignatureId>,
    },

    /// Two origins satisfied the same signature.
    #[error("signature {signature:?} matched by both {} and {}", .first.display(), .second.display())]
    DuplicateSignature {
        signature: SignatureId,
        first: PathBuf,
        second: PathBuf,
    },

    /// The entry symbol could not be resolved within the loading context:
    /// the module's library is absent, the symbol is missing, or the
    /// loader rejected it. Indicates a packaging or version mismatch.
    #[error("cannot resolve entry `{symbol}` in module `{module}`: {detail}")]
    SymbolResolution {
        module: String,
        symbol: String,
        detail: String,
        #[source]
        source: Option<Cause>,
    },

    /// The launched module itself failed. The original cause is preserved
    /// verbatim so downstream diagnostics are not lost.
    #[error("target module execution failed: {cause}")]
    TargetExecution {
        cause: String,
        #[source]
        source: Option<Cause>,
    },

    /// A diagnostic helper was called on a session that never took the
    /// packaged bootstrap path.
    #[error("packaged-path diagnostics requested, but this session was not launched from a bundle")]
    NotPackaged,
}

impl BootstrapError {
    /// Wrap an I/O error with a human-readable context line.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_module_lists_all_candidates() {
        let err = BootstrapError::AmbiguousModule {
            candidates: vec![PathBuf::from("orbit-1.mod"), PathBuf::from("orbit-2.mod")],
        };
        let msg = err.to_string();
        assert!(msg.contains("orbit-1.mod"));
        assert!(msg.contains("orbit-2.mod"));
    }

    #[test]
    fn test_symbol_resolution_names_module_and_symbol() {
        let err = BootstrapError::SymbolResolution {
            module: "orbit".to_string(),
            symbol: "orbit_main".to_string(),
            detail: "no loadable library".to_string(),
            source: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("orbit"));
        assert!(msg.contains("orbit_main"));
    }

    #[test]
    fn test_io_preserves_source() {
        use std::error::Error;
        let err = BootstrapError::io(
            "failed to list cache directory",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "failed to list cache directory");
    }
}
