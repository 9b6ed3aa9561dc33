//! Signature-based origin classification.
//!
//! A signature is a named, declarative rule: a set of relative paths that
//! must ALL be present inside an origin for it to carry that role. The
//! signature set is a closed, compile-time enumeration; new roles are added
//! by declaring a signature in the table, not by editing the matching logic.
//!
//! Classification partitions the supplied origins into three buckets:
//! matched infrastructure (the protective parent boundary), the target
//! module, and everything else (candidate module archives that join the
//! runtime loading set without a recognized role).
//!
//! Determinism: origins are tested in input order and signatures in
//! enumeration order, so identical input always produces byte-identical
//! groupings. Ambiguity is never resolved silently: an origin matching more
//! than one signature, or two origins matching the same signature, is a
//! reported configuration error.

use std::collections::BTreeMap;

use log::debug;

use crate::error::{BootstrapError, Result};
use crate::origin::Origin;

/// The closed set of recognized origin roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignatureId {
    /// The hull framework itself.
    Framework,
    /// This bootstrap's own provider, visible when running hosted.
    Provider,
    /// The game module the bootstrap exists to launch.
    TargetModule,
}

/// Whether a matched origin belongs to the protective parent boundary or is
/// the launch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRole {
    Infrastructure,
    TargetModule,
}

/// A declarative matching rule for one origin role.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub id: SignatureId,
    pub role: SignatureRole,
    /// Relative paths that must all be present inside a matching origin.
    pub required_paths: &'static [&'static str],
}

impl Signature {
    /// The full signature set, in enumeration order.
    pub fn all() -> &'static [Signature] {
        &[
            Signature {
                id: SignatureId::Framework,
                role: SignatureRole::Infrastructure,
                required_paths: &["hull/framework.manifest"],
            },
            Signature {
                id: SignatureId::Provider,
                role: SignatureRole::Infrastructure,
                required_paths: &["airlock/provider.manifest"],
            },
            Signature {
                id: SignatureId::TargetModule,
                role: SignatureRole::TargetModule,
                required_paths: &["orbit/module.manifest"],
            },
        ]
    }
}

/// Result of classifying a launch's origins.
#[derive(Debug, Default)]
pub struct Classification {
    matched: BTreeMap<SignatureId, Origin>,
    unmatched: Vec<Origin>,
}

impl Classification {
    /// The origin matched by `id`, if any.
    pub fn origin(&self, id: SignatureId) -> Option<&Origin> {
        self.matched.get(&id)
    }

    pub fn has(&self, id: SignatureId) -> bool {
        self.matched.contains_key(&id)
    }

    /// Origins that matched no signature, in input order. These carry no
    /// recognized role but still join the runtime loading set.
    pub fn unmatched(&self) -> &[Origin] {
        &self.unmatched
    }

    /// Matched origins whose signature marks them as infrastructure, in
    /// signature enumeration order. These seed the protective parent
    /// loading boundary so framework code loads once and is never shadowed
    /// by module code.
    pub fn system_origins(&self) -> Vec<&Origin> {
        Signature::all()
            .iter()
            .filter(|sig| sig.role == SignatureRole::Infrastructure)
            .filter_map(|sig| self.matched.get(&sig.id))
            .collect()
    }

    /// The target module origin, if classification found one.
    pub fn target(&self) -> Option<&Origin> {
        self.matched.get(&SignatureId::TargetModule)
    }
}

/// Classify `origins` against `signatures`.
///
/// # Errors
/// - `SignatureConflict` if one origin satisfies more than one signature
/// - `DuplicateSignature` if two origins satisfy the same signature
/// - `Io` if an origin's entry listing fails
pub fn classify(origins: Vec<Origin>, signatures: &[Signature]) -> Result<Classification> {
    let mut result = Classification::default();

    for origin in origins {
        let mut matches = Vec::new();
        for signature in signatures {
            if origin.contains_all(signature.required_paths)? {
                matches.push(signature.id);
            }
        }

        match matches.as_slice() {
            [] => {
                debug!("unmatched origin: {}", origin.path().display());
                result.unmatched.push(origin);
            }
            [id] => {
                if let Some(first) = result.matched.get(id) {
                    return Err(BootstrapError::DuplicateSignature {
                        signature: *id,
                        first: first.path().to_path_buf(),
                        second: origin.path().to_path_buf(),
                    });
                }
                debug!("origin {} matched {:?}", origin.path().display(), id);
                result.matched.insert(*id, origin);
            }
            _ => {
                return Err(BootstrapError::SignatureConflict {
                    origin: origin.path().to_path_buf(),
                    signatures: matches,
                });
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const INFRA: Signature = Signature {
        id: SignatureId::Framework,
        role: SignatureRole::Infrastructure,
        required_paths: &["infra/marker.x"],
    };
    const MODULE: Signature = Signature {
        id: SignatureId::TargetModule,
        role: SignatureRole::TargetModule,
        required_paths: &["module/marker.y"],
    };

    fn dir_origin(base: &Path, name: &str, files: &[&str]) -> Origin {
        let root = base.join(name);
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, name).unwrap();
        }
        fs::create_dir_all(&root).unwrap();
        Origin::open(root).unwrap()
    }

    #[test]
    fn test_three_origin_partition() {
        let temp = TempDir::new().unwrap();
        let infra = dir_origin(temp.path(), "one", &["infra/marker.x"]);
        let module = dir_origin(temp.path(), "two", &["module/marker.y"]);
        let other = dir_origin(temp.path(), "three", &["misc/data.txt"]);

        let result = classify(vec![infra, module, other], &[INFRA, MODULE]).unwrap();

        assert_eq!(
            result.origin(SignatureId::Framework).unwrap().path(),
            temp.path().join("one")
        );
        assert_eq!(result.target().unwrap().path(), temp.path().join("two"));
        assert_eq!(result.unmatched().len(), 1);
        assert_eq!(result.unmatched()[0].path(), temp.path().join("three"));
    }

    #[test]
    fn test_all_paths_must_be_present() {
        let temp = TempDir::new().unwrap();
        let both = Signature {
            id: SignatureId::Provider,
            role: SignatureRole::Infrastructure,
            required_paths: &["a/one", "b/two"],
        };
        let partial = dir_origin(temp.path(), "partial", &["a/one"]);
        let complete = dir_origin(temp.path(), "complete", &["a/one", "b/two"]);

        let result = classify(vec![partial, complete], &[both]).unwrap();
        assert_eq!(
            result.origin(SignatureId::Provider).unwrap().path(),
            temp.path().join("complete")
        );
        assert_eq!(result.unmatched().len(), 1);
    }

    #[test]
    fn test_duplicate_signature_is_fatal() {
        let temp = TempDir::new().unwrap();
        let first = dir_origin(temp.path(), "first", &["module/marker.y"]);
        let second = dir_origin(temp.path(), "second", &["module/marker.y"]);

        let err = classify(vec![first, second], &[MODULE]).unwrap_err();
        match err {
            BootstrapError::DuplicateSignature { signature, first, second } => {
                assert_eq!(signature, SignatureId::TargetModule);
                assert!(first.ends_with("first"));
                assert!(second.ends_with("second"));
            }
            other => panic!("expected DuplicateSignature, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_signature_match_is_reported() {
        let temp = TempDir::new().unwrap();
        let chimera = dir_origin(
            temp.path(),
            "chimera",
            &["infra/marker.x", "module/marker.y"],
        );

        let err = classify(vec![chimera], &[INFRA, MODULE]).unwrap_err();
        match err {
            BootstrapError::SignatureConflict { signatures, .. } => {
                assert_eq!(
                    signatures,
                    vec![SignatureId::Framework, SignatureId::TargetModule]
                );
            }
            other => panic!("expected SignatureConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_system_origins_excludes_target() {
        let temp = TempDir::new().unwrap();
        let infra = dir_origin(temp.path(), "one", &["infra/marker.x"]);
        let module = dir_origin(temp.path(), "two", &["module/marker.y"]);

        let result = classify(vec![infra, module], &[INFRA, MODULE]).unwrap();
        let system = result.system_origins();
        assert_eq!(system.len(), 1);
        assert_eq!(system[0].path(), temp.path().join("one"));
    }

    #[test]
    fn test_deterministic_groupings() {
        let temp = TempDir::new().unwrap();
        let make = || {
            vec![
                dir_origin(temp.path(), "one", &["infra/marker.x"]),
                dir_origin(temp.path(), "extra1", &["data/a"]),
                dir_origin(temp.path(), "extra2", &["data/b"]),
            ]
        };

        let a = classify(make(), &[INFRA, MODULE]).unwrap();
        let b = classify(make(), &[INFRA, MODULE]).unwrap();

        let order = |c: &Classification| {
            c.unmatched()
                .iter()
                .map(|o| o.path().to_path_buf())
                .collect::<Vec<_>>()
        };
        assert_eq!(order(&a), order(&b));
    }
}
