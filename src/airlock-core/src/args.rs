//! Launch argument handling.
//!
//! The bootstrap forwards the raw process argument vector to the launched
//! module completely unmodified. On top of the raw vector it derives a
//! read-only `--key value` view, used for exactly one thing today: the
//! `--gameDir <path>` override of the launch directory used by the module
//! scan.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Key for the launch directory override.
pub const GAME_DIR_KEY: &str = "gameDir";

/// The process argument vector plus a derived key-value view.
///
/// Immutable once parsed. `raw()` returns exactly what was passed in,
/// including tokens that also appear in the keyed view.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    raw: Vec<String>,
    keyed: BTreeMap<String, String>,
}

impl Arguments {
    /// Parse an argument vector.
    ///
    /// A `--key` token immediately followed by a token that does not itself
    /// start with `--` forms a pair in the keyed view. Everything else is
    /// carried only in the raw vector. Parsing never fails: unrecognized
    /// shapes are simply not keyed.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut keyed = BTreeMap::new();

        let mut i = 0;
        while i < raw.len() {
            if let Some(key) = raw[i].strip_prefix("--") {
                if !key.is_empty() {
                    if let Some(value) = raw.get(i + 1) {
                        if !value.starts_with("--") {
                            keyed.insert(key.to_string(), value.clone());
                            i += 2;
                            continue;
                        }
                    }
                }
            }
            i += 1;
        }

        Self { raw, keyed }
    }

    /// The unmodified argument vector, as received.
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// Look up a `--key value` pair.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keyed.get(key).map(String::as_str)
    }

    /// The launch directory: the `--gameDir` override if present, otherwise
    /// the current directory.
    pub fn launch_directory(&self) -> PathBuf {
        self.get(GAME_DIR_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_vector_is_untouched() {
        let args = Arguments::parse(["--gameDir", "/srv/game", "positional", "--flag"]);
        assert_eq!(
            args.raw(),
            ["--gameDir", "/srv/game", "positional", "--flag"]
        );
    }

    #[test]
    fn test_keyed_pairs() {
        let args = Arguments::parse(["--gameDir", "/srv/game", "--user", "alice"]);
        assert_eq!(args.get("gameDir"), Some("/srv/game"));
        assert_eq!(args.get("user"), Some("alice"));
        assert_eq!(args.get("missing"), None);
    }

    #[test]
    fn test_flag_followed_by_flag_is_not_a_pair() {
        let args = Arguments::parse(["--verbose", "--gameDir", "/srv/game"]);
        assert_eq!(args.get("verbose"), None);
        assert_eq!(args.get("gameDir"), Some("/srv/game"));
    }

    #[test]
    fn test_launch_directory_default() {
        let args = Arguments::parse(Vec::<String>::new());
        assert_eq!(args.launch_directory(), PathBuf::from("."));
    }

    #[test]
    fn test_launch_directory_override() {
        let args = Arguments::parse(["--gameDir", "/opt/run"]);
        assert_eq!(args.launch_directory(), PathBuf::from("/opt/run"));
    }

    #[test]
    fn test_trailing_key_without_value() {
        let args = Arguments::parse(["--gameDir"]);
        assert_eq!(args.get("gameDir"), None);
        assert_eq!(args.raw(), ["--gameDir"]);
    }
}
