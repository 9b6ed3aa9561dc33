//! Configuration for the airlock bootstrap.
//!
//! Loads configuration from:
//! 1. `.airlock.yaml` in the current directory, then the home directory
//! 2. Environment variables (override file config)
//!
//! Configuration structure:
//! ```yaml
//! cache:
//!   path: .bootstraplibs
//!
//! bundle:
//!   path: /opt/airlock/bundle.tar.gz
//!
//! module:
//!   path: /srv/game/orbit-1.4.mod   # explicit override, skips the scan
//!   prefix: orbit
//!   extension: .mod
//!
//! provider:
//!   enabled: true
//!   dev_mode: false
//!
//! entry:
//!   framework_module: hull_framework
//!   framework_symbol: hull_framework_main
//!   module_name: orbit
//!   module_symbol: orbit_main
//! ```
//!
//! Environment overrides:
//! - `AIRLOCK_LIBS_PATH` - library cache directory
//! - `AIRLOCK_BUNDLE` - distribution bundle path
//! - `AIRLOCK_MODULE_PATH` - explicit target module path
//! - `AIRLOCK_PATH` - `:`-separated origin list for hosted/dev launches
//! - `AIRLOCK_SKIP_PROVIDER` - any value disables this provider
//! - `AIRLOCK_DEV_MODE` - any value forces the hosted classification path

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{BootstrapError, Result};

/// Default cache directory name, relative to the launch directory.
pub const DEFAULT_CACHE_DIR: &str = ".bootstraplibs";

/// Library cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache directory for unpacked support libraries
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

/// Distribution bundle configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleConfig {
    /// Explicit bundle path. When unset, the launcher looks for a
    /// `bundle.tar.gz` next to the running executable.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Target module configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// Explicit module path. When set, the directory scan never runs.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Required filename prefix for the directory scan (case-sensitive)
    #[serde(default = "default_module_prefix")]
    pub prefix: String,

    /// Required filename extension for the directory scan
    #[serde(default = "default_module_extension")]
    pub extension: String,
}

fn default_module_prefix() -> String {
    "orbit".to_string()
}

fn default_module_extension() -> String {
    ".mod".to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            path: None,
            prefix: default_module_prefix(),
            extension: default_module_extension(),
        }
    }
}

/// Provider toggles
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// When false, the launcher reports and exits without launching
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// When true, the hosted classification path is taken even if a
    /// distribution bundle is present
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            dev_mode: false,
        }
    }
}

/// Entry point names for both launch paths
#[derive(Debug, Clone, Deserialize)]
pub struct EntryConfig {
    /// Library resolved on the packaged path (the framework itself)
    #[serde(default = "default_framework_module")]
    pub framework_module: String,

    /// Symbol invoked on the packaged path
    #[serde(default = "default_framework_symbol")]
    pub framework_symbol: String,

    /// Library resolved on the hosted path (the game module)
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Symbol invoked on the hosted path
    #[serde(default = "default_module_symbol")]
    pub module_symbol: String,
}

fn default_framework_module() -> String {
    "hull_framework".to_string()
}

fn default_framework_symbol() -> String {
    "hull_framework_main".to_string()
}

fn default_module_name() -> String {
    "orbit".to_string()
}

fn default_module_symbol() -> String {
    "orbit_main".to_string()
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            framework_module: default_framework_module(),
            framework_symbol: default_framework_symbol(),
            module_name: default_module_name(),
            module_symbol: default_module_symbol(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub bundle: BundleConfig,

    #[serde(default)]
    pub module: ModuleConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub entry: EntryConfig,

    /// Origin paths for hosted/dev launches (the effective "class path")
    #[serde(default)]
    pub origins: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Search order for `.airlock.yaml`:
    /// 1. Current directory
    /// 2. Home directory
    ///
    /// Environment variables always override file settings.
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Config::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BootstrapError::io(format!("failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content)
            .map_err(|e| BootstrapError::Packaging(format!("invalid config file {}: {}", path.display(), e)))
    }

    fn find_config_file() -> Option<PathBuf> {
        let cwd_config = PathBuf::from(".airlock.yaml");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        if let Ok(home) = env::var("HOME") {
            let home_config = Path::new(&home).join(".airlock.yaml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Apply environment variable overrides on top of the loaded file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = env::var("AIRLOCK_LIBS_PATH") {
            debug!("cache path override from AIRLOCK_LIBS_PATH: {}", path);
            self.cache.path = PathBuf::from(path);
        }

        if let Ok(path) = env::var("AIRLOCK_BUNDLE") {
            self.bundle.path = Some(PathBuf::from(path));
        }

        if let Ok(path) = env::var("AIRLOCK_MODULE_PATH") {
            self.module.path = Some(PathBuf::from(path));
        }

        if let Ok(paths) = env::var("AIRLOCK_PATH") {
            self.origins = paths
                .split(':')
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
        }

        if env::var("AIRLOCK_SKIP_PROVIDER").is_ok() {
            self.provider.enabled = false;
        }

        if env::var("AIRLOCK_DEV_MODE").is_ok() {
            self.provider.dev_mode = true;
        }
    }
}
