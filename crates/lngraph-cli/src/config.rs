//! User configuration and cache-directory resolution.
//!
//! ```toml
//! # ~/.config/lngraph/config.toml
//! [cache]
//! enabled = true
//! dir = "/var/cache/lngraph"
//!
//! [report]
//! top = 10
//! amount_sat = 100000
//! ```

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment override for the matrix cache directory.
pub const CACHE_DIR_ENV: &str = "LNGRAPH_CACHE_DIR";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Rows shown in ranked listings.
    #[serde(default = "default_top")]
    pub top: usize,
    /// Payment size used when `--amount` is omitted.
    #[serde(default = "default_amount_sat")]
    pub amount_sat: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top: default_top(),
            amount_sat: default_amount_sat(),
        }
    }
}

/// Load configuration from `explicit`, or from the user config directory.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(config_dir) = dirs::config_dir() else {
                return Ok(Config::default());
            };
            let path = config_dir.join("lngraph/config.toml");
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Core cache-directory resolution, separated from I/O for testability.
///
/// Precedence: `--no-cache`, `--cache-dir`, `LNGRAPH_CACHE_DIR`, then the
/// config file. `cache.enabled = false` turns off the config-derived
/// locations only; explicit flag and env values still apply.
fn resolve_cache_dir_inner(
    no_cache: bool,
    flag: Option<&Path>,
    env_dir: Option<&str>,
    config: &CacheConfig,
    platform_cache_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if no_cache {
        return None;
    }
    if let Some(dir) = flag {
        return Some(dir.to_path_buf());
    }
    if let Some(dir) = env_dir.filter(|d| !d.trim().is_empty()) {
        return Some(PathBuf::from(dir));
    }
    if !config.enabled {
        return None;
    }
    if let Some(dir) = &config.dir {
        return Some(dir.clone());
    }
    platform_cache_dir.map(|dir| dir.join("lngraph"))
}

/// Resolve the matrix cache directory, `None` meaning caching is off.
pub fn resolve_cache_dir(no_cache: bool, flag: Option<&Path>, config: &CacheConfig) -> Option<PathBuf> {
    let env_dir = env::var(CACHE_DIR_ENV).ok();
    resolve_cache_dir_inner(no_cache, flag, env_dir.as_deref(), config, dirs::cache_dir())
}

const fn default_true() -> bool {
    true
}

const fn default_top() -> usize {
    10
}

const fn default_amount_sat() -> u64 {
    100_000
}
