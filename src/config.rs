//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILCAT_CONFIG` (environment variable)
//! 2. `~/.config/mailcat/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailcat\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Decoder limits and heuristics.
    pub decoder: DecoderConfig,
    /// HTML synthesis settings.
    pub render: RenderConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Decoder limits and heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Largest source (in bytes) the resolver will look at (default: 33554432 = 32 MB).
    pub max_input_size: usize,
    /// Maximum number of multipart sections read per split.
    pub max_parts: usize,
    /// Only unwrap whole-body Base64 when the decoded bytes are valid UTF-8.
    pub require_utf8_base64: bool,
}

/// Settings for the plain-text → HTML synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Inline CSS of the wrapping `<div>`.
    pub container_style: String,
    /// Open auto-linked URLs in a new browsing context.
    pub link_target_blank: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_input_size: 32 * 1024 * 1024, // 32 MB
            max_parts: 256,
            require_utf8_base64: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            container_style: "font-family: monospace; white-space: pre-wrap; word-wrap: break-word;"
                .to_string(),
            link_target_blank: true,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration from [`config_file_path`].
///
/// A missing file gives the defaults; an unreadable or invalid one is
/// reported with `warn!` and also gives the defaults.
pub fn load_config() -> Config {
    let Some(path) = config_file_path().filter(|p| p.exists()) else {
        return Config::default();
    };
    match read_config(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "Loaded config");
            cfg
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring config file, using defaults");
            Config::default()
        }
    }
}

/// Parse one config file.
pub fn read_config(path: &std::path::Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    save_config_to(config, &path)
}

/// Save configuration to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILCAT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("mailcat").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailcat")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mailcat.log")
}
