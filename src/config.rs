//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$TAGBOX_CONFIG` (environment variable)
//! 2. `~/.config/tagbox/config.toml` (Linux/macOS)
//!    `%APPDATA%\tagbox\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// The mail account served.
    pub account: AccountConfig,
    /// Background tag indexer.
    pub indexer: IndexerConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Account settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountConfig {
    /// Own address: the SMTP sender, and excluded from reply-all targets.
    pub address: String,
    pub display_name: String,
    /// Mailboxes registered at startup, in enumeration order.
    pub mailboxes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexerConfig {
    pub enabled: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            display_name: String::new(),
            mailboxes: ["INBOX", "DRAFTS", "SENT", "TRASH"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AccountConfig {
    /// `Display Name <address>`, or the bare address without a name.
    pub fn from_header(&self) -> String {
        if self.display_name.trim().is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name.trim(), self.address)
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Config::default(),
    }
}

/// Load configuration from `path`, falling back to defaults on any error.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "Loaded config");
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            Config::default()
        }
    }
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    save_config_to(config, &path)
}

pub fn save_config_to(config: &Config, path: &Path) -> anyhow::Result<()> {
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
    if let Ok(env_path) = std::env::var("TAGBOX_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("tagbox").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tagbox")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("tagbox.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.account.mailboxes, vec!["INBOX", "DRAFTS", "SENT", "TRASH"]);
        assert!(cfg.indexer.enabled);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[account]
address = "me@pixelated.org"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.account.address, "me@pixelated.org");
        assert_eq!(cfg.account.mailboxes.len(), 4);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.account.address = "me@pixelated.org".into();
        cfg.account.display_name = "Me".into();
        cfg.indexer.enabled = false;
        save_config_to(&cfg, &path).expect("save");
        assert_eq!(load_config_from(&path), cfg);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[account\naddress = ").expect("write");
        assert_eq!(load_config_from(&path), Config::default());
        assert_eq!(
            load_config_from(&dir.path().join("missing.toml")),
            Config::default()
        );
    }

    #[test]
    fn test_from_header() {
        let mut account = AccountConfig {
            address: "me@pixelated.org".into(),
            ..Default::default()
        };
        assert_eq!(account.from_header(), "me@pixelated.org");
        account.display_name = "Me".into();
        assert_eq!(account.from_header(), "Me <me@pixelated.org>");
    }
}
