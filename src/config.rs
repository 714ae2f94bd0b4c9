use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "Italian";
pub const DEFAULT_SUBTITLE_LANG: &str = "en";
pub const DEFAULT_CACHE_TTL_DAYS: u64 = 7;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 300;

/// How raw subtitle bodies are downloaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Curl,
    Http,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub language: Option<String>,
    pub subtitle_lang: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl_days: Option<u64>,
    pub tool_timeout_secs: Option<u64>,
    pub transport: Option<TransportKind>,
    pub template: Option<String>,
}

impl Config {
    /// Load config from ~/.config/qv/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn subtitle_lang(&self) -> &str {
        self.subtitle_lang.as_deref().unwrap_or(DEFAULT_SUBTITLE_LANG)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_days.unwrap_or(DEFAULT_CACHE_TTL_DAYS).saturating_mul(24 * 60 * 60))
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS))
    }

    pub fn transport(&self) -> TransportKind {
        self.transport.unwrap_or_default()
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("qv")
        .join("config.toml")
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("qv")
        .join("subtitles")
}
