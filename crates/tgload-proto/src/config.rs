use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the chat history comes from and how to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Chat whose history is browsed.
    #[serde(default)]
    pub chat_id: i64,
    /// Program that speaks TDLib JSON, one object per line, over stdin/stdout.
    #[serde(default = "default_bridge_command")]
    pub bridge_command: String,
    #[serde(default)]
    pub bridge_args: Vec<String>,
    /// Per-request timeout enforced by the transport.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Size of the first page and of every refresh.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Size of each older page loaded on demand.
    #[serde(default = "default_next_page_size")]
    pub next_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Completed downloads are moved here when archived.
    #[serde(default = "platform::default_archive_dir")]
    pub archive_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_open_command")]
    pub open_command: String,
    /// Archive finished downloads and delete their messages automatically.
    #[serde(default = "default_auto_archive")]
    pub auto_archive: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            chat_id: 0,
            bridge_command: default_bridge_command(),
            bridge_args: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            next_page_size: default_next_page_size(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            archive_dir: platform::default_archive_dir(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            open_command: default_open_command(),
            auto_archive: default_auto_archive(),
        }
    }
}

fn default_bridge_command() -> String {
    "tdjson-bridge".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> u32 {
    100
}

fn default_next_page_size() -> u32 {
    10
}

fn default_open_command() -> String {
    if platform::is_termux() {
        "termux-open".to_string()
    } else {
        "xdg-open".to_string()
    }
}

fn default_auto_archive() -> bool {
    true
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog.page_size, 100);
        assert_eq!(config.catalog.next_page_size, 10);
        assert_eq!(config.telegram.request_timeout_secs, 60);
        assert!(config.ui.auto_archive);
        assert!(config.paths.archive_dir.ends_with("tgload"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [telegram]
            chat_id = -100123
            bridge_args = ["--db", "/tmp/td"]

            [ui]
            auto_archive = false
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.chat_id, -100123);
        assert_eq!(config.telegram.bridge_command, "tdjson-bridge");
        assert_eq!(config.telegram.bridge_args, vec!["--db", "/tmp/td"]);
        assert!(!config.ui.auto_archive);
        assert_eq!(config.catalog.page_size, 100);
    }
}
