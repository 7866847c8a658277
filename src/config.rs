use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Belay backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub settings: Settings,

    #[serde(skip)]
    pub config_dir: PathBuf,
}

/// Refresh intervals for the resource pollers, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_channel_poll_ms")]
    pub channels_ms: u64,

    #[serde(default = "default_unread_poll_ms")]
    pub unread_ms: u64,

    #[serde(default = "default_message_poll_ms")]
    pub messages_ms: u64,

    #[serde(default = "default_reply_poll_ms")]
    pub replies_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub show_reactions: bool,

    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    #[serde(default = "default_true")]
    pub show_notifications: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            channels_ms: default_channel_poll_ms(),
            unread_ms: default_unread_poll_ms(),
            messages_ms: default_message_poll_ms(),
            replies_ms: default_reply_poll_ms(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_reactions: true,
            show_timestamps: true,
            show_notifications: true,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_channel_poll_ms() -> u64 {
    500
}

fn default_unread_poll_ms() -> u64 {
    5000
}

fn default_message_poll_ms() -> u64 {
    500
}

fn default_reply_poll_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_dir = Self::get_config_dir();
        let config_path = config_dir.join("belay_config.json");

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let mut config: Config = serde_json::from_str(&content)?;
            config.config_dir = config_dir;
            return Ok(config);
        }

        // First run: write defaults so the server URL is easy to edit.
        let config = Config {
            base_url: default_base_url(),
            polling: PollingConfig::default(),
            settings: Settings::default(),
            config_dir,
        };
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        let config_path = self.config_dir.join("belay_config.json");
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    fn get_config_dir() -> PathBuf {
        // Keep config local to the project when running from a cargo tree.
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                if exe_dir.ends_with("target/release") || exe_dir.ends_with("target/debug") {
                    if let Some(project_root) = exe_dir.parent().and_then(|p| p.parent()) {
                        return project_root.join("config");
                    }
                }
                return exe_dir.join("config");
            }
        }

        if let Ok(current_dir) = std::env::current_dir() {
            return current_dir.join("config");
        }

        let home = dirs::home_dir().expect("Cannot determine home directory");
        home.join(".config").join("belay_client_rs")
    }

    pub fn session_path(&self) -> PathBuf {
        self.config_dir.join("session.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.config_dir.join("belay_client.log")
    }
}
