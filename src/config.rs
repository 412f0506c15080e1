use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

fn default_api_base_url() -> String {
    "http://localhost:3030/api".to_string()
}

fn default_hub_url() -> String {
    "ws://localhost:3030/chathub".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gốc của REST API, ví dụ `http://localhost:3030/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Endpoint WebSocket của hub realtime.
    #[serde(default = "default_hub_url")]
    pub hub_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            hub_url: default_hub_url(),
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
