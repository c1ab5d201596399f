use std::{
    path::PathBuf,
    sync::Mutex,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::CardpopError;
use crate::persistence::{
    get_app_data_dir,
    load_json_or_default,
    save_json,
};

pub const CONFIG_FILE: &str = "config.json";
pub const BASE_URL_ENV: &str = "CARDPOP_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub enabled: bool,
    pub excluded_sites: Vec<String>,
    pub initial_delay_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            enabled: true,
            excluded_sites: Vec::new(),
            initial_delay_minutes: 1,
        }
    }
}

impl Config {
    /// Whether a reminder should be delivered to the page hosted at `site`.
    pub fn allows_site(&self, site: &str) -> bool {
        self.enabled && !self.excluded_sites.iter().any(|excluded| excluded == site)
    }
}

/// Key-value configuration persisted as JSON.
#[derive(Debug)]
pub struct ConfigStore {
    file_path: PathBuf,
    config: Mutex<Config>,
}

impl ConfigStore {
    pub fn load_default() -> Self {
        Self::load(get_app_data_dir().join(CONFIG_FILE))
    }

    pub fn load(file_path: PathBuf) -> Self {
        let mut config = load_json_or_default::<Config>(&file_path);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        Self { file_path, config: Mutex::new(config) }
    }

    pub fn get(&self) -> Config {
        self.config.lock().map(|config| config.clone()).unwrap_or_default()
    }

    pub fn base_url(&self) -> String {
        self.get().base_url
    }

    pub fn set(&self, config: Config) -> Result<Config, CardpopError> {
        save_json(&config, &self.file_path)?;
        let mut current = self
            .config
            .lock()
            .map_err(|_| CardpopError::Custom("Config lock poisoned".to_string()))?;
        *current = config.clone();
        Ok(config)
    }
}
