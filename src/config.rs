use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::models::{ScheduleParams, DEFAULT_HOURS, DEFAULT_START, DEFAULT_URGENCY_WINDOW_DAYS};

const APP_NAME: &str = "dayplan";
const CONFIG_FILE: &str = "config.json";

/// Application settings.
///
/// Resolved in layers: built-in defaults, then `config.json` in the user's
/// config directory, then `DAYPLAN_*` environment variables. CLI flags are
/// applied on top by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Task file location. `None` uses the platform data directory.
    pub data_file: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    /// Length of the working day in hours.
    pub hours: f64,
    /// Start of the working day, `HH:MM`.
    pub start: String,
    pub allow_split: bool,
    pub urgency_window_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            host: "127.0.0.1".to_string(),
            port: 5000,
            hours: DEFAULT_HOURS,
            start: DEFAULT_START.to_string(),
            allow_split: false,
            urgency_window_days: DEFAULT_URGENCY_WINDOW_DAYS,
        }
    }
}

impl AppConfig {
    /// Load configuration from the user's config directory and environment.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply `DAYPLAN_*` overrides. Unparsable values are ignored with a warning.
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = var("DAYPLAN_DATA_FILE") {
            self.data_file = Some(PathBuf::from(path));
        }
        if let Some(host) = var("DAYPLAN_HOST") {
            self.host = host;
        }
        if let Some(port) = parse_env(&var, "DAYPLAN_PORT") {
            self.port = port;
        }
        if let Some(hours) = parse_env(&var, "DAYPLAN_HOURS") {
            self.hours = hours;
        }
        if let Some(start) = var("DAYPLAN_START") {
            self.start = start;
        }
        if let Some(allow_split) = parse_env(&var, "DAYPLAN_ALLOW_SPLIT") {
            self.allow_split = allow_split;
        }
        if let Some(window) = parse_env(&var, "DAYPLAN_URGENCY_WINDOW") {
            self.urgency_window_days = window;
        }
        self
    }

    /// Scheduling defaults for requests that leave parameters out.
    pub fn schedule_defaults(&self) -> ScheduleParams {
        ScheduleParams {
            hours: Some(self.hours),
            budget_minutes: None,
            start: Some(self.start.clone()),
            allow_split: Some(self.allow_split),
            urgency_window: Some(self.urgency_window_days),
        }
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
