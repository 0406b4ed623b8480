//! CLI Configuration

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use hrdesk_client::SyncConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub default_format: Option<String>,
    pub sync: SyncConfig,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }

    pub fn default_format(&self) -> Option<OutputFormat> {
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
    }

    /// Set one key. Sync keys take whole seconds or counts.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let number = || -> Result<u64> {
            value
                .parse::<u64>()
                .with_context(|| format!("{} expects a number, got {:?}", key, value))
        };
        match key {
            "api_url" => self.api_url = Some(value.to_string()),
            "api_token" => self.api_token = Some(value.to_string()),
            "default_format" => {
                OutputFormat::from_str(value, true).map_err(|e| anyhow!(e))?;
                self.default_format = Some(value.to_lowercase());
            }
            "ticket_list_period_secs" => self.sync.ticket_list_period_secs = number()?,
            "admin_queue_period_secs" => self.sync.admin_queue_period_secs = number()?,
            "notification_period_secs" => self.sync.notification_period_secs = number()?,
            "mutation_retry_attempts" => self.sync.mutation_retry_attempts = number()? as u32,
            "request_timeout_secs" => self.sync.request_timeout_secs = number()?,
            _ => return Err(anyhow!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Display value for one key. Tokens are masked.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "api_url" => self.api_url.clone(),
            "api_token" => self.api_token.as_deref().map(mask),
            "default_format" => self.default_format.clone(),
            "ticket_list_period_secs" => Some(self.sync.ticket_list_period_secs.to_string()),
            "admin_queue_period_secs" => Some(self.sync.admin_queue_period_secs.to_string()),
            "notification_period_secs" => Some(self.sync.notification_period_secs.to_string()),
            "mutation_retry_attempts" => Some(self.sync.mutation_retry_attempts.to_string()),
            "request_timeout_secs" => Some(self.sync.request_timeout_secs.to_string()),
            _ => return Err(anyhow!("Unknown config key: {}", key)),
        };
        Ok(value)
    }

    pub const KEYS: &'static [&'static str] = &[
        "api_url",
        "api_token",
        "default_format",
        "ticket_list_period_secs",
        "admin_queue_period_secs",
        "notification_period_secs",
        "mutation_retry_attempts",
        "request_timeout_secs",
    ];

    fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot find home directory"))?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".hrdesk").join(filename))
    }
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(8).collect();
    format!("{}****", visible)
}
