//! Layered configuration: built-in defaults, an optional TOML file, then `AHD_*` environment
//! variables. `AWS_REGION` fills `region` when nothing else set it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::source::DEFAULT_MAX_RESULTS;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Mock,
    File,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub source: SourceKind,
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub region: Option<String>,
    pub poll_interval_secs: u64,
    pub max_results: usize,
    pub simulate_latency: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Mock,
            api_base_url: None,
            api_token: None,
            snapshot_path: None,
            region: None,
            poll_interval_secs: 60,
            max_results: DEFAULT_MAX_RESULTS,
            simulate_latency: false,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: &str| AppError::new("CONFIG_INVALID", msg.to_string());
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs must be greater than zero"));
        }
        if self.max_results == 0 {
            return Err(invalid("max_results must be greater than zero"));
        }
        match self.source {
            SourceKind::Http
                if self
                    .api_base_url
                    .as_deref()
                    .map_or(true, |u| u.trim().is_empty()) =>
            {
                Err(invalid("source=http requires api_base_url"))
            }
            SourceKind::File if self.snapshot_path.is_none() => {
                Err(invalid("source=file requires snapshot_path"))
            }
            _ => Ok(()),
        }
    }
}

fn figment_for(config_file: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed("AHD_"))
}

/// Load and validate configuration.
///
/// A missing `config_file` is an error; pass `None` to skip the file layer.
pub fn load_config(config_file: Option<&Path>) -> Result<AppConfig, AppError> {
    if let Some(path) = config_file {
        if !path.exists() {
            return Err(AppError::new("CONFIG_NOT_FOUND", "Config file not found")
                .with_details(format!("path={}", path.display())));
        }
    }

    let mut config: AppConfig = figment_for(config_file).extract().map_err(|e| {
        AppError::new("CONFIG_INVALID", "Failed to load configuration").with_details(e.to_string())
    })?;

    if config.region.is_none() {
        config.region = std::env::var("AWS_REGION")
            .ok()
            .filter(|r| !r.trim().is_empty());
    }

    config.validate()?;
    Ok(config)
}
