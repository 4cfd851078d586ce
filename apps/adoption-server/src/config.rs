//! Host configuration.
//!
//! Layers, later wins:
//! 1) built-in defaults -> 2) YAML file (if provided) -> 3) env (`ADOPTION__*`)

use std::path::Path;

use adoption::config::AdoptionConfig;
use anyhow::{Context, Result, ensure};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::logging;

/// Environment prefix; nested keys are separated by `__`,
/// e.g. `ADOPTION__LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "ADOPTION__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub files: FilesConfig,
    pub adoption: AdoptionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FilesConfig {
    /// Stored file keys are appended to this URL when rendered for clients.
    pub base_url: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000/files".to_owned(),
        }
    }
}

impl AppConfig {
    /// Loads and validates the layered configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML file or an environment override cannot be
    /// parsed, or if the merged configuration is inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        let adoption = &self.adoption;
        ensure!(
            adoption.max_page_size > 0,
            "adoption.max_page_size must be greater than zero"
        );
        ensure!(
            adoption.default_page_size <= adoption.max_page_size,
            "adoption.default_page_size ({}) must not exceed adoption.max_page_size ({})",
            adoption.default_page_size,
            adoption.max_page_size
        );
        ensure!(
            adoption.max_text_length > 0,
            "adoption.max_text_length must be greater than zero"
        );
        ensure!(
            adoption.recent_activity_limit > 0,
            "adoption.recent_activity_limit must be greater than zero"
        );
        ensure!(
            !self.files.base_url.trim().is_empty(),
            "files.base_url must not be empty"
        );
        logging::parse_filter(&self.logging.level)?;
        Ok(())
    }

    /// `-v` info, `-vv` debug, `-vvv` trace; zero keeps the configured level.
    pub fn apply_verbosity(&mut self, verbose: u8) {
        let level = match verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration as YAML")
    }
}
