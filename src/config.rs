//! YAML configuration for the importer

// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Deserialize;
use std::path::Path;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config, {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to unmarshal, {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0} not exist")]
    MissingKey(&'static str),
    #[error("invalid log-level: {0}")]
    BadLogLevel(String),
}

/// Which pipe-delimited field layout the input file uses
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Lines carry a start address and a prefix length
    #[default]
    Prefix,
    /// Lines carry an inclusive start and end address
    Range,
}

/// Runtime configuration, deserialized from a YAML key-value file
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(rename = "office-node-api-url", default)]
    pub office_node_api_url: String,
    #[serde(rename = "node-group-api-url", default)]
    pub node_group_api_url: String,
    #[serde(rename = "submit-api-url", default)]
    pub submit_api_url: String,
    #[serde(rename = "log-directory", default = "default_log_directory")]
    pub log_directory: String,
    #[serde(rename = "log-level", default = "default_log_level")]
    pub log_level: String,
    #[serde(rename = "input-format", default)]
    pub input_format: InputFormat,
    #[serde(rename = "dedup-records", default)]
    pub dedup_records: bool,
}

fn default_log_directory() -> String {
    "log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: Self = serde_yaml::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.office_node_api_url.is_empty() {
            return Err(Error::MissingKey("office-node-api-url"));
        }
        if self.node_group_api_url.is_empty() {
            return Err(Error::MissingKey("node-group-api-url"));
        }
        if self.submit_api_url.is_empty() {
            return Err(Error::MissingKey("submit-api-url"));
        }
        Ok(())
    }

    /// Level filter for the logger backends
    pub fn level_filter(&self) -> Result<log::LevelFilter, Error> {
        self.log_level
            .parse()
            .map_err(|_| Error::BadLogLevel(self.log_level.clone()))
    }
}
