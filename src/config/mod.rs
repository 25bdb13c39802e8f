//! Run configuration: logging plus default parameters for every family.
//!
//! Files are JSON when they start with `{`, TOML otherwise. Missing
//! sections and keys take their defaults.

use crate::algorithms::AlignmentParams;
use crate::analysis::StatsParams;
use crate::logging::LoggingConfig;
use crate::operations::{
    BinningMode, FilterParams, IntegrationParams, ManipulationParams, NormalizationParams,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub filter: FilterParams,
    pub alignment: AlignmentParams,
    pub integration: IntegrationParams,
    pub normalization: NormalizationParams,
    pub manipulation: ManipulationParams,
    pub stats: StatsParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        if content.trim_start().starts_with('{') {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing JSON config {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("parsing TOML config {}", path.display()))
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> Result<()> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };
        fs::write(path.as_ref(), content)
            .with_context(|| format!("writing config file {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.logging.validate() {
            errors.push(format!("logging: {}", e));
        }

        let alignment = &self.alignment;
        if !(-1..=1).contains(&alignment.axis) {
            errors.push(format!("alignment axis must be -1, 0 or 1, got {}", alignment.axis));
        }
        if !(0.0..1.0).contains(&alignment.portion) {
            errors.push(format!("alignment portion must be in [0, 1), got {}", alignment.portion));
        }
        if let Some(scale) = &alignment.scale {
            if scale.len() < 2 {
                errors.push("alignment scale needs at least two samples".to_string());
            }
        }

        if let (Some(low), Some(high)) = (self.filter.low, self.filter.high) {
            if low > high {
                errors.push(format!("filter low ({}) is above high ({})", low, high));
            }
        }

        if self.manipulation.bin_width == 0 {
            errors.push("manipulation binWidth must be positive".to_string());
        }
        if !(0..=1).contains(&self.manipulation.axis) {
            errors.push(format!(
                "manipulation axis must be 0 or 1, got {}",
                self.manipulation.axis
            ));
        }
        if let Err(e) = BinningMode::from_str(&self.manipulation.mode) {
            errors.push(format!("manipulation: {}", e));
        }

        let integration = &self.integration;
        if integration.bin_width == 0 {
            errors.push("integration binWidth must be positive".to_string());
        }
        if !(-1..=1).contains(&integration.axis) {
            errors.push(format!("integration axis must be -1, 0 or 1, got {}", integration.axis));
        }
        for (name, axis) in [
            ("sumAxis", integration.sum_axis),
            ("sliceAxis", integration.slice_axis),
        ] {
            if !(0..=1).contains(&axis) {
                errors.push(format!("integration {} must be 0 or 1, got {}", name, axis));
            }
        }
        if let Err(e) = BinningMode::from_str(&integration.mode) {
            errors.push(format!("integration: {}", e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Load `config_path`, falling back to defaults when it is absent,
/// unreadable or invalid.
pub fn load_config_or_default(config_path: Option<&str>) -> Config {
    let Some(path) = config_path else {
        return Config::default();
    };
    match Config::load_from_file(path) {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(errors) => {
                eprintln!("Configuration validation errors:");
                for error in errors {
                    eprintln!("  - {}", error);
                }
                eprintln!("Using default configuration instead.");
                Config::default()
            }
        },
        Err(e) => {
            eprintln!("Failed to load config from '{}': {:#}", path, e);
            eprintln!("Using default configuration.");
            Config::default()
        }
    }
}
