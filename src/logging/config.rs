//! Logging configuration
//!
//! Per-component log levels and output destinations for the operation
//! library and the `rixs` front-end.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    pub global_level: String,

    /// Enable console output
    pub console_output: bool,

    /// Directory for JSON log files (None = no file logging)
    pub log_directory: Option<PathBuf>,

    /// Include file location in console logs
    pub include_file_location: bool,

    /// Level for the alignment algorithms and fitting collaborators
    pub algorithm_level: String,

    /// Level for the operation dispatcher
    pub dispatcher_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_level: "info".to_string(),
            console_output: true,
            log_directory: None,
            include_file_location: false,
            algorithm_level: "info".to_string(),
            dispatcher_level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, level) in [
            ("global_level", &self.global_level),
            ("algorithm_level", &self.algorithm_level),
            ("dispatcher_level", &self.dispatcher_level),
        ] {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(format!(
                    "Invalid {}: {}. Must be one of: {:?}",
                    name, level, VALID_LEVELS
                ));
            }
        }

        if let Some(ref log_dir) = self.log_directory {
            if let Some(parent) = log_dir.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(format!("Log directory parent does not exist: {:?}", parent));
                }
            }
        }

        Ok(())
    }

    /// Effective level for a component of the crate
    pub fn get_component_level(&self, component: &str) -> &str {
        match component {
            "algorithm" | "algorithms" | "fitting" => &self.algorithm_level,
            "pipeline" | "dispatcher" => &self.dispatcher_level,
            _ => &self.global_level,
        }
    }

    /// `EnvFilter` directives for this configuration
    pub fn filter_directives(&self) -> String {
        let krate = env!("CARGO_PKG_NAME").replace('-', "_");
        let mut directives = vec![format!("{}={}", krate, self.get_component_level("global"))];
        for module in ["algorithms", "fitting", "pipeline"] {
            directives.push(format!(
                "{}::{}={}",
                krate,
                module,
                self.get_component_level(module)
            ));
        }
        directives.join(",")
    }
}
