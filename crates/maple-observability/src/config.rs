//! Logging configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter expression (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of plain text
    #[serde(default)]
    pub json_format: bool,

    /// Write to stdout
    #[serde(default = "default_true")]
    pub stdout: bool,

    /// Write to this file as well
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides
    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    /// ANSI colors on stdout
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// Include the event target
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// Include source line numbers
    #[serde(default)]
    pub include_line_number: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            stdout: true,
            file_path: None,
            module_levels: HashMap::new(),
            ansi_colors: true,
            include_target: true,
            include_line_number: false,
        }
    }
}

impl LoggingConfig {
    /// Set the log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Toggle JSON output
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// Also log to a file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Toggle stdout output
    pub fn with_stdout(mut self, stdout: bool) -> Self {
        self.stdout = stdout;
        self
    }

    /// Override the level for one module
    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.module_levels.insert(module.into(), level.into());
        self
    }
}
