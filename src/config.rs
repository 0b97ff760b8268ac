//! Parser for the optional `.phpdoc-parser.yml` configuration file.
//!
//! Format:
//! ```yaml
//! database: .phpdoc.db
//! output_file: phpdoc.json
//! extensions: [php]
//! exclude:
//!   - vendor/**
//!   - node_modules/**
//! throttle:
//!   every: 10
//!   delay_ms: 1000
//! ```
//!
//! Every key is optional. Command-line flags take precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParserError, Result};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILENAME: &str = ".phpdoc-parser.yml";

/// Interchange file written by `export` when no output file is given
pub const DEFAULT_OUTPUT_FILE: &str = "phpdoc.json";

/// Content store used by `import` and `create` when `--db` is not given
pub const DEFAULT_DATABASE: &str = ".phpdoc.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: PathBuf,
    pub output_file: PathBuf,
    /// File extensions (without dot) considered source files
    pub extensions: Vec<String>,
    /// Glob patterns, relative to the scanned directory, to leave out
    pub exclude: Vec<String>,
    pub throttle: ThrottleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            extensions: vec!["php".to_string()],
            exclude: Vec::new(),
            throttle: ThrottleConfig::default(),
        }
    }
}

/// Pacing applied to content-store writes when throttling is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThrottleConfig {
    /// Pause after this many writes
    pub every: usize,
    pub delay_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            every: 10,
            delay_ms: 1000,
        }
    }
}

impl ThrottleConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Parses configuration file content
pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(content)
        .map_err(|e| ParserError::Config(format!("Invalid configuration YAML: {}", e)))?;
    if config.extensions.is_empty() {
        return Err(ParserError::Config(
            "extensions must name at least one file extension".to_string(),
        ));
    }
    Ok(config)
}

/// Loads configuration.
///
/// An explicit path must exist. Without one, [`CONFIG_FILENAME`] in the
/// working directory is used when present, defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = PathBuf::from(CONFIG_FILENAME);
            if !candidate.is_file() {
                return Ok(Config::default());
            }
            candidate
        }
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| ParserError::Config(format!("Can't read {}: {}", path.display(), e)))?;
    parse_config(&content)
        .map_err(|e| ParserError::Config(format!("{} ({})", e, path.display())))
}
