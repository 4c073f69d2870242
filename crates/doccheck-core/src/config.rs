//! Configuration types for doccheck.

use crate::document::HeadingStyle;
use crate::matcher::MatchOptions;
use crate::types::RuleStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for doccheck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset to use (e.g., "recommended", "strict", "minimal").
    #[serde(default)]
    pub preset: Option<String>,

    /// Status threshold for failing a run (default: "fail").
    /// Outcomes at or above this status cause a non-zero exit.
    #[serde(default)]
    pub fail_on: Option<String>,

    /// Matcher configuration.
    #[serde(default)]
    pub matcher: MatcherConfig,

    /// Validator configuration.
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// Per-rule overrides, keyed by rule id.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or the heading marker
    /// collides with code fence markers.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        let marker = config.matcher.heading_marker;
        if !HeadingStyle::is_valid_marker(marker) {
            return Err(ConfigError::Invalid {
                key: "matcher.heading_marker",
                value: marker.to_string(),
            });
        }
        Ok(config)
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the `required` override for a rule.
    #[must_use]
    pub fn required_override(&self, rule_id: &str) -> Option<bool> {
        self.rules.get(rule_id).and_then(|c| c.required)
    }

    /// Resolves the failure threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if `fail_on` names an unknown status.
    pub fn fail_on_status(&self) -> Result<RuleStatus, ConfigError> {
        match self.fail_on.as_deref() {
            None => Ok(RuleStatus::Fail),
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "fail_on",
                value: value.to_string(),
            }),
        }
    }
}

/// Matcher-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Lines captured after a matched heading.
    #[serde(default = "default_section_lines")]
    pub section_lines: usize,

    /// Sliding window size for keyword sets.
    #[serde(default = "default_window_lines")]
    pub window_lines: usize,

    /// Maximum snippet length in characters.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    /// Heading marker character.
    #[serde(default = "default_heading_marker")]
    pub heading_marker: char,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            section_lines: default_section_lines(),
            window_lines: default_window_lines(),
            snippet_chars: default_snippet_chars(),
            heading_marker: default_heading_marker(),
        }
    }
}

impl MatcherConfig {
    /// Converts to matcher options.
    #[must_use]
    pub fn options(&self) -> MatchOptions {
        MatchOptions {
            section_lines: self.section_lines,
            window_lines: self.window_lines.max(1),
            snippet_chars: self.snippet_chars,
        }
    }

    /// Heading style for document parsing.
    #[must_use]
    pub fn heading_style(&self) -> HeadingStyle {
        HeadingStyle::new(self.heading_marker)
    }
}

fn default_section_lines() -> usize {
    MatchOptions::default().section_lines
}

fn default_window_lines() -> usize {
    MatchOptions::default().window_lines
}

fn default_snippet_chars() -> usize {
    MatchOptions::default().snippet_chars
}

fn default_heading_marker() -> char {
    HeadingStyle::default().marker
}

/// Validator-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Maximum number of worker threads evaluating rules.
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Timeout for loading each document, in milliseconds.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            parallelism: None,
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

impl ValidatorConfig {
    /// Upper bound on worker threads when `parallelism` is unset.
    pub const MAX_DEFAULT_WORKERS: usize = 8;

    /// Effective worker count: the configured value, or the available
    /// parallelism capped at [`Self::MAX_DEFAULT_WORKERS`].
    #[must_use]
    pub fn workers(&self) -> usize {
        self.parallelism
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map_or(1, std::num::NonZeroUsize::get)
                    .min(Self::MAX_DEFAULT_WORKERS)
            })
            .max(1)
    }

    /// Per-document load timeout.
    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

fn default_load_timeout_ms() -> u64 {
    5000
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Override for the rule's `required` flag.
    #[serde(default)]
    pub required: Option<bool>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A value is syntactically valid but not allowed.
    #[error("Invalid value `{value}` for `{key}`")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}
