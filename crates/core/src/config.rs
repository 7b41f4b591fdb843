//! Resolver configuration
//!
//! Configuration can be created programmatically, loaded from environment
//! variables, or read from a TOML file:
//!
//! ```toml
//! min_rect_size = 2.0
//! max_line_height = 16.0
//!
//! [consolidation]
//! merge_threshold = 2.0
//! predicate = "proximity"
//! strategy = "transitive-closure"
//! ```

use crate::consolidation::{MergeStrategy, RectConsolidationPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default minimum client rectangle side in pixels
pub const DEFAULT_MIN_RECT_SIZE: f32 = 2.0;

/// Per-resolver configuration, fixed for the resolver's lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Client rectangles with a side shorter than this are discarded (pixels)
    pub min_rect_size: f32,
    /// Optional cap on highlight height in document units
    pub max_line_height: Option<f32>,
    pub consolidation: RectConsolidationPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_rect_size: DEFAULT_MIN_RECT_SIZE,
            max_line_height: None,
            consolidation: RectConsolidationPolicy::default(),
        }
    }
}

impl ResolverConfig {
    pub fn with_min_rect_size(mut self, min_rect_size: f32) -> Self {
        self.min_rect_size = min_rect_size;
        self
    }

    pub fn with_max_line_height(mut self, max_line_height: Option<f32>) -> Self {
        self.max_line_height = max_line_height;
        self
    }

    pub fn with_merge_threshold(mut self, merge_threshold: f32) -> Self {
        self.consolidation.merge_threshold = merge_threshold;
        self
    }

    pub fn with_consolidation(mut self, consolidation: RectConsolidationPolicy) -> Self {
        self.consolidation = consolidation;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDF_ANNOTATOR_MIN_RECT_SIZE`: minimum rectangle side in pixels
    /// - `PDF_ANNOTATOR_MAX_LINE_HEIGHT`: line height cap, `none` to disable
    /// - `PDF_ANNOTATOR_MERGE_THRESHOLD`: merge distance in document units
    /// - `PDF_ANNOTATOR_MERGE_STRATEGY`: `transitive` or `line-sweep`
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value, including
    /// values that parse but fail the same checks as a TOML file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("PDF_ANNOTATOR_MIN_RECT_SIZE") {
            config.min_rect_size = parse_non_negative("PDF_ANNOTATOR_MIN_RECT_SIZE", &value)?;
        }

        if let Ok(value) = std::env::var("PDF_ANNOTATOR_MAX_LINE_HEIGHT") {
            config.max_line_height = if value.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse_non_negative("PDF_ANNOTATOR_MAX_LINE_HEIGHT", &value)?)
            };
        }

        if let Ok(value) = std::env::var("PDF_ANNOTATOR_MERGE_THRESHOLD") {
            config.consolidation.merge_threshold =
                parse_non_negative("PDF_ANNOTATOR_MERGE_THRESHOLD", &value)?;
        }

        if let Ok(value) = std::env::var("PDF_ANNOTATOR_MERGE_STRATEGY") {
            config.consolidation.strategy = match value.trim() {
                "transitive" | "transitive-closure" => MergeStrategy::TransitiveClosure,
                "line-sweep" => MergeStrategy::LineSweep,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "PDF_ANNOTATOR_MERGE_STRATEGY".to_string(),
                    ))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or holds
    /// negative sizes.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_rect_size >= 0.0) {
            return Err(ConfigError::InvalidValue("min_rect_size".to_string()));
        }
        if !(self.consolidation.merge_threshold >= 0.0) {
            return Err(ConfigError::InvalidValue(
                "consolidation.merge_threshold".to_string(),
            ));
        }
        if matches!(self.max_line_height, Some(height) if !(height > 0.0)) {
            return Err(ConfigError::InvalidValue("max_line_height".to_string()));
        }
        Ok(())
    }
}

fn parse_non_negative(key: &str, value: &str) -> Result<f32, ConfigError> {
    match value.trim().parse::<f32>() {
        Ok(parsed) if parsed >= 0.0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
