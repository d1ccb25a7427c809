//! Guideline reference data: warning thresholds and weight-band presets.

mod presets;
mod thresholds;

pub use presets::*;
pub use thresholds::*;

use thiserror::Error;

/// Threshold configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: f64 },

    #[error("Thresholds out of order: {0}")]
    Unordered(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
