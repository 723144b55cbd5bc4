use std::path::PathBuf;
use thiserror::Error;

use crate::annotation::AnnotationError;
use crate::coerce::CoerceError;

#[derive(Debug, Error)]
pub enum LayerfigError {
    #[error("Invalid annotation on field '{field}': {source}")]
    Annotation {
        field: String,
        source: AnnotationError,
    },

    #[error("Unsupported file type: {path} is not valid YAML, JSON or TOML")]
    UnsupportedFileType { path: PathBuf },

    #[error("No config file named '{base_name}' found in any search location")]
    NoFileFound { base_name: String },

    #[error("Invalid value for '{key}' from {origin}: {source}")]
    InvalidValue {
        key: String,
        origin: String,
        source: CoerceError,
    },

    #[error("Field '{0}' can no longer be resolved on the settings value")]
    CantSet(String),

    #[error("Short flag '-{short}' is used by both '--{first}' and '--{second}'")]
    DuplicateShortFlag {
        short: char,
        first: String,
        second: String,
    },

    #[error("Failed to parse flags: {0}")]
    Flags(#[from] clap::Error),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("App name is required for the platform search path, call .app_name() on the collector")]
    AppNameRequired,
}

impl LayerfigError {
    /// Soft errors describe a condition the collector tolerates: a merge with
    /// no config file on disk is still a valid merge.
    pub fn is_soft(&self) -> bool {
        matches!(self, LayerfigError::NoFileFound { .. })
    }
}
