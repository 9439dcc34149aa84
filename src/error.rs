//! Error types for curbside

use std::path::PathBuf;

use thiserror::Error;

/// Library error type.
///
/// Per-record problems (degenerate geometry, unknown flag codes) never show
/// up here; they collapse into sentinel classifications instead. Only
/// dataset-level failures are errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No input found: {0}")]
    MissingInput(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory scan failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Imagery fetch failed: {0}")]
    Fetch(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(Box::new(e))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Fetch(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
