//! Error types for data loading.
//!
//! Lookup misses (an unknown FIPS code) are not errors; they resolve to a
//! sentinel value at the call site. Everything here is fatal for the
//! operation that produced it and is never retried, since the inputs are
//! static local files.

use std::path::PathBuf;

/// Result type for data layer operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors that can occur while loading or resolving datasets.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A data file could not be opened or read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV file was readable but did not match the expected layout.
    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A boundary file was not valid GeoJSON.
    #[error("malformed GeoJSON in {}: {source}", .path.display())]
    GeoJson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },

    /// A boundary file parsed but was not a FeatureCollection.
    #[error("{} is not a GeoJSON FeatureCollection", .path.display())]
    NotFeatureCollection { path: PathBuf },

    /// A configuration file was readable but could not be parsed.
    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A resolver was asked for something no granularity defines.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from a missing or unreadable file.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Whether this error is a programmer/configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
