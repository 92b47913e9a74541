//! Dataset locations and decoding settings.
//!
//! Settings can be read from a JSON file so a deployment can point the
//! explorer at a different data directory without rebuilding. Missing
//! fields fall back to the defaults below.

use crate::data::Granularity;
use crate::error::{DataError, DataResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Text encoding of the GeoJSON boundary files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// ISO-8859-1, used by the Census Bureau boundary files.
    #[default]
    Latin1,
    Utf8,
}

impl TextEncoding {
    /// Decodes raw file bytes into a string.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String, std::string::FromUtf8Error> {
        match self {
            // Every Latin-1 byte maps to the code point of the same value
            TextEncoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
            TextEncoding::Utf8 => String::from_utf8(bytes),
        }
    }
}

/// Locations of every file the data layer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory the file names below are relative to.
    pub data_dir: PathBuf,
    pub country_csv: String,
    pub state_csv: String,
    pub county_csv: String,
    pub state_geojson: String,
    pub county_geojson: String,
    /// FIPS reference table (`name, fips, abbr`).
    pub fips_csv: String,
    pub geo_encoding: TextEncoding,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            country_csv: "us.csv".to_string(),
            state_csv: "us-states.csv".to_string(),
            county_csv: "us-counties.csv".to_string(),
            state_geojson: "gz_2010_us_040_00_20m.json".to_string(),
            county_geojson: "gz_2010_us_050_00_20m.json".to_string(),
            fips_csv: "us-state-ansi-fips.csv".to_string(),
            geo_encoding: TextEncoding::Latin1,
        }
    }
}

impl DataConfig {
    /// Creates a config with default file names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this config rooted at another data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_geo_encoding(mut self, encoding: TextEncoding) -> Self {
        self.geo_encoding = encoding;
        self
    }

    /// Path of the time-series CSV for a granularity.
    pub fn time_series_path(&self, granularity: Granularity) -> PathBuf {
        let file = match granularity {
            Granularity::Country => &self.country_csv,
            Granularity::State => &self.state_csv,
            Granularity::County => &self.county_csv,
        };
        self.data_dir.join(file)
    }

    /// Path of the boundary GeoJSON for a granularity.
    ///
    /// There is no country boundary file.
    pub fn geo_path(&self, granularity: Granularity) -> DataResult<PathBuf> {
        let file = match granularity {
            Granularity::State => &self.state_geojson,
            Granularity::County => &self.county_geojson,
            Granularity::Country => {
                return Err(DataError::Configuration(
                    "no boundary file exists at country granularity".to_string(),
                ))
            }
        };
        Ok(self.data_dir.join(file))
    }

    pub fn fips_path(&self) -> PathBuf {
        self.data_dir.join(&self.fips_csv)
    }

    /// Reads a config from a JSON file.
    pub fn load(path: &Path) -> DataResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        serde_json::from_str(&json).map_err(|source| DataError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads a config from a JSON file, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded data config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Using default data config: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = DataConfig::new().with_data_dir("/srv/covid");
        assert_eq!(
            config.time_series_path(Granularity::County),
            PathBuf::from("/srv/covid/us-counties.csv")
        );
        assert_eq!(
            config.geo_path(Granularity::State).unwrap(),
            PathBuf::from("/srv/covid/gz_2010_us_040_00_20m.json")
        );
        assert_eq!(
            config.fips_path(),
            PathBuf::from("/srv/covid/us-state-ansi-fips.csv")
        );
    }

    #[test]
    fn test_country_has_no_geo_path() {
        let err = DataConfig::default()
            .geo_path(Granularity::Country)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_latin1_decode() {
        // "Doña Ana" with ñ as the single byte 0xF1
        let bytes = b"Do\xF1a Ana".to_vec();
        assert_eq!(TextEncoding::Latin1.decode(bytes.clone()).unwrap(), "Doña Ana");
        assert!(TextEncoding::Utf8.decode(bytes).is_err());
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"data_dir": "/tmp/elsewhere", "geo_encoding": "utf8"}"#).unwrap();

        let config = DataConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.geo_encoding, TextEncoding::Utf8);
        assert_eq!(config.county_csv, "us-counties.csv");
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(DataConfig::load_or_default(&missing), DataConfig::default());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            DataConfig::load(&broken),
            Err(DataError::Config { .. })
        ));
        assert_eq!(DataConfig::load_or_default(&broken), DataConfig::default());
    }
}
