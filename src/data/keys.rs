//! Core key types for the data layer.
//!
//! - `Granularity`: Level of geographic aggregation (country, state, county)
//! - `Fips`: FIPS region code, kept as a string to preserve leading zeros
//! - `Series`: Which numeric column of a record a chart displays
//! - `FilterKey`: Normalized arguments of a time-series filter, used as a cache key
//!
//! ## FIPS Containment
//!
//! A region's code is a prefix of the codes of every region it contains.
//! The country is the empty code, a state is 2 characters, and a county is
//! 5 characters whose first 2 are its state's code:
//!
//! ```text
//! ""      The United States
//! "42"    Pennsylvania
//! "42003" Allegheny County, Pennsylvania
//! ```

use crate::error::{DataError, DataResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level of geographic aggregation, ordered by specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Country,
    State,
    County,
}

impl Granularity {
    /// All granularities, least specific first.
    pub const ALL: [Granularity; 3] = [
        Granularity::Country,
        Granularity::State,
        Granularity::County,
    ];

    /// Number of FIPS characters identifying a region at this level.
    pub fn fips_len(&self) -> usize {
        match self {
            Granularity::Country => 0,
            Granularity::State => 2,
            Granularity::County => 5,
        }
    }

    /// Whether the time-series file for this level carries a `fips` column.
    pub fn has_fips_column(&self) -> bool {
        !matches!(self, Granularity::Country)
    }

    /// The granularity whose regions are identified by codes of `len` characters.
    pub fn from_fips_len(len: usize) -> DataResult<Self> {
        match len {
            0 => Ok(Granularity::Country),
            2 => Ok(Granularity::State),
            5 => Ok(Granularity::County),
            other => Err(DataError::Configuration(format!(
                "no granularity has {other}-character FIPS codes"
            ))),
        }
    }
}

impl TryFrom<usize> for Granularity {
    type Error = DataError;

    fn try_from(len: usize) -> DataResult<Self> {
        Self::from_fips_len(len)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Country => "country",
            Granularity::State => "state",
            Granularity::County => "county",
        };
        f.write_str(name)
    }
}

/// FIPS region code (e.g., "42" or "42003").
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fips(pub String);

impl Fips {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code of the whole country.
    pub fn country() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Granularity implied by the code's length.
    pub fn granularity(&self) -> DataResult<Granularity> {
        Granularity::from_fips_len(self.len())
    }

    /// Whether this region lies within the region identified by `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Code of the containing region at a coarser granularity.
    ///
    /// `"42003"` at `State` is `"42"`; any code at `Country` is `""`.
    /// Truncating to a finer granularity than the code has returns it unchanged.
    pub fn at_granularity(&self, granularity: Granularity) -> Fips {
        Fips(self.0.chars().take(granularity.fips_len()).collect())
    }
}

impl fmt::Display for Fips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Fips {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Fips {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Fips {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Data series shown on the maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Series {
    #[default]
    Cases,
    Deaths,
}

impl Series {
    /// CSV column holding this series.
    pub fn column(&self) -> &'static str {
        match self {
            Series::Cases => "cases",
            Series::Deaths => "deaths",
        }
    }

    /// Human-readable label, used for color bar and hover text.
    pub fn label(&self) -> &'static str {
        match self {
            Series::Cases => "Number of Cases",
            Series::Deaths => "Number of Deaths",
        }
    }
}

/// Normalized arguments of a time-series filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub granularity: Granularity,
    pub fips: Option<Fips>,
    pub date: Option<NaiveDate>,
}

impl FilterKey {
    pub fn new(granularity: Granularity, fips: Option<&str>, date: Option<NaiveDate>) -> Self {
        Self {
            granularity,
            fips: fips.map(Fips::from),
            date,
        }
    }

    /// Whether this key selects the whole table.
    pub fn is_identity(&self) -> bool {
        self.fips.is_none() && self.date.is_none()
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.granularity)?;
        if let Some(fips) = &self.fips {
            write!(f, "|fips={}", fips)?;
        }
        if let Some(date) = &self.date {
            write!(f, "|date={}", date)?;
        }
        Ok(())
    }
}
