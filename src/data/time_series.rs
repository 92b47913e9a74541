//! Case/death time series parsed from the NYT CSV files.

use crate::data::keys::{FilterKey, Fips, Granularity, Series};
use crate::error::{DataError, DataResult};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of a time-series file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CovidRecord {
    pub date: NaiveDate,
    /// Empty at country granularity.
    pub fips: Fips,
    pub cases: u64,
    /// Blank in the source for some territories.
    pub deaths: Option<u64>,
}

impl CovidRecord {
    pub fn new(date: NaiveDate, fips: impl Into<Fips>, cases: u64, deaths: u64) -> Self {
        Self {
            date,
            fips: fips.into(),
            cases,
            deaths: Some(deaths),
        }
    }

    /// Value of the given series, if the source recorded one.
    pub fn value(&self, series: Series) -> Option<u64> {
        match series {
            Series::Cases => Some(self.cases),
            Series::Deaths => self.deaths,
        }
    }
}

/// CSV row layout. Extra columns (`state`, `county`) are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    date: NaiveDate,
    #[serde(default)]
    fips: Option<String>,
    cases: u64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    deaths: Option<u64>,
}

/// All records of one granularity, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeries {
    granularity: Granularity,
    records: Vec<CovidRecord>,
}

impl TimeSeries {
    pub fn new(granularity: Granularity, records: Vec<CovidRecord>) -> Self {
        Self {
            granularity,
            records,
        }
    }

    /// Reads a time-series CSV file.
    pub fn read(path: &Path, granularity: Granularity) -> DataResult<Self> {
        let file = File::open(path).map_err(|e| DataError::io(path, e))?;
        Self::from_reader(file, granularity).map_err(|e| DataError::csv(path, e))
    }

    /// Parses time-series CSV from any reader.
    ///
    /// Rows whose FIPS code does not have the length implied by the
    /// granularity (e.g. NYT's "Unknown" county rows, which have no code)
    /// are skipped.
    pub fn from_reader<R: Read>(reader: R, granularity: Granularity) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for row in reader.deserialize::<RawRecord>() {
            let row = row?;
            let fips = if granularity.has_fips_column() {
                match row.fips {
                    Some(code) if code.chars().count() == granularity.fips_len() => Fips(code),
                    _ => {
                        skipped += 1;
                        continue;
                    }
                }
            } else {
                Fips::country()
            };

            records.push(CovidRecord {
                date: row.date,
                fips,
                cases: row.cases,
                deaths: row.deaths,
            });
        }

        if skipped > 0 {
            log::debug!(
                "Skipped {} {} rows without a valid FIPS code",
                skipped,
                granularity
            );
        }

        Ok(Self::new(granularity, records))
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn records(&self) -> &[CovidRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CovidRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the rows matching a filter key.
    ///
    /// The country file has no FIPS column, so a FIPS prefix is ignored there.
    pub fn filter(&self, key: &FilterKey) -> TimeSeries {
        let fips = key
            .fips
            .as_ref()
            .filter(|_| self.granularity.has_fips_column());

        let records = self
            .records
            .iter()
            .filter(|r| fips.map_or(true, |prefix| r.fips.starts_with(prefix.as_str())))
            .filter(|r| key.date.map_or(true, |date| r.date == date))
            .cloned()
            .collect();

        Self::new(self.granularity, records)
    }

    /// Sorted, de-duplicated region codes present in the table.
    pub fn fips_codes(&self) -> Vec<Fips> {
        self.records
            .iter()
            .map(|r| r.fips.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted, de-duplicated dates present in the table.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records
            .iter()
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Per-row region code and series value, skipping rows with no value.
    pub fn values(&self, series: Series) -> Vec<(Fips, u64)> {
        self.records
            .iter()
            .filter_map(|r| r.value(series).map(|v| (r.fips.clone(), v)))
            .collect()
    }

    /// Minimum and maximum of a series over the table.
    pub fn extent(&self, series: Series) -> Option<(u64, u64)> {
        self.records
            .iter()
            .filter_map(|r| r.value(series))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
