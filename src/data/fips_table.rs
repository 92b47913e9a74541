//! State FIPS reference table (name and postal abbreviation per code).

use crate::data::keys::Fips;
use crate::error::{DataError, DataResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One state in the reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FipsEntry {
    pub name: String,
    pub fips: Fips,
    pub abbr: String,
}

/// Lookup table from state FIPS code to name and abbreviation.
#[derive(Debug, Clone, Default)]
pub struct FipsTable {
    entries: Vec<FipsEntry>,
    index: HashMap<Fips, usize>,
}

impl FipsTable {
    pub fn new(entries: Vec<FipsEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            // First occurrence wins
            index.entry(entry.fips.clone()).or_insert(i);
        }
        Self { entries, index }
    }

    /// Reads the reference CSV.
    pub fn read(path: &Path) -> DataResult<Self> {
        let file = File::open(path).map_err(|e| DataError::io(path, e))?;
        Self::from_reader(file).map_err(|e| DataError::csv(path, e))
    }

    /// Parses `name, fips, abbr` rows by position; the header row is skipped
    /// whatever its column names are.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for row in reader.records() {
            let (name, fips, abbr): (String, String, String) = row?.deserialize(None)?;
            entries.push(FipsEntry {
                name,
                fips: Fips(fips),
                abbr,
            });
        }

        Ok(Self::new(entries))
    }

    pub fn get(&self, fips: &str) -> Option<&FipsEntry> {
        self.index
            .get(&Fips::from(fips))
            .map(|&i| &self.entries[i])
    }

    pub fn name(&self, fips: &str) -> Option<&str> {
        self.get(fips).map(|e| e.name.as_str())
    }

    pub fn abbr(&self, fips: &str) -> Option<&str> {
        self.get(fips).map(|e| e.abbr.as_str())
    }

    /// All codes in the table, sorted.
    pub fn codes(&self) -> Vec<Fips> {
        let mut codes: Vec<Fips> = self.index.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn entries(&self) -> &[FipsEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
