//! Data store that loads, caches, and filters the explorer's datasets.
//!
//! Every operation is a pure function of its arguments and the files named
//! by the store's `DataConfig`. Files are read lazily on first use and kept
//! for the lifetime of the store; filtered views are memoized on their
//! normalized arguments.
//!
//! ## Datasets
//!
//! ```text
//! data/
//! ├── us.csv, us-states.csv, us-counties.csv   - time series per granularity
//! ├── gz_2010_us_040_00_20m.json               - state boundaries
//! ├── gz_2010_us_050_00_20m.json               - county boundaries
//! └── us-state-ansi-fips.csv                   - state names/abbreviations
//! ```
//!
//! ## Lookup Misses
//!
//! An unknown FIPS code is not an error: names and abbreviations resolve to
//! `"Unknown"` so a view can keep rendering with incomplete reference data.

use crate::config::DataConfig;
use crate::data::cache::MemoCache;
use crate::data::fips_table::FipsTable;
use crate::data::keys::*;
use crate::data::time_series::TimeSeries;
use crate::error::{DataError, DataResult};
use crate::geo::{self, FeatureCollectionExt};
use chrono::NaiveDate;
use geo_types::Point;
use geojson::FeatureCollection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Display name of the empty (country) FIPS code.
pub const COUNTRY_NAME: &str = "The United States";

/// Sentinel for codes missing from the reference data.
pub const UNKNOWN: &str = "Unknown";

/// A file-backed dataset, for load accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    TimeSeries(Granularity),
    Boundaries(Granularity),
    FipsTable,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::TimeSeries(g) => write!(f, "{} time series", g),
            Dataset::Boundaries(g) => write!(f, "{} boundaries", g),
            Dataset::FipsTable => write!(f, "FIPS table"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GeoFilterKey {
    granularity: Granularity,
    fips: Fips,
}

impl fmt::Display for GeoFilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|fips={}", self.granularity, self.fips)
    }
}

/// Cached, read-only access to time series, boundaries, and FIPS names.
///
/// The store is single-threaded (`!Sync`); share it by reference within
/// one thread.
pub struct DataStore {
    config: DataConfig,
    time_series: MemoCache<Granularity, TimeSeries>,
    filtered_time_series: MemoCache<FilterKey, TimeSeries>,
    boundaries: MemoCache<Granularity, FeatureCollection>,
    filtered_boundaries: MemoCache<GeoFilterKey, FeatureCollection>,
    fips_table: MemoCache<Dataset, FipsTable>,
    names: MemoCache<Fips, String>,
    abbrs: MemoCache<Fips, String>,
    loads: RefCell<HashMap<Dataset, usize>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(DataConfig::default())
    }
}

impl DataStore {
    pub fn new(config: DataConfig) -> Self {
        Self {
            config,
            time_series: MemoCache::new("time series"),
            filtered_time_series: MemoCache::new("filtered time series"),
            boundaries: MemoCache::new("boundaries"),
            filtered_boundaries: MemoCache::new("filtered boundaries"),
            fips_table: MemoCache::new("FIPS table"),
            names: MemoCache::new("FIPS name"),
            abbrs: MemoCache::new("state abbreviation"),
            loads: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Number of times a dataset's file has actually been read.
    pub fn load_count(&self, dataset: Dataset) -> usize {
        self.loads.borrow().get(&dataset).copied().unwrap_or(0)
    }

    fn record_load(&self, dataset: Dataset) {
        *self.loads.borrow_mut().entry(dataset).or_insert(0) += 1;
    }

    // ========================================================================
    // Time series
    // ========================================================================

    /// Full time series for a granularity, read on first use.
    pub fn load_time_series(&self, granularity: Granularity) -> DataResult<Rc<TimeSeries>> {
        self.time_series.get_or_try_insert_with(&granularity, || {
            let path = self.config.time_series_path(granularity);
            self.record_load(Dataset::TimeSeries(granularity));
            let table = TimeSeries::read(&path, granularity)?;
            log::info!(
                "Loaded {} {} rows from {}",
                table.len(),
                granularity,
                path.display()
            );
            Ok(table)
        })
    }

    /// Rows whose FIPS code starts with `fips` and whose date equals `date`.
    ///
    /// Absent filters pass every row, and with neither filter the cached
    /// table itself is returned. The country file has no FIPS column, so a
    /// FIPS filter is ignored at that granularity.
    pub fn filter_time_series(
        &self,
        granularity: Granularity,
        fips: Option<&str>,
        date: Option<NaiveDate>,
    ) -> DataResult<Rc<TimeSeries>> {
        let fips = fips.filter(|_| granularity.has_fips_column());
        let key = FilterKey::new(granularity, fips, date);
        if key.is_identity() {
            return self.load_time_series(granularity);
        }

        self.filtered_time_series.get_or_try_insert_with(&key, || {
            let table = self.load_time_series(granularity)?;
            Ok(table.filter(&key))
        })
    }

    /// Sorted county codes reported for a state on a date.
    pub fn county_fips_codes(&self, state_fips: &str, date: NaiveDate) -> DataResult<Vec<Fips>> {
        let table = self.filter_time_series(Granularity::County, Some(state_fips), Some(date))?;
        Ok(table.fips_codes())
    }

    /// Region code and value of a series for every matching row.
    pub fn series_values(
        &self,
        granularity: Granularity,
        fips: Option<&str>,
        date: Option<NaiveDate>,
        series: Series,
    ) -> DataResult<Vec<(Fips, u64)>> {
        let table = self.filter_time_series(granularity, fips, date)?;
        Ok(table.values(series))
    }

    /// Minimum and maximum of a series over the matching rows.
    pub fn series_extent(
        &self,
        granularity: Granularity,
        fips: Option<&str>,
        date: Option<NaiveDate>,
        series: Series,
    ) -> DataResult<Option<(u64, u64)>> {
        let table = self.filter_time_series(granularity, fips, date)?;
        Ok(table.extent(series))
    }

    // ========================================================================
    // Boundaries
    // ========================================================================

    /// Boundary features for a granularity, each with its region id assigned.
    ///
    /// Fails with a configuration error at country granularity, which has no
    /// boundary file.
    pub fn load_geo_data(&self, granularity: Granularity) -> DataResult<Rc<FeatureCollection>> {
        let path = self.config.geo_path(granularity)?;
        self.boundaries.get_or_try_insert_with(&granularity, || {
            self.record_load(Dataset::Boundaries(granularity));
            let collection = geo::read_boundaries(&path, self.config.geo_encoding)?;
            log::info!(
                "Loaded {} {} boundaries from {}",
                collection.features.len(),
                granularity,
                path.display()
            );
            Ok(collection)
        })
    }

    /// Boundary features whose region id starts with `fips`.
    pub fn filter_geo_data(
        &self,
        granularity: Granularity,
        fips: &str,
    ) -> DataResult<Rc<FeatureCollection>> {
        let key = GeoFilterKey {
            granularity,
            fips: Fips::from(fips),
        };
        self.filtered_boundaries.get_or_try_insert_with(&key, || {
            let collection = self.load_geo_data(granularity)?;
            Ok(collection.filter_by_prefix(fips))
        })
    }

    /// Centroid (longitude, latitude) of a region's boundary.
    pub fn region_centroid(&self, fips: &str) -> DataResult<Option<Point<f64>>> {
        let granularity = Granularity::from_fips_len(fips.chars().count())?;
        let collection = self.load_geo_data(granularity)?;
        Ok(collection.centroid_of(fips))
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// State reference table, read on first use.
    pub fn load_fips_table(&self) -> DataResult<Rc<FipsTable>> {
        self.fips_table
            .get_or_try_insert_with(&Dataset::FipsTable, || {
                let path = self.config.fips_path();
                self.record_load(Dataset::FipsTable);
                let table = FipsTable::read(&path)?;
                log::info!("Loaded {} FIPS entries from {}", table.len(), path.display());
                Ok(table)
            })
    }

    /// Every state code in the reference table, sorted.
    pub fn state_fips_codes(&self) -> DataResult<Vec<Fips>> {
        Ok(self.load_fips_table()?.codes())
    }

    /// Display name of a region.
    ///
    /// - `""`: "The United States"
    /// - 2 characters: the state's name, or "Unknown"
    /// - 5 characters: "<county>, <state>", with "Unknown" for either part
    ///   that has no match
    ///
    /// Codes of any other length match no granularity and are rejected.
    pub fn fips_name(&self, fips: &str) -> DataResult<String> {
        let key = Fips::from(fips);
        let name = self.names.get_or_try_insert_with(&key, || -> DataResult<String> {
            match key.granularity()? {
                Granularity::Country => Ok(COUNTRY_NAME.to_string()),
                Granularity::State => Ok(self
                    .load_fips_table()?
                    .name(fips)
                    .unwrap_or(UNKNOWN)
                    .to_string()),
                Granularity::County => {
                    let county = self.county_name(fips)?;
                    let state = self.fips_name(key.at_granularity(Granularity::State).as_str())?;
                    Ok(format!(
                        "{}, {}",
                        county.as_deref().unwrap_or(UNKNOWN),
                        state
                    ))
                }
            }
        })?;
        Ok(name.to_string())
    }

    /// `NAME` property of the county boundary whose id equals `fips`.
    pub fn county_name(&self, fips: &str) -> DataResult<Option<String>> {
        let counties = self.load_geo_data(Granularity::County)?;
        Ok(counties
            .find_by_id(fips)
            .and_then(geo::feature_name)
            .map(str::to_string))
    }

    /// Postal abbreviation of a state, or "Unknown".
    pub fn state_abbr(&self, fips: &str) -> DataResult<String> {
        let abbr = self.abbrs.get_or_try_insert_with(&Fips::from(fips), || {
            Ok::<_, DataError>(
                self.load_fips_table()?
                    .abbr(fips)
                    .unwrap_or(UNKNOWN)
                    .to_string(),
            )
        })?;
        Ok(abbr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextEncoding;
    use std::path::Path;
    use tempfile::TempDir;

    const US: &str = "\
date,cases,deaths
2020-09-26,7000000,203000
2020-09-27,7040000,204000
";

    const STATES: &str = "\
date,state,fips,cases,deaths
2020-09-27,Alabama,01,152000,2500
2020-09-27,Alaska,02,7400,48
2020-09-26,Pennsylvania,42,161000,8100
2020-09-27,Pennsylvania,42,162000,8120
";

    const COUNTIES: &str = "\
date,county,state,fips,cases,deaths
2020-09-27,Autauga,Alabama,01001,1800,27
2020-09-27,Aleutians West,Alaska,02016,50,0
2020-09-26,Allegheny,Pennsylvania,42003,98,5
2020-09-27,Allegheny,Pennsylvania,42003,100,5
2020-09-27,Adams,Pennsylvania,42001,40,1
2020-09-27,Unknown,Pennsylvania,,7,0
";

    const FIPS: &str = "\
stname,st,stusps
Alabama,01,AL
Alaska,02,AK
Pennsylvania,42,PA
";

    const STATE_GEO: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"STATE": "01", "NAME": "Alabama"},
         "geometry": {"type": "Polygon", "coordinates": [[[-88,30],[-85,30],[-85,35],[-88,35],[-88,30]]]}},
        {"type": "Feature", "properties": {"STATE": "02", "NAME": "Alaska"},
         "geometry": {"type": "Polygon", "coordinates": [[[-170,55],[-140,55],[-140,70],[-170,70],[-170,55]]]}},
        {"type": "Feature", "properties": {"STATE": "42", "NAME": "Pennsylvania"},
         "geometry": {"type": "Polygon", "coordinates": [[[-80,40],[-75,40],[-75,42],[-80,42],[-80,40]]]}}
    ]}"#;

    const COUNTY_GEO: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"STATE": "01", "COUNTY": "001", "NAME": "Autauga"},
         "geometry": null},
        {"type": "Feature", "properties": {"STATE": "02", "COUNTY": "016", "NAME": "Aleutians West"},
         "geometry": null},
        {"type": "Feature", "properties": {"STATE": "42", "COUNTY": "003", "NAME": "Allegheny"},
         "geometry": {"type": "Polygon", "coordinates": [[[-80,40],[-79,40],[-79,41],[-80,41],[-80,40]]]}},
        {"type": "Feature", "properties": {"STATE": "42", "COUNTY": "001", "NAME": "Adams"},
         "geometry": null}
    ]}"#;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn fixture() -> (TempDir, DataStore) {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::default().with_data_dir(dir.path());
        write(dir.path(), &config.country_csv, US);
        write(dir.path(), &config.state_csv, STATES);
        write(dir.path(), &config.county_csv, COUNTIES);
        write(dir.path(), &config.fips_csv, FIPS);
        write(dir.path(), &config.state_geojson, STATE_GEO);
        write(dir.path(), &config.county_geojson, COUNTY_GEO);
        (dir, DataStore::new(config))
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_end_to_end_county_row_and_name() {
        let (_dir, store) = fixture();
        let rows = store
            .filter_time_series(Granularity::County, Some("42003"), Some(date("2020-09-27")))
            .unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows.records()[0];
        assert_eq!(row.fips.as_str(), "42003");
        assert_eq!(row.cases, 100);
        assert_eq!(row.deaths, Some(5));

        assert_eq!(store.fips_name("42003").unwrap(), "Allegheny, Pennsylvania");
    }

    #[test]
    fn test_filter_rows_start_with_prefix() {
        let (_dir, store) = fixture();
        for granularity in [Granularity::State, Granularity::County] {
            for prefix in ["", "0", "01", "42", "42003", "99"] {
                let rows = store
                    .filter_time_series(granularity, Some(prefix), None)
                    .unwrap();
                assert!(rows.iter().all(|r| r.fips.starts_with(prefix)));
            }
        }
        let pa = store
            .filter_time_series(Granularity::County, Some("42"), None)
            .unwrap();
        assert_eq!(pa.len(), 3);
    }

    #[test]
    fn test_unfiltered_is_cached_table() {
        let (_dir, store) = fixture();
        for granularity in Granularity::ALL {
            let full = store.load_time_series(granularity).unwrap();
            let unfiltered = store.filter_time_series(granularity, None, None).unwrap();
            assert!(Rc::ptr_eq(&full, &unfiltered));
        }
    }

    #[test]
    fn test_country_ignores_fips_filter() {
        let (_dir, store) = fixture();
        let rows = store
            .filter_time_series(Granularity::Country, Some("42"), Some(date("2020-09-27")))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.records()[0].cases, 7_040_000);
    }

    #[test]
    fn test_filter_is_memoized() {
        let (_dir, store) = fixture();
        let a = store
            .filter_time_series(Granularity::State, Some("42"), Some(date("2020-09-27")))
            .unwrap();
        let b = store
            .filter_time_series(Granularity::State, Some("42"), Some(date("2020-09-27")))
            .unwrap();
        assert!(Rc::ptr_eq(&a, &b));

        let g1 = store.filter_geo_data(Granularity::County, "42").unwrap();
        let g2 = store.filter_geo_data(Granularity::County, "42").unwrap();
        assert!(Rc::ptr_eq(&g1, &g2));
    }

    #[test]
    fn test_loads_read_each_file_once() {
        let (_dir, store) = fixture();
        for _ in 0..3 {
            store.load_time_series(Granularity::County).unwrap();
            store.load_geo_data(Granularity::State).unwrap();
            store.load_fips_table().unwrap();
            store.fips_name("42003").unwrap();
            store.state_abbr("42").unwrap();
            store
                .filter_time_series(Granularity::County, Some("42"), None)
                .unwrap();
        }
        assert_eq!(store.load_count(Dataset::TimeSeries(Granularity::County)), 1);
        assert_eq!(store.load_count(Dataset::Boundaries(Granularity::State)), 1);
        assert_eq!(store.load_count(Dataset::Boundaries(Granularity::County)), 1);
        assert_eq!(store.load_count(Dataset::FipsTable), 1);
        assert_eq!(store.load_count(Dataset::TimeSeries(Granularity::State)), 0);
    }

    #[test]
    fn test_cached_data_survives_file_removal() {
        let (dir, store) = fixture();
        let before = store.load_time_series(Granularity::State).unwrap();
        std::fs::remove_file(dir.path().join(&store.config().state_csv)).unwrap();
        let after = store.load_time_series(Granularity::State).unwrap();
        assert!(Rc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_filter_geo_data() {
        let (_dir, store) = fixture();
        let alaska = store.filter_geo_data(Granularity::State, "02").unwrap();
        assert_eq!(alaska.region_ids(), vec!["02"]);
        assert_eq!(geo::feature_name(&alaska.features[0]), Some("Alaska"));

        let aleutians = store.filter_geo_data(Granularity::County, "02016").unwrap();
        assert!(aleutians.features.len() <= 1);
        assert!(aleutians.region_ids().iter().all(|id| id == "02016"));

        let pa = store.filter_geo_data(Granularity::County, "42").unwrap();
        assert_eq!(pa.region_ids(), vec!["42003", "42001"]);
    }

    #[test]
    fn test_country_geo_data_is_configuration_error() {
        let (_dir, store) = fixture();
        assert!(store
            .load_geo_data(Granularity::Country)
            .unwrap_err()
            .is_configuration());
        assert!(store
            .filter_geo_data(Granularity::Country, "")
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_fips_names() {
        let (_dir, store) = fixture();
        assert_eq!(store.fips_name("").unwrap(), "The United States");
        assert_eq!(store.fips_name("01").unwrap(), "Alabama");
        assert_eq!(store.fips_name("99").unwrap(), "Unknown");
        assert_eq!(store.fips_name("02016").unwrap(), "Aleutians West, Alaska");
        assert_eq!(store.fips_name("42999").unwrap(), "Unknown, Pennsylvania");
        assert!(store.fips_name("420").unwrap_err().is_configuration());
    }

    #[test]
    fn test_county_name_matches_state_name() {
        let (_dir, store) = fixture();
        for code in store.load_time_series(Granularity::County).unwrap().fips_codes() {
            let county = store.county_name(code.as_str()).unwrap().unwrap();
            let state = store
                .fips_name(code.at_granularity(Granularity::State).as_str())
                .unwrap();
            assert_eq!(
                store.fips_name(code.as_str()).unwrap(),
                format!("{}, {}", county, state)
            );
        }
    }

    #[test]
    fn test_state_abbr() {
        let (_dir, store) = fixture();
        assert_eq!(store.state_abbr("42").unwrap(), "PA");
        assert_eq!(store.state_abbr("99").unwrap(), "Unknown");
    }

    #[test]
    fn test_selector_lists() {
        let (_dir, store) = fixture();
        let states: Vec<_> = store
            .state_fips_codes()
            .unwrap()
            .into_iter()
            .map(|f| f.0)
            .collect();
        assert_eq!(states, vec!["01", "02", "42"]);

        let counties: Vec<_> = store
            .county_fips_codes("42", date("2020-09-27"))
            .unwrap()
            .into_iter()
            .map(|f| f.0)
            .collect();
        assert_eq!(counties, vec!["42001", "42003"]);
    }

    #[test]
    fn test_series_values_and_extent() {
        let (_dir, store) = fixture();
        let day = Some(date("2020-09-27"));
        let values = store
            .series_values(Granularity::State, None, day, Series::Deaths)
            .unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.contains(&(Fips::from("02"), 48)));

        assert_eq!(
            store
                .series_extent(Granularity::State, None, day, Series::Cases)
                .unwrap(),
            Some((7400, 162000))
        );
        assert_eq!(
            store
                .series_extent(Granularity::State, Some("99"), day, Series::Cases)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_region_centroid() {
        let (_dir, store) = fixture();
        let pa = store.region_centroid("42").unwrap().unwrap();
        assert!((pa.x() + 77.5).abs() < 1e-9);
        assert!((pa.y() - 41.0).abs() < 1e-9);

        assert!(store.region_centroid("01001").unwrap().is_none());
        assert!(store.region_centroid("").unwrap_err().is_configuration());
    }

    #[test]
    fn test_missing_file_is_io_error_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(DataConfig::default().with_data_dir(dir.path()));
        assert!(store
            .load_time_series(Granularity::State)
            .unwrap_err()
            .is_io());
        assert!(store.fips_name("42").unwrap_err().is_io());

        write(dir.path(), &store.config().state_csv, STATES);
        assert_eq!(store.load_time_series(Granularity::State).unwrap().len(), 4);
        assert_eq!(store.load_count(Dataset::TimeSeries(Granularity::State)), 2);
    }

    #[test]
    fn test_malformed_csv() {
        let (dir, store) = fixture();
        write(
            dir.path(),
            &store.config().state_csv,
            "date,fips,cases,deaths\n2020-09-27,42,lots,1\n",
        );
        assert!(matches!(
            store.load_time_series(Granularity::State),
            Err(DataError::Csv { .. })
        ));
    }

    #[test]
    fn test_utf8_boundaries() {
        let (dir, _) = fixture();
        let config = DataConfig::default()
            .with_data_dir(dir.path())
            .with_geo_encoding(TextEncoding::Utf8);
        let store = DataStore::new(config);
        assert_eq!(store.load_geo_data(Granularity::State).unwrap().features.len(), 3);
    }
}
