#![warn(clippy::all)]

//! COVID-19 Explorer data layer.
//!
//! Loads the New York Times U.S. COVID-19 case/death time series and the
//! Census Bureau state/county boundary files, and serves filtered, cached
//! views of them to a dashboard that renders choropleth maps and line
//! charts at country, state, and county granularity.
//!
//! ```no_run
//! use covid_explorer_data::{DataConfig, DataStore, Granularity};
//!
//! let store = DataStore::new(DataConfig::default().with_data_dir("data"));
//! let rows = store.filter_time_series(Granularity::County, Some("42"), None)?;
//! let name = store.fips_name("42003")?;
//! # Ok::<(), covid_explorer_data::DataError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod geo;

pub use config::{DataConfig, TextEncoding};
pub use data::{
    CovidRecord, DataStore, Dataset, FilterKey, Fips, FipsEntry, FipsTable, Granularity, Series,
    TimeSeries,
};
pub use error::{DataError, DataResult};
