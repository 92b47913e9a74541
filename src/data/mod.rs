//! Data modules containing the time-series, reference, and caching layers.
//!
//! ## Key Types
//! - `Granularity`: Country, state, or county level
//! - `Fips`: Region code; prefix encodes containment
//! - `TimeSeries`: Case/death rows of one granularity
//! - `FipsTable`: State names and postal abbreviations
//! - `DataStore`: Lazily loaded, memoized access to all of the above
//!
//! ### Cache Hierarchy
//! ```text
//! DataStore
//! ├── time_series          - one table per granularity, read once
//! ├── filtered_time_series - (granularity, fips, date) -> table
//! ├── boundaries           - one FeatureCollection per granularity, read once
//! ├── filtered_boundaries  - (granularity, fips) -> FeatureCollection
//! ├── fips_table           - reference table, read once
//! └── names / abbrs        - fips -> display string
//! ```

pub mod cache;
pub mod fips_table;
pub mod keys;
pub mod store;
pub mod time_series;

pub use fips_table::{FipsEntry, FipsTable};
pub use keys::*;
pub use store::{DataStore, Dataset, COUNTRY_NAME, UNKNOWN};
pub use time_series::{CovidRecord, TimeSeries};
