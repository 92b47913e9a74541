//! Geographic boundary data.
//!
//! This module provides functionality for loading Census boundary files,
//! tagging each feature with its region's FIPS code, and computing feature
//! centroids.

mod boundaries;
mod shape;

pub use boundaries::{
    assign_region_ids, feature_id, feature_name, parse_feature_collection, read_boundaries,
    region_id, FeatureCollectionExt,
};
pub use shape::{centroid, to_geo_geometry};
