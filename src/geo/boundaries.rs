//! Census boundary files and region id assignment.
//!
//! The boundary files identify regions through their properties rather than
//! a feature id: states carry `STATE`, counties carry `STATE` and `COUNTY`.
//! On load each feature is given an id equal to its full FIPS code so that
//! time-series rows can be matched to shapes directly.

use super::shape;
use crate::config::TextEncoding;
use crate::error::{DataError, DataResult};
use geo_types::Point;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde_json::Value as JsonValue;
use std::path::Path;

fn property_str(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Region id for a feature's properties: state FIPS, or state FIPS followed
/// by county FIPS when a `COUNTY` property is present.
pub fn region_id(properties: &JsonObject) -> Option<String> {
    let state = property_str(properties, "STATE")?;
    if properties.contains_key("COUNTY") {
        let county = property_str(properties, "COUNTY")?;
        Some(format!("{state}{county}"))
    } else {
        Some(state)
    }
}

/// The id previously assigned to a feature.
pub fn feature_id(feature: &Feature) -> Option<&str> {
    match feature.id.as_ref()? {
        Id::String(s) => Some(s.as_str()),
        Id::Number(_) => None,
    }
}

/// The feature's `NAME` property.
pub fn feature_name(feature: &Feature) -> Option<&str> {
    feature
        .properties
        .as_ref()
        .and_then(|p| p.get("NAME"))
        .and_then(|v| v.as_str())
}

/// Assigns every feature its region id.
///
/// Features lacking a `STATE` property keep no id and never match a filter.
pub fn assign_region_ids(mut collection: FeatureCollection) -> FeatureCollection {
    let mut missing = 0usize;
    for feature in &mut collection.features {
        match feature.properties.as_ref().and_then(region_id) {
            Some(id) => feature.id = Some(Id::String(id)),
            None => missing += 1,
        }
    }
    if missing > 0 {
        log::debug!("{} boundary features have no STATE property", missing);
    }
    collection
}

/// Parses a GeoJSON document that must be a FeatureCollection.
pub fn parse_feature_collection(text: &str, path: &Path) -> DataResult<FeatureCollection> {
    let geojson: GeoJson = text.parse().map_err(|e| DataError::GeoJson {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(DataError::NotFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads a boundary file and assigns region ids.
pub fn read_boundaries(path: &Path, encoding: TextEncoding) -> DataResult<FeatureCollection> {
    let bytes = std::fs::read(path).map_err(|e| DataError::io(path, e))?;
    let text = encoding.decode(bytes).map_err(|e| {
        DataError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;
    let collection = parse_feature_collection(&text, path)?;
    Ok(assign_region_ids(collection))
}

/// Lookups on a collection whose features carry region ids.
pub trait FeatureCollectionExt {
    /// Copy of the collection restricted to features whose id starts with `prefix`.
    fn filter_by_prefix(&self, prefix: &str) -> FeatureCollection;

    /// The first feature whose id equals `id`.
    fn find_by_id(&self, id: &str) -> Option<&Feature>;

    /// Centroid of the feature whose id equals `id`.
    fn centroid_of(&self, id: &str) -> Option<Point<f64>> {
        self.find_by_id(id).and_then(shape::centroid)
    }

    /// Ids of all features, in file order.
    fn region_ids(&self) -> Vec<String>;
}

impl FeatureCollectionExt for FeatureCollection {
    fn filter_by_prefix(&self, prefix: &str) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .features
                .iter()
                .filter(|f| feature_id(f).is_some_and(|id| id.starts_with(prefix)))
                .cloned()
                .collect(),
            foreign_members: self.foreign_members.clone(),
        }
    }

    fn find_by_id(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| feature_id(f) == Some(id))
    }

    fn region_ids(&self) -> Vec<String> {
        self.features
            .iter()
            .filter_map(feature_id)
            .map(str::to_string)
            .collect()
    }
}
