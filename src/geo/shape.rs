//! Conversion of GeoJSON geometries into `geo_types` shapes.

// Explicit crate path; `crate::geo` shares the name
use ::geo::Centroid;
use geo_types::{
    Coord, Geometry as GeoGeometry, GeometryCollection, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use geojson::{Feature, Geometry, Value};

fn coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn line(positions: &[Vec<f64>]) -> LineString<f64> {
    positions.iter().filter_map(|p| coord(p)).collect()
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon::new(
        line(exterior),
        holes.iter().map(|ring| line(ring)).collect(),
    ))
}

/// Converts a GeoJSON geometry into a `geo_types` geometry.
///
/// Returns `None` for empty polygons and positions with fewer than two
/// coordinates.
pub fn to_geo_geometry(geometry: &Geometry) -> Option<GeoGeometry<f64>> {
    let converted = match &geometry.value {
        Value::Point(position) => GeoGeometry::Point(Point::from(coord(position)?)),
        Value::MultiPoint(positions) => GeoGeometry::MultiPoint(MultiPoint::new(
            positions
                .iter()
                .filter_map(|p| coord(p).map(Point::from))
                .collect(),
        )),
        Value::LineString(positions) => GeoGeometry::LineString(line(positions)),
        Value::MultiLineString(lines) => GeoGeometry::MultiLineString(MultiLineString::new(
            lines.iter().map(|l| line(l)).collect(),
        )),
        Value::Polygon(rings) => GeoGeometry::Polygon(polygon(rings)?),
        Value::MultiPolygon(polygons) => GeoGeometry::MultiPolygon(MultiPolygon::new(
            polygons.iter().filter_map(|rings| polygon(rings)).collect(),
        )),
        Value::GeometryCollection(geometries) => {
            GeoGeometry::GeometryCollection(
                geometries
                    .iter()
                    .filter_map(to_geo_geometry)
                    .collect::<GeometryCollection<f64>>(),
            )
        }
    };
    Some(converted)
}

/// Centroid of a feature's geometry, as (longitude, latitude).
pub fn centroid(feature: &Feature) -> Option<Point<f64>> {
    feature
        .geometry
        .as_ref()
        .and_then(to_geo_geometry)
        .and_then(|g| g.centroid())
}
