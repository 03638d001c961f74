//! Feature records parsed from WFS responses.

use geo_types::{Coord, LineString, MultiPolygon, Polygon, Rect};
use geojson::{Feature, GeoJson, Geometry, Value};

/// Polygonal outline of an aquifer.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryGeometry {
    pub polygons: MultiPolygon<f64>,
}

impl BoundaryGeometry {
    /// Bounding rectangle of all exterior rings, or `None` if empty.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let mut coords = self
            .polygons
            .iter()
            .flat_map(|p| p.exterior().coords().copied());
        let first = coords.next()?;
        let (min, max) = coords.fold((first, first), |(min, max), c| {
            (
                Coord {
                    x: min.x.min(c.x),
                    y: min.y.min(c.y),
                },
                Coord {
                    x: max.x.max(c.x),
                    y: max.y.max(c.y),
                },
            )
        });
        Some(Rect::new(min, max))
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.0.is_empty()
    }
}

/// A monitoring well as returned by the feature server.
#[derive(Debug, Clone, PartialEq)]
pub struct WellFeature {
    /// Feature identifier, e.g. `well.42`.
    pub id: String,
    pub location: Coord<f64>,
    /// Attribute name/value pairs in server order.
    pub attributes: Vec<(String, String)>,
}

/// Parses a GeoJSON document into its features.
///
/// A bare feature or geometry is treated as a one-element collection.
pub(crate) fn features_of(document: &str) -> Result<Vec<Feature>, geojson::Error> {
    let geojson: GeoJson = document.parse()?;
    Ok(match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    })
}

/// Renders a feature id (string or number) as text.
pub(crate) fn feature_id(feature: &Feature) -> Option<String> {
    match feature.id.as_ref()? {
        geojson::feature::Id::String(s) => Some(s.clone()),
        geojson::feature::Id::Number(n) => Some(n.to_string()),
    }
}

/// Attribute pairs in the order the server sent them.
pub(crate) fn attributes_of(feature: &Feature) -> Vec<(String, String)> {
    feature
        .properties
        .as_ref()
        .map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.clone(), display_value(v)))
                .collect()
        })
        .unwrap_or_default()
}

/// Renders a JSON value the way it reads in a popup: strings unquoted.
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn to_ring(positions: &[Vec<f64>]) -> LineString<f64> {
    positions.iter().filter_map(|p| to_coord(p)).collect()
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon::new(
        to_ring(exterior),
        holes.iter().map(|ring| to_ring(ring)).collect(),
    ))
}

/// Collects the polygons of a geometry; non-polygonal geometries yield none.
pub(crate) fn polygons_of(geometry: &Geometry) -> Vec<Polygon<f64>> {
    match &geometry.value {
        Value::Polygon(rings) => to_polygon(rings).into_iter().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().filter_map(|p| to_polygon(p)).collect(),
        Value::GeometryCollection(geometries) => {
            geometries.iter().flat_map(polygons_of).collect()
        }
        _ => Vec::new(),
    }
}

/// The representative point of a geometry (first point of a multipoint).
pub(crate) fn point_of(geometry: &Geometry) -> Option<Coord<f64>> {
    match &geometry.value {
        Value::Point(position) => to_coord(position),
        Value::MultiPoint(points) => points.first().and_then(|p| to_coord(p)),
        Value::GeometryCollection(geometries) => geometries.iter().find_map(point_of),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_cover_all_polygons() {
        let doc = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[2,0],[2,1],[0,0]]],
            [[[-1,-3],[1,-3],[1,4],[-1,-3]]]
        ]}"#;
        let features = features_of(doc).unwrap();
        let geometry = features[0].geometry.as_ref().unwrap();
        let boundary = BoundaryGeometry {
            polygons: MultiPolygon(polygons_of(geometry)),
        };

        let bounds = boundary.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: -1.0, y: -3.0 });
        assert_eq!(bounds.max(), Coord { x: 2.0, y: 4.0 });
    }

    #[test]
    fn test_empty_boundary_has_no_bounds() {
        let boundary = BoundaryGeometry {
            polygons: MultiPolygon(Vec::new()),
        };
        assert!(boundary.is_empty());
        assert!(boundary.bounds().is_none());
    }

    #[test]
    fn test_attribute_values_render_unquoted() {
        assert_eq!(display_value(&serde_json::json!("120ft")), "120ft");
        assert_eq!(display_value(&serde_json::json!(12.5)), "12.5");
        assert_eq!(display_value(&serde_json::Value::Null), "null");
    }
}
