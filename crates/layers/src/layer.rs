use std::rc::Rc;

use foundation::GeoBounds;
use serde_json::Value;

/// What a layer's payload is and how the map should draw it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    /// Raw OSM XML input.
    Osm,
    /// Graphviz rendering of the road network.
    Network,
    /// Plain GeoJSON geometry.
    Geometry,
    LanePolygons,
    LaneMarkings,
    IntersectionMarkings,
    /// Engine debug GeoJSON.
    Debug,
}

impl LayerKind {
    pub fn is_geojson(self) -> bool {
        !matches!(self, LayerKind::Osm | LayerKind::Network)
    }
}

/// A materialized layer payload.
///
/// Cloning is cheap; the payload text is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    kind: LayerKind,
    data: Rc<str>,
}

impl Layer {
    pub fn new(kind: LayerKind, data: impl Into<Rc<str>>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    pub fn osm(xml: impl Into<Rc<str>>) -> Self {
        Self::new(LayerKind::Osm, xml)
    }

    pub fn network(dot: impl Into<Rc<str>>) -> Self {
        Self::new(LayerKind::Network, dot)
    }

    pub fn geometry(geojson: impl Into<Rc<str>>) -> Self {
        Self::new(LayerKind::Geometry, geojson)
    }

    pub fn lane_polygons(geojson: impl Into<Rc<str>>) -> Self {
        Self::new(LayerKind::LanePolygons, geojson)
    }

    pub fn lane_markings(geojson: impl Into<Rc<str>>) -> Self {
        Self::new(LayerKind::LaneMarkings, geojson)
    }

    pub fn intersection_markings(geojson: impl Into<Rc<str>>) -> Self {
        Self::new(LayerKind::IntersectionMarkings, geojson)
    }

    pub fn debug(geojson: impl Into<Rc<str>>) -> Self {
        Self::new(LayerKind::Debug, geojson)
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Bounds of every coordinate in a GeoJSON payload.
    ///
    /// `None` for non-GeoJSON kinds, unparsable payloads, and documents without
    /// coordinates.
    pub fn bounds(&self) -> Option<GeoBounds> {
        if !self.kind.is_geojson() {
            return None;
        }
        geojson_bounds(&self.data).ok().flatten()
    }
}

/// Scans a GeoJSON document (any object type) for its coordinate bounds.
pub fn geojson_bounds(text: &str) -> Result<Option<GeoBounds>, serde_json::Error> {
    let doc: Value = serde_json::from_str(text)?;
    let mut out: Option<GeoBounds> = None;
    visit(&doc, &mut out);
    Ok(out)
}

fn visit(value: &Value, out: &mut Option<GeoBounds>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key == "coordinates" {
                    collect_positions(v, out);
                } else {
                    visit(v, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| visit(v, out)),
        _ => {}
    }
}

fn collect_positions(value: &Value, out: &mut Option<GeoBounds>) {
    let Value::Array(items) = value else {
        return;
    };
    // A position is [lon, lat, (alt)]; anything else is a nesting level.
    if let [Value::Number(lon), Value::Number(lat), ..] = items.as_slice() {
        if let (Some(lon), Some(lat)) = (lon.as_f64(), lat.as_f64()) {
            match out.as_mut() {
                Some(b) => b.extend(lon, lat),
                None => *out = Some(GeoBounds::point(lon, lat)),
            }
        }
        return;
    }
    items.iter().for_each(|v| collect_positions(v, out));
}
