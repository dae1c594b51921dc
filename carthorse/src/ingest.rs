//! Raw trail readers (spec.md §6 Supplement: concrete input shapes).
//!
//! Upstream OSM/GPX ingestion is out of the core's scope; these adapters
//! turn a CSV or GeoJSON file on disk into the [`RawTrail`] stream the
//! Preparer consumes.

use std::path::Path;

use carthorse_core::pipeline::RawTrail;
use geojson::{FeatureCollection, GeoJson, Value as GeoJsonValue};

use crate::error::CarthorseError;

/// one row of the CSV input table: `id, source, external_id, region, name,
/// wkt_linestring_3d`.
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[allow(dead_code)]
    id: String,
    source: String,
    external_id: Option<String>,
    region: String,
    name: Option<String>,
    wkt_linestring_3d: String,
}

/// reads a CSV file of WKT-encoded 3D trail polylines into raw trails.
pub fn read_csv(path: &Path) -> Result<Vec<RawTrail>, CarthorseError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| CarthorseError::Csv { source })?;
    let mut raw_trails = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result.map_err(|source| CarthorseError::Csv { source })?;
        let points = parse_wkt_linestring_3d(&row.wkt_linestring_3d)?;
        raw_trails.push(RawTrail {
            external_id: row.external_id,
            source: row.source,
            region_key: row.region,
            name: row.name,
            points,
        });
    }
    Ok(raw_trails)
}

/// reads a GeoJSON `FeatureCollection` of 3D `LineString` features into raw
/// trails; `source`, `region`, `name`, `external_id` are read from each
/// feature's properties.
pub fn read_geojson(path: &Path) -> Result<Vec<RawTrail>, CarthorseError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CarthorseError::Io { source })?;
    let geojson: GeoJson = contents
        .parse::<GeoJson>()
        .map_err(|source| CarthorseError::GeoJson { source })?;
    let collection: FeatureCollection =
        FeatureCollection::try_from(geojson).map_err(|source| CarthorseError::GeoJson { source })?;

    let mut raw_trails = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let GeoJsonValue::LineString(coords) = &geometry.value else {
            continue;
        };
        let points: Vec<(f64, f64, f64)> = coords
            .iter()
            .map(|c| (c[0], c[1], c.get(2).copied().unwrap_or(0.0)))
            .collect();

        let properties = feature.properties.as_ref();
        let read_string = |key: &str| -> Option<String> {
            properties
                .and_then(|p| p.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        raw_trails.push(RawTrail {
            external_id: read_string("external_id"),
            source: read_string("source").unwrap_or_else(|| "geojson".to_string()),
            region_key: read_string("region").unwrap_or_default(),
            name: read_string("name"),
            points,
        });
    }
    Ok(raw_trails)
}

/// parses a `LINESTRING Z (x y z, ...)` WKT string into `(lng, lat,
/// elevation_m)` triples, defaulting elevation to 0 when the geometry is
/// only 2D.
fn parse_wkt_linestring_3d(raw: &str) -> Result<Vec<(f64, f64, f64)>, CarthorseError> {
    let parsed: wkt::Wkt<f64> = raw
        .parse()
        .map_err(|message: String| CarthorseError::InvalidGeometry { message })?;
    let wkt::Wkt::LineString(line) = parsed else {
        return Err(CarthorseError::InvalidGeometry {
            message: format!("expected a LINESTRING, found: {raw}"),
        });
    };
    Ok(line
        .0
        .iter()
        .map(|coord| (coord.x, coord.y, coord.z.unwrap_or(0.0)))
        .collect())
}
