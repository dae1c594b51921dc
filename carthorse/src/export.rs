//! Writes the final `trails`, `vertices`, `edges`, `routes` tables to a
//! single SQLite database plus a GeoJSON sidecar per table (spec.md §6
//! Supplement: concrete output shapes).

use std::path::Path;

use carthorse_core::workspace::Workspace;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use rusqlite::Connection;
use serde_json::{json, Map};

use crate::error::CarthorseError;

/// opens (or creates) `carthorse.db` in `output_dir`, writes all four
/// tables, then writes the GeoJSON sidecars alongside it.
pub fn write_all(workspace: &Workspace, output_dir: &Path) -> Result<(), CarthorseError> {
    std::fs::create_dir_all(output_dir)?;

    let conn = Connection::open(output_dir.join("carthorse.db"))?;
    write_schema(&conn)?;
    write_trails_table(&conn, workspace)?;
    write_graph_tables(&conn, workspace)?;
    write_routes_table(&conn, workspace)?;

    write_trails_geojson(workspace, &output_dir.join("trails.geojson"))?;
    write_edges_geojson(workspace, &output_dir.join("edges.geojson"))?;
    write_vertices_geojson(workspace, &output_dir.join("vertices.geojson"))?;
    write_routes_geojson(workspace, &output_dir.join("routes.geojson"))?;

    Ok(())
}

fn write_schema(conn: &Connection) -> Result<(), CarthorseError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS trails (
             trail_id        TEXT PRIMARY KEY,
             parent_id       TEXT,
             external_id     TEXT,
             origin          TEXT NOT NULL,
             region_key      TEXT NOT NULL,
             name            TEXT NOT NULL,
             length_km       REAL NOT NULL,
             elevation_gain_m REAL NOT NULL,
             elevation_loss_m REAL NOT NULL,
             geometry_wkt    TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS vertices (
             vertex_id      INTEGER PRIMARY KEY,
             lng            REAL NOT NULL,
             lat            REAL NOT NULL,
             elevation_m    REAL NOT NULL,
             degree         INTEGER NOT NULL,
             classification TEXT
         );
         CREATE TABLE IF NOT EXISTS edges (
             edge_id                   INTEGER PRIMARY KEY,
             source_vertex_id          INTEGER NOT NULL,
             target_vertex_id          INTEGER NOT NULL,
             length_km                 REAL NOT NULL,
             elevation_gain_m          REAL NOT NULL,
             elevation_loss_m          REAL NOT NULL,
             originating_trail_id      TEXT NOT NULL,
             originating_trail_name    TEXT NOT NULL,
             geometry_wkt              TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS routes (
             route_id               INTEGER PRIMARY KEY,
             shape                  TEXT NOT NULL,
             anchor_vertex_id       INTEGER NOT NULL,
             total_distance_km      REAL NOT NULL,
             total_elevation_gain_m REAL NOT NULL,
             similarity             REAL NOT NULL,
             trail_names_json       TEXT NOT NULL,
             edge_ids_json          TEXT NOT NULL
         );",
    )?;
    Ok(())
}

fn write_trails_table(conn: &Connection, workspace: &Workspace) -> Result<(), CarthorseError> {
    use wkt::ToWkt;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO trails
         (trail_id, parent_id, external_id, origin, region_key, name, length_km,
          elevation_gain_m, elevation_loss_m, geometry_wkt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for trail in workspace.trails() {
        stmt.execute(rusqlite::params![
            trail.trail_id.to_string(),
            trail.parent_id.map(|id| id.to_string()),
            trail.external_id,
            format!("{:?}", trail.origin),
            trail.region_key,
            trail.name,
            trail.length_km,
            trail.elevation.gain_m,
            trail.elevation.loss_m,
            trail.geometry.wkt_string(),
        ])?;
    }
    Ok(())
}

fn write_graph_tables(conn: &Connection, workspace: &Workspace) -> Result<(), CarthorseError> {
    use wkt::ToWkt;

    let Some(graph) = workspace.graph() else {
        return Ok(());
    };

    let mut vertex_stmt = conn.prepare_cached(
        "INSERT INTO vertices (vertex_id, lng, lat, elevation_m, degree, classification)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for vertex in graph.vertices_iter() {
        vertex_stmt.execute(rusqlite::params![
            vertex.vertex_id.as_usize() as i64,
            vertex.x(),
            vertex.y(),
            vertex.elevation_m,
            vertex.degree as i64,
            vertex.classification.map(|c| format!("{c:?}")),
        ])?;
    }

    let mut edge_stmt = conn.prepare_cached(
        "INSERT INTO edges
         (edge_id, source_vertex_id, target_vertex_id, length_km, elevation_gain_m,
          elevation_loss_m, originating_trail_id, originating_trail_name, geometry_wkt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for edge in graph.edges_iter() {
        edge_stmt.execute(rusqlite::params![
            edge.edge_id.as_usize() as i64,
            edge.source.as_usize() as i64,
            edge.target.as_usize() as i64,
            edge.length_km,
            edge.elevation_gain_m,
            edge.elevation_loss_m,
            edge.originating_trail_id.to_string(),
            edge.originating_trail_name,
            edge.geometry.wkt_string(),
        ])?;
    }
    Ok(())
}

fn write_routes_table(conn: &Connection, workspace: &Workspace) -> Result<(), CarthorseError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO routes
         (route_id, shape, anchor_vertex_id, total_distance_km, total_elevation_gain_m,
          similarity, trail_names_json, edge_ids_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for route in workspace.routes() {
        let edge_ids: Vec<usize> = route.edge_ids.iter().map(|id| id.as_usize()).collect();
        stmt.execute(rusqlite::params![
            route.route_id as i64,
            format!("{:?}", route.shape),
            route.anchor_vertex.as_usize() as i64,
            route.total_distance_km,
            route.total_elevation_gain_m,
            route.similarity,
            serde_json::to_string(&route.trail_names)?,
            serde_json::to_string(&edge_ids)?,
        ])?;
    }
    Ok(())
}

fn write_trails_geojson(workspace: &Workspace, path: &Path) -> Result<(), CarthorseError> {
    let features = workspace
        .trails()
        .map(|trail| {
            let coords: Vec<Vec<f64>> = trail
                .geometry
                .0
                .iter()
                .zip(trail.elevations_m.iter())
                .map(|(c, z)| vec![c.x, c.y, *z])
                .collect();
            let mut properties = Map::new();
            properties.insert("trail_id".to_string(), json!(trail.trail_id.to_string()));
            properties.insert("name".to_string(), json!(trail.name));
            properties.insert("origin".to_string(), json!(format!("{:?}", trail.origin)));
            properties.insert("length_km".to_string(), json!(trail.length_km));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoJsonValue::LineString(coords))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    write_feature_collection(features, path)
}

fn write_edges_geojson(workspace: &Workspace, path: &Path) -> Result<(), CarthorseError> {
    let Some(graph) = workspace.graph() else {
        return write_feature_collection(Vec::new(), path);
    };
    let features = graph
        .edges_iter()
        .map(|edge| {
            let coords: Vec<Vec<f64>> = edge
                .geometry
                .0
                .iter()
                .zip(edge.elevations_m.iter())
                .map(|(c, z)| vec![c.x, c.y, *z])
                .collect();
            let mut properties = Map::new();
            properties.insert("edge_id".to_string(), json!(edge.edge_id.as_usize()));
            properties.insert("source_vertex_id".to_string(), json!(edge.source.as_usize()));
            properties.insert("target_vertex_id".to_string(), json!(edge.target.as_usize()));
            properties.insert("originating_trail_name".to_string(), json!(edge.originating_trail_name));
            properties.insert("length_km".to_string(), json!(edge.length_km));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoJsonValue::LineString(coords))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    write_feature_collection(features, path)
}

fn write_vertices_geojson(workspace: &Workspace, path: &Path) -> Result<(), CarthorseError> {
    let Some(graph) = workspace.graph() else {
        return write_feature_collection(Vec::new(), path);
    };
    let features = graph
        .vertices_iter()
        .map(|vertex| {
            let mut properties = Map::new();
            properties.insert("vertex_id".to_string(), json!(vertex.vertex_id.as_usize()));
            properties.insert("degree".to_string(), json!(vertex.degree));
            properties.insert(
                "classification".to_string(),
                json!(vertex.classification.map(|c| format!("{c:?}"))),
            );
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoJsonValue::Point(vec![
                    vertex.x(),
                    vertex.y(),
                    vertex.elevation_m,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    write_feature_collection(features, path)
}

/// one `MultiLineString` feature per route, built by concatenating its
/// constituent edges' geometries in traversal order.
fn write_routes_geojson(workspace: &Workspace, path: &Path) -> Result<(), CarthorseError> {
    let Some(graph) = workspace.graph() else {
        return write_feature_collection(Vec::new(), path);
    };
    let features = workspace
        .routes()
        .iter()
        .map(|route| {
            let lines: Vec<Vec<Vec<f64>>> = route
                .edge_ids
                .iter()
                .filter_map(|edge_id| graph.get_edge(edge_id).ok())
                .map(|edge| edge.geometry.0.iter().map(|c| vec![c.x, c.y]).collect())
                .collect();

            let mut properties = Map::new();
            properties.insert("route_id".to_string(), json!(route.route_id));
            properties.insert("shape".to_string(), json!(format!("{:?}", route.shape)));
            properties.insert("total_distance_km".to_string(), json!(route.total_distance_km));
            properties.insert(
                "total_elevation_gain_m".to_string(),
                json!(route.total_elevation_gain_m),
            );
            properties.insert("similarity".to_string(), json!(route.similarity));
            properties.insert("trail_names".to_string(), json!(route.trail_names));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoJsonValue::MultiLineString(lines))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    write_feature_collection(features, path)
}

fn write_feature_collection(features: Vec<Feature>, path: &Path) -> Result<(), CarthorseError> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &collection)?;
    Ok(())
}
