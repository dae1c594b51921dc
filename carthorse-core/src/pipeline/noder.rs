use std::collections::HashMap;

use geo::{Coord, LineString};

use crate::model::network::{Edge, EdgeId, Graph, Vertex, VertexId};
use crate::model::trail::Trail;
use crate::util::disjoint_set::DisjointSet;
use crate::util::geo::haversine::coord_distance_meters;
use crate::util::geo::{meters_to_degrees, BBoxEntry, BBoxRTree};

use super::context::PipelineContext;
use super::error::{PipelineError, Stage};

#[derive(Default, Debug, Clone, Copy)]
pub struct NoderReport {
    pub n_vertices: usize,
    pub n_edges: usize,
    pub dropped_short_edges: usize,
    pub dropped_degenerate_self_loops: usize,
}

struct RawLocation {
    coord: Coord<f64>,
    elevation_m: f64,
}

/// planar-nodes the trail set into a routable [`Graph`] (spec.md §4.5).
///
/// Splits every trail at each coordinate it shares with another trail (or
/// with itself), assigns dense vertex ids in ascending canonical-coordinate
/// order, and re-snaps any endpoint left just outside the micro-tolerance
/// bucketing against `bridging_tolerance_meters`.
pub fn run(ctx: &mut PipelineContext) -> Result<NoderReport, PipelineError> {
    ctx.log_stage_start(Stage::Noder);

    let mut trails: Vec<Trail> = ctx.workspace.trails().cloned().collect();
    // ordered by geometric content rather than `trail_id`: trail ids are
    // freshly minted on every run (spec.md §8 invariant 8 round-trip
    // idempotence requires edge order to depend only on the input, and a
    // fresh `TrailId::new()` per run is not stable input).
    trails.sort_by(|a, b| trail_sort_key(a).cmp(&trail_sort_key(b)));

    if trails.is_empty() {
        let graph = Graph::build(Vec::new(), Vec::new())
            .map_err(|source| PipelineError::NetworkFailure { stage: Stage::Noder, source })?;
        ctx.workspace.set_graph(graph);
        return Ok(NoderReport::default());
    }

    let snap_tolerance_deg = ctx.config.snap_tolerance_degrees;
    let (raw_locations, trail_point_raw) = assign_raw_locations(&trails, snap_tolerance_deg);

    let vertex_of_raw = resnap_to_bridging_tolerance(&raw_locations, ctx.config.bridging_tolerance_meters);
    let (vertices, vertex_of_raw) = build_dense_vertices(&raw_locations, vertex_of_raw);

    let trail_point_vertex: Vec<Vec<usize>> = trail_point_raw
        .iter()
        .map(|points| points.iter().map(|&raw| vertex_of_raw[raw]).collect())
        .collect();

    let mut vertex_occurrences: HashMap<usize, usize> = HashMap::new();
    for points in &trail_point_vertex {
        for &v in points {
            *vertex_occurrences.entry(v).or_insert(0) += 1;
        }
    }

    let mut report = NoderReport::default();
    let min_edge_length_km = ctx.config.min_edge_length_meters / 1000.0;
    let mut edges: Vec<Edge> = Vec::new();

    for (t_idx, trail) in trails.iter().enumerate() {
        let point_vertices = &trail_point_vertex[t_idx];
        let last = point_vertices.len().saturating_sub(1);
        if last == 0 {
            continue;
        }

        let mut boundaries = vec![0usize];
        for i in 1..last {
            if vertex_occurrences.get(&point_vertices[i]).copied().unwrap_or(0) >= 2 {
                boundaries.push(i);
            }
        }
        boundaries.push(last);
        boundaries.dedup();

        for window in boundaries.windows(2) {
            let (s, e) = (window[0], window[1]);
            if e <= s {
                continue;
            }
            let source = VertexId(point_vertices[s]);
            let target = VertexId(point_vertices[e]);
            let geometry = LineString(trail.geometry.0[s..=e].to_vec());
            let elevations = trail.elevations_m[s..=e].to_vec();
            let edge_id = EdgeId(edges.len());
            let candidate = Edge::new(
                edge_id,
                source,
                target,
                geometry,
                elevations,
                trail.trail_id,
                trail.name.clone(),
            );

            if candidate.length_km < min_edge_length_km {
                report.dropped_short_edges += 1;
                continue;
            }
            if candidate.is_self_loop() && candidate.geometry.0.len() < 3 {
                report.dropped_degenerate_self_loops += 1;
                continue;
            }
            edges.push(candidate);
        }
    }

    report.n_vertices = vertices.len();
    report.n_edges = edges.len();

    let graph = Graph::build(vertices, edges)
        .map_err(|source| PipelineError::NetworkFailure { stage: Stage::Noder, source })?;
    ctx.workspace.set_graph(graph);
    Ok(report)
}

/// a deterministic ordering key derived from a trail's own content, used
/// in place of its (freshly minted, per-run random) `trail_id` so that
/// edge emission order depends only on the input geometry.
fn trail_sort_key(trail: &Trail) -> Vec<(i64, i64)> {
    trail
        .geometry
        .0
        .iter()
        .map(|c| quantize(*c, 0.0))
        .collect()
}

fn quantize(coord: Coord<f64>, tolerance_deg: f64) -> (i64, i64) {
    if tolerance_deg <= 0.0 {
        return ((coord.x * 1e9).round() as i64, (coord.y * 1e9).round() as i64);
    }
    (
        (coord.x / tolerance_deg).round() as i64,
        (coord.y / tolerance_deg).round() as i64,
    )
}

/// quantizes every trail coordinate into a raw location bucket, returning
/// the location table and, per trail, the sequence of raw location indices
/// its points map to.
fn assign_raw_locations(trails: &[Trail], tolerance_deg: f64) -> (Vec<RawLocation>, Vec<Vec<usize>>) {
    let mut quant_index: HashMap<(i64, i64), usize> = HashMap::new();
    let mut raw_locations: Vec<RawLocation> = Vec::new();
    let mut trail_point_raw: Vec<Vec<usize>> = Vec::with_capacity(trails.len());

    for trail in trails {
        let mut points = Vec::with_capacity(trail.geometry.0.len());
        for (i, coord) in trail.geometry.0.iter().enumerate() {
            let key = quantize(*coord, tolerance_deg);
            let raw_id = *quant_index.entry(key).or_insert_with(|| {
                raw_locations.push(RawLocation {
                    coord: *coord,
                    elevation_m: trail.elevations_m[i],
                });
                raw_locations.len() - 1
            });
            points.push(raw_id);
        }
        trail_point_raw.push(points);
    }

    (raw_locations, trail_point_raw)
}

/// merges raw locations within `bridging_tolerance_meters` of one another
/// that the micro-tolerance quantization left as distinct buckets (spec.md
/// §4.5 "Post-noding snap"), returning each raw location's group root.
fn resnap_to_bridging_tolerance(raw_locations: &[RawLocation], bridging_tolerance_m: f64) -> Vec<usize> {
    let tolerance_deg = meters_to_degrees(bridging_tolerance_m);
    let entries: Vec<BBoxEntry<usize>> = raw_locations
        .iter()
        .enumerate()
        .map(|(i, loc)| BBoxEntry::from_point(loc.coord, i))
        .collect();
    let rtree = BBoxRTree::build(entries);

    let mut dsu = DisjointSet::new(raw_locations.len());
    for (i, loc) in raw_locations.iter().enumerate() {
        for &j in rtree.candidates_near_point(loc.coord, tolerance_deg) {
            if j == i {
                continue;
            }
            if let Ok(dist) = coord_distance_meters(loc.coord, raw_locations[j].coord) {
                if dist <= bridging_tolerance_m {
                    dsu.union(i, j);
                }
            }
        }
    }

    (0..raw_locations.len()).map(|i| dsu.find(i)).collect()
}

/// assigns dense [`VertexId`]s in ascending canonical 2D coordinate order
/// (spec.md §5) and returns the final vertex table alongside a raw-location
/// to vertex-id lookup.
fn build_dense_vertices(raw_locations: &[RawLocation], root_of_raw: Vec<usize>) -> (Vec<Vertex>, Vec<usize>) {
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for (raw_id, &root) in root_of_raw.iter().enumerate() {
        groups.entry(root).or_default().push(raw_id);
    }

    let mut representatives: Vec<(usize, Coord<f64>, f64)> = groups
        .into_values()
        .map(|members| {
            let rep = *members.iter().min().unwrap();
            (rep, raw_locations[rep].coord, raw_locations[rep].elevation_m)
        })
        .collect();
    representatives.sort_by(|a, b| {
        a.1.x
            .partial_cmp(&b.1.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.y.partial_cmp(&b.1.y).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut root_to_vertex: HashMap<usize, usize> = HashMap::new();
    let mut vertices = Vec::with_capacity(representatives.len());
    for (vertex_idx, (rep, coord, elevation_m)) in representatives.into_iter().enumerate() {
        vertices.push(Vertex::new(vertex_idx, coord.x, coord.y, elevation_m));
        let root = root_of_raw[rep];
        root_to_vertex.insert(root, vertex_idx);
    }

    let vertex_of_raw: Vec<usize> = root_of_raw
        .iter()
        .map(|root| root_to_vertex[root])
        .collect();
    (vertices, vertex_of_raw)
}
