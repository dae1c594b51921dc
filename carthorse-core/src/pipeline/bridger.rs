use std::collections::HashMap;

use geo::{Coord, LineString};

use crate::model::intersection::IntersectionCandidate;
use crate::model::trail::{Trail, TrailOrigin};
use crate::model::trail_id::TrailId;
use crate::util::disjoint_set::DisjointSet;
use crate::util::geo::haversine::coord_distance_meters;

use super::context::PipelineContext;
use super::error::Stage;

#[derive(Default, Debug, Clone, Copy)]
pub struct BridgerReport {
    pub connectors_inserted: usize,
    pub pairs_bridged: usize,
    pub clusters_bridged: usize,
}

/// closes near-miss endpoint gaps recorded by the Intersection Resolver by
/// inserting connector trails (spec.md §4.4).
pub fn run(ctx: &mut PipelineContext) -> BridgerReport {
    ctx.log_stage_start(Stage::Bridger);
    let mut report = BridgerReport::default();
    if !ctx.config.bridging_enabled {
        return report;
    }

    let mut near_misses: Vec<IntersectionCandidate> = ctx
        .workspace
        .intersection_points()
        .iter()
        .filter(|c| c.is_near_miss())
        .cloned()
        .collect();
    if near_misses.is_empty() {
        return report;
    }
    // the intersection resolver iterates the workspace's trail table (a
    // hash map), so `near_misses` arrives in an order that varies run to
    // run on identical input; sort by the candidate's own coordinates so
    // downstream connector construction is reproducible (spec.md §8
    // invariant 8).
    near_misses.sort_by(|a, b| near_miss_sort_key(a).cmp(&near_miss_sort_key(b)));

    let mut nodes: Vec<Coord<f64>> = Vec::new();
    let mut elevations: Vec<f64> = Vec::new();
    let mut index: HashMap<(TrailId, i64, i64), usize> = HashMap::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for candidate in &near_misses {
        if candidate.points.len() < 2 {
            continue;
        }
        let (Some(a_trail), Some(b_trail)) = (
            ctx.workspace.trail(&candidate.trail_a),
            ctx.workspace.trail(&candidate.trail_b),
        ) else {
            continue;
        };
        let a_idx = intern_endpoint(
            &mut nodes,
            &mut elevations,
            &mut index,
            candidate.trail_a,
            candidate.points[0],
            endpoint_elevation(a_trail, candidate.points[0]),
        );
        let b_idx = intern_endpoint(
            &mut nodes,
            &mut elevations,
            &mut index,
            candidate.trail_b,
            candidate.points[1],
            endpoint_elevation(b_trail, candidate.points[1]),
        );
        pairs.push((a_idx, b_idx));
    }

    let mut dsu = DisjointSet::new(nodes.len());
    for (a, b) in &pairs {
        dsu.union(*a, *b);
    }

    let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..nodes.len() {
        let root = dsu.find(i);
        clusters.entry(root).or_default().push(i);
    }

    let region_key = ctx.config.region_key.clone();
    let mut new_trails = Vec::new();

    for members in clusters.values() {
        if members.len() < 2 {
            continue;
        }
        if members.len() == 2 {
            if let Some(connector) = make_connector(
                &region_key,
                nodes[members[0]],
                elevations[members[0]],
                nodes[members[1]],
                elevations[members[1]],
            ) {
                new_trails.push(connector);
                report.connectors_inserted += 1;
            }
            report.pairs_bridged += 1;
        } else {
            let (centroid, centroid_elev) = cluster_centroid(members, &nodes, &elevations);
            for &i in members {
                if let Some(connector) =
                    make_connector(&region_key, nodes[i], elevations[i], centroid, centroid_elev)
                {
                    new_trails.push(connector);
                    report.connectors_inserted += 1;
                }
            }
            report.clusters_bridged += 1;
        }
    }

    for connector in new_trails {
        ctx.workspace.insert_trail(connector);
    }
    report
}

/// a canonical, content-only ordering key for a near-miss candidate: the
/// two endpoint coordinates in ascending order, so that which trail the
/// resolver happened to label `a` vs `b` does not affect the sort.
fn near_miss_sort_key(candidate: &IntersectionCandidate) -> [(i64, i64); 2] {
    let mut points: Vec<(i64, i64)> = candidate
        .points
        .iter()
        .map(|p| ((p.x * 1e9).round() as i64, (p.y * 1e9).round() as i64))
        .collect();
    points.sort();
    [points[0], points.get(1).copied().unwrap_or(points[0])]
}

fn intern_endpoint(
    nodes: &mut Vec<Coord<f64>>,
    elevations: &mut Vec<f64>,
    index: &mut HashMap<(TrailId, i64, i64), usize>,
    trail_id: TrailId,
    coord: Coord<f64>,
    elevation_m: f64,
) -> usize {
    let key = (trail_id, (coord.x * 1e7).round() as i64, (coord.y * 1e7).round() as i64);
    *index.entry(key).or_insert_with(|| {
        nodes.push(coord);
        elevations.push(elevation_m);
        nodes.len() - 1
    })
}

fn endpoint_elevation(trail: &Trail, coord: Coord<f64>) -> f64 {
    let start_dist = coord_distance_meters(trail.start(), coord).unwrap_or(f64::INFINITY);
    let end_dist = coord_distance_meters(trail.end(), coord).unwrap_or(f64::INFINITY);
    if start_dist <= end_dist {
        trail.elevations_m.first().copied().unwrap_or(0.0)
    } else {
        trail.elevations_m.last().copied().unwrap_or(0.0)
    }
}

fn cluster_centroid(members: &[usize], nodes: &[Coord<f64>], elevations: &[f64]) -> (Coord<f64>, f64) {
    let n = members.len() as f64;
    let x = members.iter().map(|&i| nodes[i].x).sum::<f64>() / n;
    let y = members.iter().map(|&i| nodes[i].y).sum::<f64>() / n;
    let z = members.iter().map(|&i| elevations[i]).sum::<f64>() / n;
    (Coord { x, y }, z)
}

/// a straight (2D if either endpoint lacks elevation context, 3D otherwise)
/// connector between two endpoints, or `None` if they already coincide.
fn make_connector(region_key: &str, a: Coord<f64>, a_elev: f64, b: Coord<f64>, b_elev: f64) -> Option<Trail> {
    if a == b {
        return None;
    }
    Some(Trail::new(
        TrailId::new(),
        region_key.to_string(),
        "Bridge".to_string(),
        LineString(vec![a, b]),
        vec![a_elev, b_elev],
        TrailOrigin::Connector,
        None,
        None,
    ))
}
