use std::collections::HashMap;

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};

use crate::model::intersection::{IntersectionCandidate, IntersectionClass, SplitInstruction};
use crate::model::trail::Trail;
use crate::model::trail_id::TrailId;
use crate::util::geo::haversine::coord_distance_meters;
use crate::util::geo::{meters_to_degrees, BBoxEntry, BBoxRTree};

use super::context::PipelineContext;
use super::error::Stage;

#[derive(Default, Debug, Clone, Copy)]
pub struct IntersectionReport {
    pub pairs_examined: usize,
    pub true_crossings: usize,
    pub endpoint_on_trail: usize,
    pub multi_point_crossings: usize,
    pub near_misses: usize,
}

/// produces the complete set of split points per trail, driven by spatial
/// relationships with other trails (spec.md §4.2).
pub fn run(ctx: &mut PipelineContext) -> IntersectionReport {
    ctx.log_stage_start(Stage::IntersectionResolver);
    let tolerance_m = ctx.config.intersection_tolerance_meters;
    let tolerance_deg = meters_to_degrees(tolerance_m);

    let trails: Vec<Trail> = ctx.workspace.trails().cloned().collect();
    let index: HashMap<TrailId, &Trail> = trails.iter().map(|t| (t.trail_id, t)).collect();

    let entries: Vec<BBoxEntry<TrailId>> = trails
        .iter()
        .filter_map(|t| BBoxEntry::new(&t.geometry, t.trail_id))
        .collect();
    let rtree = BBoxRTree::build(entries);

    let mut candidates: Vec<IntersectionCandidate> = Vec::new();
    let mut split_points: HashMap<TrailId, Vec<SplitInstruction>> = HashMap::new();
    let mut seen_pairs: std::collections::HashSet<(TrailId, TrailId)> = std::collections::HashSet::new();
    let mut report = IntersectionReport::default();

    for trail in &trails {
        let nearby = rtree.candidates_near_line(&trail.geometry, tolerance_deg);
        for &other_id in &nearby {
            if *other_id == trail.trail_id {
                continue;
            }
            let pair_key = if trail.trail_id.0 < other_id.0 {
                (trail.trail_id, *other_id)
            } else {
                (*other_id, trail.trail_id)
            };
            if !seen_pairs.insert(pair_key) {
                continue;
            }
            let Some(other) = index.get(other_id) else {
                continue;
            };
            report.pairs_examined += 1;
            resolve_pair(
                trail,
                other,
                tolerance_m,
                &mut candidates,
                &mut split_points,
                &mut report,
            );
        }
    }

    for instructions in split_points.values_mut() {
        *instructions = collapse_and_order(std::mem::take(instructions), tolerance_m);
    }

    ctx.workspace.set_intersection_points(candidates);
    ctx.workspace.set_split_instructions(split_points);
    report
}

#[allow(clippy::too_many_arguments)]
fn resolve_pair(
    a: &Trail,
    b: &Trail,
    tolerance_m: f64,
    candidates: &mut Vec<IntersectionCandidate>,
    split_points: &mut HashMap<TrailId, Vec<SplitInstruction>>,
    report: &mut IntersectionReport,
) {
    let points = segment_intersections(a, b);

    if points.is_empty() {
        // Y/T: one trail's endpoint lies within tolerance of the other's
        // interior but farther than 1m from it (spec.md §4.2). Split the
        // visited trail at the projection; the visiting endpoint is close
        // enough that the Noder's bridging-tolerance resnap merges it into
        // the resulting vertex.
        let mut projected_points: Vec<Coord<f64>> = Vec::new();
        for (visiting, visited) in [(a, b), (b, a)] {
            for endpoint in [visiting.start(), visiting.end()] {
                let (_, dist_m, proj, _) = nearest_point_on_trail(visited, endpoint);
                if dist_m > 1.0 && dist_m <= tolerance_m && !near_endpoint(visited, proj, tolerance_m) {
                    push_split(split_points, visited, proj);
                    report.endpoint_on_trail += 1;
                    projected_points.push(proj);
                }
            }
        }
        if !projected_points.is_empty() {
            candidates.push(IntersectionCandidate::new(
                a.trail_id,
                b.trail_id,
                projected_points,
                IntersectionClass::EndpointOnTrail,
                0.0,
            ));
            return;
        }

        if let Some((dist, a_end, b_end)) = nearest_endpoint_pair(a, b) {
            if dist <= tolerance_m && dist > 0.0 {
                candidates.push(IntersectionCandidate::new(
                    a.trail_id,
                    b.trail_id,
                    vec![a_end, b_end],
                    IntersectionClass::EndpointNearMiss,
                    dist,
                ));
                report.near_misses += 1;
            }
        }
        return;
    }

    let classification = if points.len() == 1 {
        IntersectionClass::TrueCrossing
    } else {
        IntersectionClass::MultiPointCrossing
    };

    for point in &points {
        let near_a_endpoint = near_endpoint(a, *point, tolerance_m);
        let near_b_endpoint = near_endpoint(b, *point, tolerance_m);

        match (near_a_endpoint, near_b_endpoint) {
            (true, true) => continue,
            (false, false) => {
                push_split(split_points, a, *point);
                push_split(split_points, b, *point);
                if classification == IntersectionClass::TrueCrossing {
                    report.true_crossings += 1;
                } else {
                    report.multi_point_crossings += 1;
                }
            }
            (true, false) => {
                push_split(split_points, b, *point);
                report.endpoint_on_trail += 1;
            }
            (false, true) => {
                push_split(split_points, a, *point);
                report.endpoint_on_trail += 1;
            }
        }
    }

    candidates.push(IntersectionCandidate::new(
        a.trail_id,
        b.trail_id,
        points,
        classification,
        0.0,
    ));
}

fn push_split(split_points: &mut HashMap<TrailId, Vec<SplitInstruction>>, trail: &Trail, point: Coord<f64>) {
    let (arc_length_km, elevation_m) = project_onto_trail(trail, point);
    split_points
        .entry(trail.trail_id)
        .or_default()
        .push(SplitInstruction::new(arc_length_km, point, elevation_m));
}

/// true if `point` lies within `tolerance_m` of either endpoint of `trail`.
fn near_endpoint(trail: &Trail, point: Coord<f64>, tolerance_m: f64) -> bool {
    let start_dist = coord_distance_meters(trail.start(), point).unwrap_or(f64::INFINITY);
    let end_dist = coord_distance_meters(trail.end(), point).unwrap_or(f64::INFINITY);
    start_dist <= tolerance_m || end_dist <= tolerance_m
}

fn nearest_endpoint_pair(a: &Trail, b: &Trail) -> Option<(f64, Coord<f64>, Coord<f64>)> {
    let pairs = [
        (a.start(), b.start()),
        (a.start(), b.end()),
        (a.end(), b.start()),
        (a.end(), b.end()),
    ];
    pairs
        .into_iter()
        .filter_map(|(pa, pb)| coord_distance_meters(pa, pb).ok().map(|d| (d, pa, pb)))
        .min_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal))
}

/// every 2D intersection point between two trails' segments.
fn segment_intersections(a: &Trail, b: &Trail) -> Vec<Coord<f64>> {
    let a_segments: Vec<Line<f64>> = a.geometry.0.windows(2).map(|p| Line::new(p[0], p[1])).collect();
    let b_segments: Vec<Line<f64>> = b.geometry.0.windows(2).map(|p| Line::new(p[0], p[1])).collect();

    let mut points: Vec<Coord<f64>> = Vec::new();
    for sa in &a_segments {
        for sb in &b_segments {
            match line_intersection(*sa, *sb) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    if !points.iter().any(|p| coords_close(*p, intersection)) {
                        points.push(intersection);
                    }
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for p in [intersection.start, intersection.end] {
                        if !points.iter().any(|q| coords_close(*q, p)) {
                            points.push(p);
                        }
                    }
                }
                None => {}
            }
        }
    }
    points
}

fn coords_close(a: Coord<f64>, b: Coord<f64>) -> bool {
    coord_distance_meters(a, b).map(|d| d < 0.01).unwrap_or(false)
}

/// returns (arc-length in km from trail start, interpolated elevation) for
/// the point on `trail`'s geometry nearest to `point`.
fn project_onto_trail(trail: &Trail, point: Coord<f64>) -> (f64, f64) {
    let (arc_km, _dist_m, _proj, elevation) = nearest_point_on_trail(trail, point);
    (arc_km, elevation)
}

/// returns (arc-length in km from trail start, distance in meters, the
/// projected coordinate, interpolated elevation) for the point on `trail`'s
/// geometry nearest to `point`.
fn nearest_point_on_trail(trail: &Trail, point: Coord<f64>) -> (f64, f64, Coord<f64>, f64) {
    let coords = &trail.geometry.0;
    let mut best_dist = f64::INFINITY;
    let mut best_arc_km = 0.0;
    let mut best_proj = coords[0];
    let mut best_elevation = trail.elevations_m.first().copied().unwrap_or(0.0);
    let mut cumulative_km = 0.0;

    for window in coords.windows(2) {
        let seg_start = window[0];
        let seg_end = window[1];
        let seg_len_km = coord_distance_meters(seg_start, seg_end).unwrap_or(0.0) / 1000.0;
        let (t, proj) = project_onto_segment(seg_start, seg_end, point);
        let dist = coord_distance_meters(proj, point).unwrap_or(f64::INFINITY);
        if dist < best_dist {
            best_dist = dist;
            best_arc_km = cumulative_km + t * seg_len_km;
            best_proj = proj;
            let idx = coords.iter().position(|c| *c == seg_start).unwrap_or(0);
            let z0 = trail.elevations_m.get(idx).copied().unwrap_or(0.0);
            let z1 = trail.elevations_m.get(idx + 1).copied().unwrap_or(z0);
            best_elevation = z0 + t * (z1 - z0);
        }
        cumulative_km += seg_len_km;
    }
    (best_arc_km, best_dist, best_proj, best_elevation)
}

/// projects `point` onto the segment `seg_start..seg_end`, returning the
/// fractional position `t` in `[0, 1]` and the projected coordinate.
fn project_onto_segment(seg_start: Coord<f64>, seg_end: Coord<f64>, point: Coord<f64>) -> (f64, Coord<f64>) {
    let dx = seg_end.x - seg_start.x;
    let dy = seg_end.y - seg_start.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (0.0, seg_start);
    }
    let t = ((point.x - seg_start.x) * dx + (point.y - seg_start.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    (
        t,
        Coord {
            x: seg_start.x + t * dx,
            y: seg_start.y + t * dy,
        },
    )
}

/// collapses split points within snap tolerance of each other (keeping the
/// earliest in arc-length order) and drops points within tolerance of a
/// trail endpoint (spec.md §4.2 Tie-breaks).
fn collapse_and_order(mut instructions: Vec<SplitInstruction>, tolerance_m: f64) -> Vec<SplitInstruction> {
    instructions.sort_by(|a, b| a.arc_length_km.partial_cmp(&b.arc_length_km).unwrap_or(std::cmp::Ordering::Equal));

    let tolerance_km = tolerance_m / 1000.0;
    let mut collapsed: Vec<SplitInstruction> = Vec::new();
    for instruction in instructions {
        match collapsed.last() {
            Some(last) if (instruction.arc_length_km - last.arc_length_km).abs() <= tolerance_km => {}
            _ => collapsed.push(instruction),
        }
    }
    collapsed
}
