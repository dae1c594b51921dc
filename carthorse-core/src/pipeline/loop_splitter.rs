use geo::{Coord, Intersects, Line, LineString};

use crate::model::trail::{Trail, TrailOrigin};
use crate::model::trail_id::TrailId;
use crate::util::geo::haversine::coord_distance_meters;

use super::context::PipelineContext;
use super::error::Stage;

/// radius within which a trail's start and end are considered a closed
/// ring by the Loop-Splitting Helper (spec.md §4.8).
pub const CLOSED_RING_TOLERANCE_M: f64 = 10.0;

#[derive(Default, Debug, Clone, Copy)]
pub struct LoopSplitReport {
    pub split: usize,
    pub unchanged: usize,
}

/// runs before the Intersection Resolver so downstream stages see only
/// simple polylines, except for deliberately retained closed rings
/// (spec.md §4.8).
pub fn run(ctx: &mut PipelineContext) -> LoopSplitReport {
    ctx.log_stage_start(Stage::LoopSplitter);
    let trails: Vec<Trail> = ctx.workspace.trails().cloned().collect();
    let mut report = LoopSplitReport::default();

    for trail in trails {
        if needs_apex_split(&trail) {
            let (first, second) = split_at_apex(&trail);
            ctx.workspace.replace_trail(trail.trail_id, vec![first, second]);
            report.split += 1;
        } else {
            report.unchanged += 1;
        }
    }

    report
}

fn needs_apex_split(trail: &Trail) -> bool {
    is_self_intersecting(&trail.geometry) || trail.is_closed(CLOSED_RING_TOLERANCE_M)
}

/// true if any two non-adjacent segments of the polyline intersect.
fn is_self_intersecting(line: &LineString<f64>) -> bool {
    let coords = &line.0;
    if coords.len() < 4 {
        return false;
    }
    let segments: Vec<Line<f64>> = coords
        .windows(2)
        .map(|pair| Line::new(pair[0], pair[1]))
        .collect();

    for i in 0..segments.len() {
        for j in (i + 2)..segments.len() {
            if i == 0 && j == segments.len() - 1 {
                // adjacent via the ring closure; a deliberately closed
                // ring is handled by the `is_closed` check, not here.
                continue;
            }
            if segments[i].intersects(&segments[j]) {
                return true;
            }
        }
    }
    false
}

/// splits `trail` at its apex: the vertex farthest, in geodesic distance,
/// from the start point (spec.md §4.8).
fn split_at_apex(trail: &Trail) -> (Trail, Trail) {
    let start = trail.start();
    let apex_idx = apex_index(&trail.geometry, start);

    let first_coords = trail.geometry.0[..=apex_idx].to_vec();
    let second_coords = trail.geometry.0[apex_idx..].to_vec();
    let first_elevations = trail.elevations_m[..=apex_idx].to_vec();
    let second_elevations = trail.elevations_m[apex_idx..].to_vec();

    let first = Trail::new(
        TrailId::new(),
        trail.region_key.clone(),
        trail.name.clone(),
        LineString(first_coords),
        first_elevations,
        TrailOrigin::SplitChild,
        Some(trail.trail_id),
        trail.external_id.clone(),
    );
    let second = Trail::new(
        TrailId::new(),
        trail.region_key.clone(),
        trail.name.clone(),
        LineString(second_coords),
        second_elevations,
        TrailOrigin::SplitChild,
        Some(trail.trail_id),
        trail.external_id.clone(),
    );
    (first, second)
}

/// the interior vertex (never the first or last point) farthest from
/// `start`, so the split always leaves two non-degenerate children.
fn apex_index(line: &LineString<f64>, start: Coord<f64>) -> usize {
    let last = line.0.len().saturating_sub(1);
    if last < 2 {
        return 1.min(last);
    }
    (1..last)
        .max_by(|&a, &b| {
            let da = coord_distance_meters(start, line.0[a]).unwrap_or(0.0);
            let db = coord_distance_meters(start, line.0[b]).unwrap_or(0.0);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(1)
}
