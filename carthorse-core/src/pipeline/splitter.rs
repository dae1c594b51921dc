use geo::{Coord, LineString};

use crate::model::trail::{Trail, TrailOrigin};
use crate::model::trail_id::TrailId;
use crate::util::geo::haversine::coord_distance_meters;

use super::context::PipelineContext;
use super::error::Stage;

/// arc-length positions within this many kilometers of each other, or of an
/// existing vertex, are treated as the same point (spec.md §4.2 Tie-breaks).
const ARC_LENGTH_EPSILON_KM: f64 = 1e-9;

#[derive(Default, Debug, Clone, Copy)]
pub struct SplitterReport {
    pub split: usize,
    pub unchanged: usize,
    pub children_emitted: usize,
    pub rejected_short_segment: usize,
}

/// rewrites the trail set so every trail with split instructions is
/// replaced by its ordered children (spec.md §4.3).
pub fn run(ctx: &mut PipelineContext) -> SplitterReport {
    ctx.log_stage_start(Stage::Splitter);
    let mut report = SplitterReport::default();
    let min_segment_length_km = ctx.config.min_segment_length_meters / 1000.0;

    let pending: Vec<(TrailId, Vec<f64>)> = ctx
        .workspace
        .all_split_instructions()
        .iter()
        .filter(|(_, instructions)| !instructions.is_empty())
        .map(|(id, instructions)| {
            let mut arcs: Vec<f64> = instructions.iter().map(|s| s.arc_length_km).collect();
            arcs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            (*id, arcs)
        })
        .collect();

    let total_trails = ctx.workspace.n_trails();
    let mut touched = 0usize;

    for (trail_id, splits_km) in pending {
        let Some(trail) = ctx.workspace.trail(&trail_id).cloned() else {
            continue;
        };
        touched += 1;

        let children = split_trail(&trail, &splits_km);
        if children.iter().any(|c| c.length_km < min_segment_length_km) {
            ctx.log_dropped(
                Stage::Splitter,
                1,
                "split would produce a segment below min_segment_length_meters; keeping original trail",
            );
            report.rejected_short_segment += 1;
            continue;
        }

        report.children_emitted += children.len();
        ctx.workspace.replace_trail(trail_id, children);
        report.split += 1;
    }

    report.unchanged = total_trails - touched;
    report
}

/// splits `trail`'s geometry and elevation profile at each position in
/// `splits_km` (ascending, kilometers from the start), producing k+1
/// children for k split positions.
fn split_trail(trail: &Trail, splits_km: &[f64]) -> Vec<Trail> {
    let (coords, elevations, boundaries) =
        insert_split_points(&trail.geometry.0, &trail.elevations_m, splits_km);

    boundaries
        .windows(2)
        .filter(|w| w[1] > w[0])
        .map(|w| {
            let (start, end) = (w[0], w[1]);
            Trail::new(
                TrailId::new(),
                trail.region_key.clone(),
                trail.name.clone(),
                LineString(coords[start..=end].to_vec()),
                elevations[start..=end].to_vec(),
                TrailOrigin::SplitChild,
                Some(trail.trail_id),
                trail.external_id.clone(),
            )
        })
        .collect()
}

/// inserts an interpolated vertex (coordinate + elevation) at each position
/// in `splits_km` that falls strictly inside a segment, reusing an existing
/// vertex when a split coincides with one, and returns the augmented
/// coordinate/elevation buffers plus the index (into those buffers) of
/// every child boundary, including the trail's own start and end.
fn insert_split_points(
    coords: &[Coord<f64>],
    elevations: &[f64],
    splits_km: &[f64],
) -> (Vec<Coord<f64>>, Vec<f64>, Vec<usize>) {
    let mut cumulative_km = vec![0.0; coords.len()];
    for i in 1..coords.len() {
        let seg_km = coord_distance_meters(coords[i - 1], coords[i]).unwrap_or(0.0) / 1000.0;
        cumulative_km[i] = cumulative_km[i - 1] + seg_km;
    }

    let mut out_coords = Vec::with_capacity(coords.len() + splits_km.len());
    let mut out_elevations = Vec::with_capacity(elevations.len() + splits_km.len());
    let mut boundaries = vec![0usize];
    out_coords.push(coords[0]);
    out_elevations.push(elevations[0]);

    let mut remaining = splits_km.iter().copied().peekable();

    for i in 1..coords.len() {
        while let Some(&arc) = remaining.peek() {
            if arc <= cumulative_km[i - 1] + ARC_LENGTH_EPSILON_KM {
                remaining.next();
                continue;
            }
            if arc >= cumulative_km[i] - ARC_LENGTH_EPSILON_KM {
                break;
            }
            let seg_len_km = cumulative_km[i] - cumulative_km[i - 1];
            let t = (arc - cumulative_km[i - 1]) / seg_len_km;
            let start = coords[i - 1];
            let end = coords[i];
            out_coords.push(Coord {
                x: start.x + t * (end.x - start.x),
                y: start.y + t * (end.y - start.y),
            });
            out_elevations.push(elevations[i - 1] + t * (elevations[i] - elevations[i - 1]));
            boundaries.push(out_coords.len() - 1);
            remaining.next();
        }

        out_coords.push(coords[i]);
        out_elevations.push(elevations[i]);

        if let Some(&arc) = remaining.peek() {
            if (arc - cumulative_km[i]).abs() <= ARC_LENGTH_EPSILON_KM {
                boundaries.push(out_coords.len() - 1);
                remaining.next();
            }
        }
    }

    let last = out_coords.len() - 1;
    if boundaries.last() != Some(&last) {
        boundaries.push(last);
    }
    (out_coords, out_elevations, boundaries)
}
