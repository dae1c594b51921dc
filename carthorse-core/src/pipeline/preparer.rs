use std::collections::HashMap;

use geo::{Coord, LineString};

use crate::model::trail::{Trail, TrailOrigin};
use crate::model::trail_id::TrailId;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::Stage;

/// a raw trail record as delivered by the upstream source reader (OSM/GPX
/// ingestion, out of this core's scope per spec.md §6 External Interfaces
/// Input). `points` are (longitude, latitude, elevation_m) WGS84 triples.
#[derive(Clone, Debug)]
pub struct RawTrail {
    pub external_id: Option<String>,
    pub source: String,
    pub region_key: String,
    pub name: Option<String>,
    pub points: Vec<(f64, f64, f64)>,
}

/// counts of records the Preparer dropped, for non-fatal reporting
/// (spec.md §4.1 Failure semantics).
#[derive(Default, Debug, Clone, Copy)]
pub struct PreparerReport {
    pub accepted: usize,
    pub rejected_invalid_geometry: usize,
    pub rejected_region_filter: usize,
    pub deduplicated: usize,
}

/// filters, canonicalizes, and deduplicates a raw trail stream into the
/// workspace's initial trail set (spec.md §4.1).
pub fn run(
    raw_trails: Vec<RawTrail>,
    ctx: &mut PipelineContext,
) -> Result<PreparerReport, super::error::PipelineError> {
    ctx.log_stage_start(Stage::Preparer);
    let mut report = PreparerReport::default();

    let mut candidates: Vec<Trail> = Vec::new();
    for raw in raw_trails {
        if raw.region_key != ctx.config.region_key {
            report.rejected_region_filter += 1;
            continue;
        }
        match canonicalize(raw, &ctx.config) {
            Some(trail) => candidates.push(trail),
            None => report.rejected_invalid_geometry += 1,
        }
    }

    let (deduplicated, dup_count) = dedupe_by_geometry(candidates);
    report.deduplicated = dup_count;
    report.accepted = deduplicated.len();

    ctx.workspace.replace_all_trails(deduplicated);
    ctx.log_dropped(
        Stage::Preparer,
        report.rejected_invalid_geometry,
        "invalid or empty geometry",
    );
    ctx.log_dropped(
        Stage::Preparer,
        report.rejected_region_filter,
        "region/source filter mismatch",
    );
    ctx.log_dropped(
        Stage::Preparer,
        report.deduplicated,
        "duplicate 2D geometric identity",
    );

    Ok(report)
}

fn canonicalize(raw: RawTrail, config: &PipelineConfig) -> Option<Trail> {
    if raw.points.len() < 2 {
        return None;
    }

    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(raw.points.len());
    let mut elevations: Vec<f64> = Vec::with_capacity(raw.points.len());
    for (x, y, z) in raw.points {
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            return None;
        }
        let coord = Coord { x, y };
        if coords.last() == Some(&coord) {
            continue;
        }
        coords.push(coord);
        elevations.push(z);
    }

    if coords.len() < 2 {
        return None;
    }
    if let Some(bbox) = config.bounding_box {
        let within = coords.iter().any(|c| {
            c.x >= bbox.min_lng && c.x <= bbox.max_lng && c.y >= bbox.min_lat && c.y <= bbox.max_lat
        });
        if !within {
            return None;
        }
    }

    let geometry = LineString(coords);
    let trail = Trail::new(
        TrailId::new(),
        raw.region_key,
        raw.name.unwrap_or_else(|| "Unnamed Trail".to_string()),
        geometry,
        elevations,
        TrailOrigin::Raw,
        None,
        raw.external_id,
    );
    if trail.length_km <= 0.0 {
        return None;
    }
    Some(trail)
}

/// among trails with identical 2D geometry, keep the member with the
/// smallest trail id and discard the rest (spec.md §4.1).
fn dedupe_by_geometry(trails: Vec<Trail>) -> (Vec<Trail>, usize) {
    let mut groups: HashMap<Vec<(ordered_float::OrderedFloat<f64>, ordered_float::OrderedFloat<f64>)>, Vec<Trail>> =
        HashMap::new();
    for trail in trails {
        let key = trail
            .geometry
            .0
            .iter()
            .map(|c| (ordered_float::OrderedFloat(c.x), ordered_float::OrderedFloat(c.y)))
            .collect::<Vec<_>>();
        groups.entry(key).or_default().push(trail);
    }

    let mut kept = Vec::new();
    let mut dropped = 0usize;
    for mut group in groups.into_values() {
        group.sort_by_key(|t| t.trail_id.0);
        dropped += group.len() - 1;
        if let Some(first) = group.into_iter().next() {
            kept.push(first);
        }
    }
    (kept, dropped)
}
