use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use rayon::prelude::*;

use crate::algorithm::search::ksp::yens;
use crate::algorithm::search::{dijkstra, hawick, vertex_oriented_route, EdgeTraversal, SearchError};
use crate::model::network::{EdgeId, Graph, VertexId};
use crate::model::pattern::RoutePattern;
use crate::model::route::{RouteCandidate, RouteShape};
use crate::model::units::Cost;

use super::context::PipelineContext;
use super::error::{PipelineError, Stage};

#[derive(Default, Debug, Clone, Copy)]
pub struct RouteEnumeratorReport {
    pub candidates_found: usize,
    pub below_similarity_threshold: usize,
    pub deduplicated: usize,
    pub candidates_emitted: usize,
}

/// emits a ranked, deduplicated list of route candidates against the
/// configured patterns (spec.md §4.7). Patterns search independently and
/// are run in parallel, since each pattern's search reads the graph but
/// never mutates it (spec.md §5).
pub fn run(ctx: &mut PipelineContext) -> Result<RouteEnumeratorReport, PipelineError> {
    ctx.log_stage_start(Stage::RouteEnumerator);
    let Some(graph) = ctx.workspace.graph() else {
        return Err(PipelineError::ContractViolation {
            stage: Stage::RouteEnumerator,
            message: "noder has not run; workspace has no graph".to_string(),
        });
    };

    let patterns = ctx.config.patterns.clone();
    let loop_ksp_k = ctx.config.loop_ksp_k;
    let loop_max_overlap_pct = ctx.config.loop_max_overlap_pct;
    let min_similarity_score = ctx.config.min_similarity_score;
    let deadline = ctx.deadline();

    let per_pattern: Vec<Vec<RouteCandidate>> = patterns
        .par_iter()
        .map(|pattern| search_pattern(graph, pattern, loop_ksp_k, loop_max_overlap_pct, deadline))
        .collect::<Result<Vec<_>, SearchError>>()
        .map_err(|source| PipelineError::SearchFailure {
            stage: Stage::RouteEnumerator,
            source,
        })?;

    let mut report = RouteEnumeratorReport::default();
    let mut candidates: Vec<RouteCandidate> = per_pattern.into_iter().flatten().collect();
    report.candidates_found = candidates.len();

    let before_threshold = candidates.len();
    candidates.retain(|c| c.similarity >= min_similarity_score);
    report.below_similarity_threshold = before_threshold - candidates.len();

    let deduped = deduplicate(candidates);
    report.deduplicated = report.candidates_found - report.below_similarity_threshold - deduped.len();

    let mut ranked = deduped;
    ranked.sort_by(rank_order);
    for (idx, candidate) in ranked.iter_mut().enumerate() {
        candidate.route_id = idx;
    }
    report.candidates_emitted = ranked.len();

    ctx.workspace.set_routes(ranked);
    Ok(report)
}

/// determinism ordering of spec.md §4.7: descending similarity, then
/// ascending distance, then ascending minimum edge id.
fn rank_order(a: &RouteCandidate, b: &RouteCandidate) -> Ordering {
    b.similarity
        .partial_cmp(&a.similarity)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            a.total_distance_km
                .partial_cmp(&b.total_distance_km)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.edge_ids.iter().min().cmp(&b.edge_ids.iter().min()))
}

/// collapses candidates that traverse the same edges up to rotation and
/// reversal class, keeping the best-scoring representative per class
/// (spec.md §4.7).
fn deduplicate(candidates: Vec<RouteCandidate>) -> Vec<RouteCandidate> {
    let mut best: HashMap<Vec<EdgeId>, RouteCandidate> = HashMap::new();
    for candidate in candidates {
        let key = candidate.canonical_key();
        match best.get(&key) {
            Some(existing) if existing.similarity >= candidate.similarity => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }
    best.into_values().collect()
}

fn search_pattern(
    graph: &Graph,
    pattern: &RoutePattern,
    loop_ksp_k: usize,
    loop_max_overlap_pct: f64,
    deadline: Option<Instant>,
) -> Result<Vec<RouteCandidate>, SearchError> {
    match pattern.shape {
        RouteShape::Loop => search_loops(graph, pattern, loop_ksp_k, loop_max_overlap_pct, deadline),
        RouteShape::OutAndBack => search_out_and_back(graph, pattern, deadline),
        RouteShape::PointToPoint => search_point_to_point(graph, pattern, deadline),
    }
}

/// true once `deadline` has passed; `None` never expires (spec.md §5
/// "Route enumeration additionally enforces per-pattern time budgets").
fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// vertices of degree >= 3, the anchors used to start loop, out-and-back,
/// and point-to-point searches (GLOSSARY: Anchor vertex).
fn anchors(graph: &Graph) -> Vec<VertexId> {
    graph
        .vertices_iter()
        .filter(|v| v.degree >= 3)
        .map(|v| v.vertex_id)
        .collect()
}

/// total distance, elevation gain, and ordered distinct trail names along
/// `path`, walked forward from `start` so elevation gain/loss is read in
/// the actual direction of travel rather than the edge's stored direction.
fn path_metrics(
    graph: &Graph,
    start: VertexId,
    path: &[EdgeTraversal],
) -> Result<(f64, f64, Vec<String>), SearchError> {
    let mut distance_km = 0.0;
    let mut gain_m = 0.0;
    let mut names: Vec<String> = Vec::new();
    let mut current = start;

    for traversal in path {
        let edge = graph.get_edge(&traversal.edge_id)?;
        distance_km += edge.length_km;
        if current == edge.source {
            gain_m += edge.elevation_gain_m;
        } else {
            gain_m += edge.elevation_loss_m;
        }
        if names.last().map(|n| n.as_str()) != Some(edge.originating_trail_name.as_str()) {
            names.push(edge.originating_trail_name.clone());
        }
        current = edge.other_endpoint(current).unwrap_or(edge.target);
    }
    Ok((distance_km, gain_m, names))
}

fn search_loops(
    graph: &Graph,
    pattern: &RoutePattern,
    loop_ksp_k: usize,
    loop_max_overlap_pct: f64,
    deadline: Option<Instant>,
) -> Result<Vec<RouteCandidate>, SearchError> {
    let mut candidates = search_hawick_loops(graph, pattern, deadline)?;
    candidates.extend(search_anchor_loops(
        graph,
        pattern,
        loop_ksp_k,
        loop_max_overlap_pct,
        deadline,
    )?);
    Ok(candidates)
}

/// elementary cycles of the graph up to the pattern's maximum accepted
/// distance, filtered to the pattern's tolerance band (spec.md §4.7
/// "Hawick circuits").
fn search_hawick_loops(
    graph: &Graph,
    pattern: &RoutePattern,
    deadline: Option<Instant>,
) -> Result<Vec<RouteCandidate>, SearchError> {
    let cost_cap = Cost::new(pattern.max_km());
    let circuits = hawick::all_circuits(graph, cost_cap)?;

    let mut candidates = Vec::with_capacity(circuits.len());
    for circuit in circuits {
        if deadline_passed(deadline) {
            break;
        }
        let Some(first) = circuit.first() else {
            continue;
        };
        let anchor = graph.get_edge(&first.edge_id)?.source;
        let (distance_km, gain_m, names) = path_metrics(graph, anchor, &circuit)?;
        if !pattern.accepts_distance(distance_km) {
            continue;
        }
        let similarity = pattern.similarity(distance_km, gain_m);
        let edge_ids: Vec<EdgeId> = circuit.iter().map(|t| t.edge_id).collect();
        candidates.push(RouteCandidate::new(
            0,
            RouteShape::Loop,
            edge_ids,
            anchor,
            distance_km,
            gain_m,
            similarity,
            names,
        ));
    }
    Ok(candidates)
}

/// for each anchor, an outbound path to a destination at 20-80% of target
/// distance, paired with the lowest-overlap alternative return path among
/// the top-K returns (spec.md §4.7 "Anchor-based true loops").
fn search_anchor_loops(
    graph: &Graph,
    pattern: &RoutePattern,
    loop_ksp_k: usize,
    loop_max_overlap_pct: f64,
    deadline: Option<Instant>,
) -> Result<Vec<RouteCandidate>, SearchError> {
    let half_min_km = pattern.target_km * 0.20;
    let half_max_km = pattern.target_km * 0.80;
    let mut candidates = Vec::new();

    for anchor in anchors(graph) {
        if deadline_passed(deadline) {
            break;
        }
        let tree = dijkstra::run(graph, anchor, None, &dijkstra::SearchExclusions::default())?;
        let destinations: Vec<VertexId> = tree.keys().copied().collect();

        for destination in destinations {
            if deadline_passed(deadline) {
                break;
            }
            let outbound = vertex_oriented_route(anchor, destination, &tree)?;
            if outbound.is_empty() {
                continue;
            }
            let outbound_km: f64 = outbound.iter().map(|e| f64::from(e.cost)).sum();
            if outbound_km < half_min_km || outbound_km > half_max_km {
                continue;
            }

            let outbound_edges: HashSet<EdgeId> = outbound.iter().map(|e| e.edge_id).collect();
            let alternatives = yens::run(graph, destination, anchor, loop_ksp_k)?;

            let mut best: Option<(Vec<EdgeTraversal>, f64)> = None;
            for ret in alternatives {
                if ret.is_empty() {
                    continue;
                }
                let overlap = ret.iter().filter(|e| outbound_edges.contains(&e.edge_id)).count();
                let overlap_pct = 100.0 * overlap as f64 / ret.len() as f64;
                if overlap_pct > loop_max_overlap_pct {
                    continue;
                }
                match &best {
                    Some((_, best_overlap)) if overlap_pct >= *best_overlap => {}
                    _ => best = Some((ret, overlap_pct)),
                }
            }

            let Some((ret, _)) = best else { continue };
            let mut full_path = outbound;
            full_path.extend(ret);
            let (distance_km, gain_m, names) = path_metrics(graph, anchor, &full_path)?;
            if !pattern.accepts_distance(distance_km) {
                continue;
            }
            let similarity = pattern.similarity(distance_km, gain_m);
            let edge_ids: Vec<EdgeId> = full_path.iter().map(|t| t.edge_id).collect();
            candidates.push(RouteCandidate::new(
                0,
                RouteShape::Loop,
                edge_ids,
                anchor,
                distance_km,
                gain_m,
                similarity,
                names,
            ));
        }
    }
    Ok(candidates)
}

/// shortest path from an anchor to a destination at ~half the target
/// distance, doubled back along the same edges (spec.md §4.7).
fn search_out_and_back(
    graph: &Graph,
    pattern: &RoutePattern,
    deadline: Option<Instant>,
) -> Result<Vec<RouteCandidate>, SearchError> {
    let half_target_km = pattern.target_km / 2.0;
    let half_min_km = half_target_km * (1.0 - pattern.tolerance_pct / 100.0);
    let half_max_km = half_target_km * (1.0 + pattern.tolerance_pct / 100.0);

    let mut candidates = Vec::new();
    for anchor in anchors(graph) {
        if deadline_passed(deadline) {
            break;
        }
        let tree = dijkstra::run(graph, anchor, None, &dijkstra::SearchExclusions::default())?;

        for destination in tree.keys().copied().collect::<Vec<_>>() {
            if deadline_passed(deadline) {
                break;
            }
            let outbound = vertex_oriented_route(anchor, destination, &tree)?;
            if outbound.is_empty() {
                continue;
            }
            let outbound_km: f64 = outbound.iter().map(|e| f64::from(e.cost)).sum();
            if outbound_km < half_min_km || outbound_km > half_max_km {
                continue;
            }

            let mut full_path = outbound.clone();
            let mut returning = outbound;
            returning.reverse();
            full_path.extend(returning);

            let (distance_km, gain_m, names) = path_metrics(graph, anchor, &full_path)?;
            if !pattern.accepts_distance(distance_km) {
                continue;
            }
            let similarity = pattern.similarity(distance_km, gain_m);
            let edge_ids: Vec<EdgeId> = full_path.iter().map(|t| t.edge_id).collect();
            candidates.push(RouteCandidate::new(
                0,
                RouteShape::OutAndBack,
                edge_ids,
                anchor,
                distance_km,
                gain_m,
                similarity,
                names,
            ));
        }
    }
    Ok(candidates)
}

/// recursive bounded DFS from every intersection vertex, pruned by current
/// total distance and depth (spec.md §4.7).
fn search_point_to_point(
    graph: &Graph,
    pattern: &RoutePattern,
    deadline: Option<Instant>,
) -> Result<Vec<RouteCandidate>, SearchError> {
    let min_km = pattern.target_km * 0.30;
    let max_km = pattern.max_km();
    let mut candidates = Vec::new();

    for start in anchors(graph) {
        let mut path: Vec<EdgeTraversal> = Vec::new();
        let mut used_edges: HashSet<EdgeId> = HashSet::new();
        match dfs_point_to_point(
            graph,
            pattern,
            start,
            start,
            0.0,
            &mut path,
            &mut used_edges,
            pattern.max_depth,
            min_km,
            max_km,
            deadline,
            &mut candidates,
        ) {
            Ok(()) => {}
            // the per-pattern time budget expired mid-search; every
            // candidate already pushed into `candidates` is fully valid
            // (spec.md §7 "emit whatever fully-valid candidates have been
            // accumulated"), so stop searching further anchors rather than
            // failing the whole pattern.
            Err(SearchError::Timeout(_)) => break,
            Err(other) => return Err(other),
        }
    }
    Ok(candidates)
}

#[allow(clippy::too_many_arguments)]
fn dfs_point_to_point(
    graph: &Graph,
    pattern: &RoutePattern,
    start: VertexId,
    current: VertexId,
    current_km: f64,
    path: &mut Vec<EdgeTraversal>,
    used_edges: &mut HashSet<EdgeId>,
    remaining_depth: usize,
    min_km: f64,
    max_km: f64,
    deadline: Option<Instant>,
    out: &mut Vec<RouteCandidate>,
) -> Result<(), SearchError> {
    if deadline_passed(deadline) {
        return Err(SearchError::Timeout(out.len()));
    }

    if !path.is_empty() && current_km >= min_km && current_km <= max_km {
        let (distance_km, gain_m, names) = path_metrics(graph, start, path)?;
        let similarity = pattern.similarity(distance_km, gain_m);
        let edge_ids: Vec<EdgeId> = path.iter().map(|t| t.edge_id).collect();
        out.push(RouteCandidate::new(
            0,
            RouteShape::PointToPoint,
            edge_ids,
            start,
            distance_km,
            gain_m,
            similarity,
            names,
        ));
    }

    if remaining_depth == 0 {
        return Ok(());
    }

    for (edge_id, next) in graph.incident_edges(&current) {
        if used_edges.contains(&edge_id) {
            continue;
        }
        let edge = graph.get_edge(&edge_id)?;
        let next_km = current_km + edge.length_km;
        if next_km > max_km {
            continue;
        }
        used_edges.insert(edge_id);
        path.push(EdgeTraversal::new(edge_id, Cost::new(edge.cost)));
        dfs_point_to_point(
            graph,
            pattern,
            start,
            next,
            next_km,
            path,
            used_edges,
            remaining_depth - 1,
            min_km,
            max_km,
            deadline,
            out,
        )?;
        path.pop();
        used_edges.remove(&edge_id);
    }
    Ok(())
}
