//! The eight-stage trail-to-routes pipeline (spec.md §2, §4).
//!
//! Stages run strictly in sequence against a shared [`PipelineContext`];
//! each stage reads and writes the [`workspace::Workspace`](crate::workspace::Workspace)
//! tables left by its predecessor. [`run_all`] wires the full sequence and
//! is what the CLI drives; the stage modules are also exposed individually
//! so tests and benches can run a prefix of the pipeline.

pub mod bridger;
pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod intersection_resolver;
pub mod loop_splitter;
pub mod noder;
pub mod preparer;
pub mod route_enumerator;
pub mod splitter;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::{PipelineError, Stage};
pub use preparer::RawTrail;

/// the report emitted by one full pipeline run, one field per stage
/// (spec.md §4 per-stage "Failure semantics" counters).
#[derive(Default, Debug, Clone)]
pub struct PipelineReport {
    pub preparer: preparer::PreparerReport,
    pub loop_splitter: loop_splitter::LoopSplitReport,
    pub intersection_resolver: intersection_resolver::IntersectionReport,
    pub splitter: splitter::SplitterReport,
    pub bridger: bridger::BridgerReport,
    pub noder: noder::NoderReport,
    pub classifier: classifier::ClassifierReport,
    pub route_enumerator: route_enumerator::RouteEnumeratorReport,
}

/// runs every stage in spec.md §2's data-flow order:
/// Preparer -> Loop-Splitting Helper -> Intersection Resolver -> Splitter
/// -> Bridger -> Noder & Topology Builder -> Vertex Classifier -> Route
/// Enumerator.
///
/// A stage-scoped [`PipelineError`] aborts the run immediately; the
/// workspace is left exactly as the last successful stage produced it, so
/// a caller can inspect how far the run progressed.
pub fn run_all(
    raw_trails: Vec<RawTrail>,
    ctx: &mut PipelineContext,
) -> Result<PipelineReport, PipelineError> {
    let mut report = PipelineReport::default();

    check_deadline(ctx, Stage::Preparer)?;
    report.preparer = preparer::run(raw_trails, ctx)?;
    check_deadline(ctx, Stage::LoopSplitter)?;
    report.loop_splitter = loop_splitter::run(ctx);
    check_deadline(ctx, Stage::IntersectionResolver)?;
    report.intersection_resolver = intersection_resolver::run(ctx);
    check_deadline(ctx, Stage::Splitter)?;
    report.splitter = splitter::run(ctx);
    check_deadline(ctx, Stage::Bridger)?;
    report.bridger = bridger::run(ctx);
    check_deadline(ctx, Stage::Noder)?;
    report.noder = noder::run(ctx)?;
    check_deadline(ctx, Stage::VertexClassifier)?;
    report.classifier = classifier::run(ctx);
    check_deadline(ctx, Stage::RouteEnumerator)?;
    report.route_enumerator = route_enumerator::run(ctx)?;

    Ok(report)
}

/// checked before each stage runs (spec.md §5 "Cancellation and
/// timeouts"): a stage never starts once the run's overall deadline has
/// passed, and the workspace is left exactly as the prior stage produced.
fn check_deadline(ctx: &PipelineContext, stage: Stage) -> Result<(), PipelineError> {
    if ctx.deadline_exceeded() {
        return Err(PipelineError::DeadlineExceeded { stage });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pattern::RoutePattern;
    use crate::model::route::RouteShape;

    fn base_config() -> PipelineConfig {
        PipelineConfig {
            region_key: "test-region".to_string(),
            ..PipelineConfig::default()
        }
    }

    fn raw(points: &[(f64, f64, f64)]) -> RawTrail {
        RawTrail {
            external_id: None,
            source: "test".to_string(),
            region_key: "test-region".to_string(),
            name: None,
            points: points.to_vec(),
        }
    }

    fn run_trails(raw_trails: Vec<RawTrail>) -> PipelineContext {
        let mut ctx = PipelineContext::new(base_config());
        run_all(raw_trails, &mut ctx).expect("pipeline must succeed");
        ctx
    }

    /// S1: two crossing trails produce a shared degree-4 vertex and each
    /// trail splits into two edges.
    #[test]
    fn s1_crossing_trails_node_correctly() {
        let trail_a = raw(&[(0.0, 0.0, 100.0), (10.0, 0.0, 110.0)]);
        let trail_b = raw(&[(5.0, -5.0, 100.0), (5.0, 5.0, 120.0)]);
        let ctx = run_trails(vec![trail_a, trail_b]);

        let graph = ctx.workspace.graph().expect("noder must have run");
        assert_eq!(graph.n_vertices(), 5);
        assert_eq!(graph.n_edges(), 4);

        let center = graph
            .vertices_iter()
            .find(|v| (v.x() - 5.0).abs() < 1e-3 && v.y().abs() < 1e-3)
            .expect("a vertex near (5, 0) must exist");
        assert_eq!(graph.degree(&center.vertex_id), 4);
    }

    /// S2: a T-intersection splits only the trail being crossed through.
    #[test]
    fn s2_t_intersection_splits_only_crossed_trail() {
        let trail_a = raw(&[(0.0, 0.0, 100.0), (10.0, 0.0, 100.0)]);
        let trail_b = raw(&[(5.0, 0.0, 100.0), (5.0, 5.0, 120.0)]);
        let ctx = run_trails(vec![trail_a, trail_b]);

        let graph = ctx.workspace.graph().expect("noder must have run");
        assert_eq!(graph.n_vertices(), 4);
        assert_eq!(graph.n_edges(), 3);

        let center = graph
            .vertices_iter()
            .find(|v| (v.x() - 5.0).abs() < 1e-3 && v.y().abs() < 1e-3)
            .expect("a vertex at (5, 0) must exist");
        assert_eq!(graph.degree(&center.vertex_id), 3);
    }

    /// an endpoint that comes within tolerance of another trail's interior
    /// without the segments actually crossing still splits the visited
    /// trail at the projection and merges with it once noded (spec.md
    /// §4.2 "Y/T (endpoint on trail)", distance > 1m).
    #[test]
    fn y_t_endpoint_near_interior_splits_without_exact_crossing() {
        let trail_b = raw(&[(0.0, 0.0, 100.0), (10.0, 0.0, 100.0)]);
        // ~1.5m north of (5, 0): within the default 2m tolerance, but far
        // enough that the segments never actually touch.
        let offset_deg = 1.5 / 111_320.0;
        let trail_a = raw(&[(5.0, offset_deg, 100.0), (5.0, 5.0, 120.0)]);
        let ctx = run_trails(vec![trail_a, trail_b]);

        let graph = ctx.workspace.graph().expect("noder must have run");
        assert_eq!(graph.n_vertices(), 4);
        assert_eq!(graph.n_edges(), 3);

        let merged = graph
            .vertices_iter()
            .find(|v| (v.x() - 5.0).abs() < 1e-3 && v.y().abs() < 1e-3)
            .expect("a vertex near (5, 0) must exist");
        assert_eq!(graph.degree(&merged.vertex_id), 3);
    }

    /// S3: near-miss endpoints within bridging tolerance merge into one
    /// degree-2 vertex once a connector trail has been inserted.
    #[test]
    fn s3_near_miss_endpoints_bridge_and_merge() {
        let trail_a = raw(&[(0.0, 0.0, 100.0), (1.0, 0.0, 110.0)]);
        let trail_b = raw(&[(0.0, 0.00002, 100.0), (1.0, 0.00002, 120.0)]);
        let ctx = run_trails(vec![trail_a, trail_b]);

        let graph = ctx.workspace.graph().expect("noder must have run");
        assert_eq!(graph.n_vertices(), 3);
        assert_eq!(graph.n_edges(), 2);

        let merged = graph
            .vertices_iter()
            .find(|v| graph.degree(&v.vertex_id) == 2)
            .expect("a degree-2 merged vertex must exist");
        assert!(merged.x().abs() < 1e-3);
    }

    /// S4: a self-intersecting trail gets split at its apex into two
    /// simple children.
    #[test]
    fn s4_self_intersecting_trail_splits_at_apex() {
        let trail_a = raw(&[
            (0.0, 0.0, 100.0),
            (5.0, 5.0, 105.0),
            (10.0, 0.0, 110.0),
            (5.0, 5.0, 115.0),
            (0.0, 10.0, 120.0),
        ]);
        let ctx = run_trails(vec![trail_a]);

        let graph = ctx.workspace.graph().expect("noder must have run");
        // the apex at (10, 0) is shared by both children, giving 3 vertices
        // and 2 edges rather than the original single 5-point polyline.
        assert_eq!(graph.n_vertices(), 3);
        assert_eq!(graph.n_edges(), 2);
    }

    /// S5: a triangular loop network of ~6km/300m gain yields at least one
    /// high-similarity loop candidate.
    #[test]
    fn s5_loop_enumeration_finds_triangle() {
        // an equilateral-ish triangle of roughly 2km legs (~6km total),
        // climbing 150m out and descending back on each leg so the loop's
        // net gain sums to ~300m.
        let trail_a = raw(&[(0.0, 0.0, 1000.0), (0.018, 0.0, 1150.0)]);
        let trail_b = raw(&[(0.018, 0.0, 1150.0), (0.009, 0.0156, 1000.0)]);
        let trail_c = raw(&[(0.009, 0.0156, 1000.0), (0.0, 0.0, 1150.0)]);

        let mut config = base_config();
        config.patterns = vec![RoutePattern::new(RouteShape::Loop, 6.0, 300.0, 20.0, 10)];
        let mut ctx = PipelineContext::new(config);
        run_all(vec![trail_a, trail_b, trail_c], &mut ctx).expect("pipeline must succeed");

        let routes = ctx.workspace.routes();
        let loop_route = routes
            .iter()
            .find(|r| r.shape == RouteShape::Loop)
            .expect("at least one loop candidate must be emitted");
        assert!(loop_route.similarity >= 0.3);
        assert!(loop_route.total_distance_km >= 4.8 && loop_route.total_distance_km <= 7.2);
    }

    /// S6: two trails with identical 2D geometry but different names
    /// collapse to a single trail before noding.
    #[test]
    fn s6_duplicate_geometry_is_suppressed() {
        let mut first = raw(&[(0.0, 0.0, 100.0), (1.0, 1.0, 110.0)]);
        first.name = Some("Ridge Trail".to_string());
        let mut second = raw(&[(0.0, 0.0, 100.0), (1.0, 1.0, 110.0)]);
        second.name = Some("Ridgeline Path".to_string());

        let mut ctx = PipelineContext::new(base_config());
        let report = run_all(vec![first, second], &mut ctx).expect("pipeline must succeed");

        assert_eq!(report.preparer.accepted, 1);
        assert_eq!(report.preparer.deduplicated, 1);

        let graph = ctx.workspace.graph().expect("noder must have run");
        assert_eq!(graph.n_edges(), 1);
        assert_eq!(graph.edges_iter().next().unwrap().originating_trail_name, "Ridge Trail");
    }

    /// invariant 3 (Noder uniqueness) and invariant 5 (degree consistency)
    /// hold across a small multi-trail network.
    #[test]
    fn invariants_noder_uniqueness_and_degree_consistency() {
        let trail_a = raw(&[(0.0, 0.0, 100.0), (10.0, 0.0, 110.0)]);
        let trail_b = raw(&[(5.0, -5.0, 100.0), (5.0, 5.0, 120.0)]);
        let ctx = run_trails(vec![trail_a, trail_b]);
        let graph = ctx.workspace.graph().unwrap();

        let snap_tolerance_m = graph_snap_tolerance_m(&ctx);
        let vertices: Vec<_> = graph.vertices_iter().collect();
        for i in 0..vertices.len() {
            for j in (i + 1)..vertices.len() {
                let dist = crate::util::geo::haversine::coord_distance_meters(
                    vertices[i].coordinate,
                    vertices[j].coordinate,
                )
                .unwrap();
                assert!(
                    dist > snap_tolerance_m,
                    "vertices {i} and {j} are within snap tolerance of each other"
                );
            }
        }

        for vertex in &vertices {
            let expected_degree = graph
                .edges_iter()
                .filter(|e| e.source == vertex.vertex_id || e.target == vertex.vertex_id)
                .count();
            assert_eq!(vertex.degree, expected_degree);
        }
    }

    fn graph_snap_tolerance_m(ctx: &PipelineContext) -> f64 {
        ctx.config.snap_tolerance_degrees * 111_320.0
    }

    /// invariant 4 (edge-vertex consistency): every edge's geometry starts
    /// and ends at its recorded source/target vertex coordinates.
    #[test]
    fn invariant_edge_vertex_consistency() {
        let trail_a = raw(&[(0.0, 0.0, 100.0), (10.0, 0.0, 110.0)]);
        let trail_b = raw(&[(5.0, -5.0, 100.0), (5.0, 5.0, 120.0)]);
        let ctx = run_trails(vec![trail_a, trail_b]);
        let graph = ctx.workspace.graph().unwrap();

        for edge in graph.edges_iter() {
            let source = graph.get_vertex(&edge.source).unwrap();
            let target = graph.get_vertex(&edge.target).unwrap();
            let (first, last) = edge.endpoints();
            assert!((first.x - source.x()).abs() < 1e-6 && (first.y - source.y()).abs() < 1e-6);
            assert!((last.x - target.x()).abs() < 1e-6 && (last.y - target.y()).abs() < 1e-6);
        }
    }

    /// invariant 8 (round-trip idempotence): running the pipeline twice on
    /// the same input yields the same vertex/edge counts, ids, and route
    /// candidate set.
    #[test]
    fn invariant_round_trip_idempotence() {
        let trails = || {
            vec![
                raw(&[(0.0, 0.0, 100.0), (10.0, 0.0, 110.0)]),
                raw(&[(5.0, -5.0, 100.0), (5.0, 5.0, 120.0)]),
            ]
        };

        let mut config = base_config();
        config.patterns = vec![RoutePattern::new(RouteShape::PointToPoint, 1.0, 0.0, 50.0, 6)];

        let mut ctx_a = PipelineContext::new(config.clone());
        run_all(trails(), &mut ctx_a).unwrap();
        let mut ctx_b = PipelineContext::new(config);
        run_all(trails(), &mut ctx_b).unwrap();

        let graph_a = ctx_a.workspace.graph().unwrap();
        let graph_b = ctx_b.workspace.graph().unwrap();
        assert_eq!(graph_a.n_vertices(), graph_b.n_vertices());
        assert_eq!(graph_a.n_edges(), graph_b.n_edges());
        for (va, vb) in graph_a.vertices_iter().zip(graph_b.vertices_iter()) {
            assert_eq!(va.vertex_id, vb.vertex_id);
            assert!((va.x() - vb.x()).abs() < 1e-12);
            assert!((va.y() - vb.y()).abs() < 1e-12);
        }
        for (ea, eb) in graph_a.edges_iter().zip(graph_b.edges_iter()) {
            assert_eq!(ea.source, eb.source);
            assert_eq!(ea.target, eb.target);
            assert_eq!(ea.geometry, eb.geometry);
        }

        let routes_a: Vec<_> = ctx_a.workspace.routes().iter().map(|r| r.canonical_key()).collect();
        let routes_b: Vec<_> = ctx_b.workspace.routes().iter().map(|r| r.canonical_key()).collect();
        assert_eq!(routes_a, routes_b);
    }
}
