//! Benchmarks the Route Enumerator against a synthetic grid network, since
//! the full trail corpus this stage runs against in production isn't
//! available to the benchmark harness.
//!
//! ```
//! cargo bench -p carthorse-core
//! ```

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use geo::{Coord, LineString};

use carthorse_core::model::network::{Edge, EdgeId, Graph, Vertex, VertexId};
use carthorse_core::model::pattern::RoutePattern;
use carthorse_core::model::route::RouteShape;
use carthorse_core::model::trail_id::TrailId;
use carthorse_core::pipeline::{route_enumerator, PipelineConfig, PipelineContext};

/// an `n` x `n` grid of vertices connected by unit-length edges, the same
/// shape a dense trailhead network reduces to after noding.
fn build_grid_graph(n: usize) -> Graph {
    let mut vertices = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let id = row * n + col;
            vertices.push(Vertex::new(id, col as f64 * 0.01, row as f64 * 0.01, 0.0));
        }
    }

    let trail_id = TrailId::new();
    let mut edges = Vec::new();
    let mut push_edge = |a: usize, b: usize, edges: &mut Vec<Edge>| {
        let edge_id = EdgeId(edges.len());
        let va = &vertices[a];
        let vb = &vertices[b];
        let geometry = LineString(vec![
            Coord { x: va.x(), y: va.y() },
            Coord { x: vb.x(), y: vb.y() },
        ]);
        edges.push(Edge::new(
            edge_id,
            VertexId(a),
            VertexId(b),
            geometry,
            vec![0.0, 0.0],
            trail_id,
            "grid trail",
        ));
    };

    for row in 0..n {
        for col in 0..n {
            let id = row * n + col;
            if col + 1 < n {
                push_edge(id, id + 1, &mut edges);
            }
            if row + 1 < n {
                push_edge(id, id + n, &mut edges);
            }
        }
    }

    Graph::build(vertices, edges).expect("synthetic grid graph must be well-formed")
}

fn bench_route_enumerator(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_enumerator");
    group.sample_size(20);

    for &n in &[4usize, 6usize] {
        let graph = build_grid_graph(n);
        let mut config = PipelineConfig::default();
        config.region_key = "bench".to_string();
        config.patterns = vec![
            RoutePattern::new(RouteShape::Loop, 0.04, 10.0, 40.0, 12),
            RoutePattern::new(RouteShape::OutAndBack, 0.03, 5.0, 40.0, 12),
            RoutePattern::new(RouteShape::PointToPoint, 0.03, 5.0, 40.0, 12),
        ];

        group.bench_function(format!("grid_{n}x{n}"), |b| {
            b.iter(|| {
                let mut ctx = PipelineContext::new(config.clone());
                ctx.workspace.set_graph(graph.clone());
                let report = route_enumerator::run(&mut ctx).expect("route enumerator must succeed");
                black_box(report);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_route_enumerator);
criterion_main!(benches);
