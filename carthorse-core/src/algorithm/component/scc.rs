use std::collections::HashSet;

use crate::model::network::{Graph, NetworkError, VertexId};

/// depth-first traversal that records vertices in post-order, the first
/// pass of Kosaraju's algorithm.
///
/// # Errors
///
/// Returns an error if the `graph` has an issue like a non-existing vertex.
pub fn depth_first_search(
    graph: &Graph,
    vertex: &VertexId,
    visited: &mut HashSet<VertexId>,
    stack: &mut Vec<VertexId>,
) -> Result<(), NetworkError> {
    if visited.contains(vertex) {
        return Ok(());
    }

    visited.insert(*vertex);

    for (_edge_id, terminal) in graph.incident_edges(vertex) {
        depth_first_search(graph, &terminal, visited, stack)?;
    }

    stack.push(*vertex);

    Ok(())
}

/// finds all connected components of the network.
///
/// The trail graph is undirected, so this reduces to ordinary connected
/// components rather than Kosaraju's full two-pass SCC; the DFS-order
/// structure is kept because the Hawick circuit enumerator in
/// [`super::search::hawick`] builds on the same traversal.
///
/// # Errors
///
/// Returns an error if the `graph` has an issue like a non-existing vertex.
pub fn all_connected_components(graph: &Graph) -> Result<Vec<Vec<VertexId>>, NetworkError> {
    let mut visited: HashSet<VertexId> = HashSet::new();
    let mut result: Vec<Vec<VertexId>> = Vec::new();

    for vertex_id in graph.vertex_ids() {
        if visited.contains(&vertex_id) {
            continue;
        }
        let mut component: Vec<VertexId> = Vec::new();
        depth_first_search(graph, &vertex_id, &mut visited, &mut component)?;
        result.push(component);
    }

    Ok(result)
}

/// finds the largest connected component of the network, typically the
/// one the Route Enumerator should search within.
///
/// # Errors
///
/// Returns an error if the `graph` has an issue like a non-existing vertex.
pub fn largest_connected_component(graph: &Graph) -> Result<Vec<VertexId>, NetworkError> {
    let components = all_connected_components(graph)?;
    Ok(components
        .into_iter()
        .max_by_key(|c| c.len())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use geo::{Coord, LineString};

    use super::*;
    use crate::model::network::{Edge, Vertex};
    use crate::model::trail_id::TrailId;

    fn build_mock_graph() -> Graph {
        let vertices = vec![
            Vertex::new(0, 0.0, 0.0, 0.0),
            Vertex::new(1, 1.0, 1.0, 0.0),
            Vertex::new(2, 2.0, 2.0, 0.0),
            Vertex::new(3, 3.0, 3.0, 0.0),
            Vertex::new(4, 4.0, 4.0, 0.0),
        ];

        let mk_edge = |id: usize, src: usize, dst: usize| {
            let geometry = LineString(vec![
                Coord {
                    x: vertices[src].x(),
                    y: vertices[src].y(),
                },
                Coord {
                    x: vertices[dst].x(),
                    y: vertices[dst].y(),
                },
            ]);
            Edge::new(
                id.into(),
                src.into(),
                dst.into(),
                geometry,
                vec![0.0, 0.0],
                TrailId::new(),
                "mock",
            )
        };

        let edges = vec![
            mk_edge(0, 0, 1),
            mk_edge(1, 1, 2),
            mk_edge(2, 2, 3),
            mk_edge(3, 3, 0),
        ];

        Graph::build(vertices, edges).unwrap()
    }

    #[test]
    fn test_largest_connected_component() {
        let graph = build_mock_graph();
        let component = largest_connected_component(&graph).unwrap();
        assert_eq!(component.len(), 4);
    }

    #[test]
    fn test_all_connected_components() {
        let graph = build_mock_graph();
        let components = all_connected_components(&graph).unwrap();
        assert_eq!(components.len(), 2);
    }
}
