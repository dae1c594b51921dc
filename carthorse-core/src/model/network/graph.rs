use indexmap::IndexMap;
use itertools::Itertools;

use super::{classification::VertexClass, Edge, EdgeId, NetworkError, Vertex, VertexId};

/// the routable network assembled by the Noder & Topology Builder
/// (spec.md §4.5).
///
/// Unlike a road network, a trail network is undirected: an `Edge`'s
/// `source`/`target` record the noding order only, and both endpoints are
/// adjacent to it. `adj` therefore maps each vertex to every edge incident
/// on it, together with the vertex at the opposite end.
///
/// All relations are dense integer indices into `vertices`/`edges`, never
/// pointers, per the Design Notes in spec.md §9.
#[derive(Debug, Clone)]
pub struct Graph {
    pub vertices: Box<[Vertex]>,
    pub edges: Box<[Edge]>,
    adj: Box<[IndexMap<EdgeId, VertexId>]>,
}

impl Graph {
    /// assembles a graph from vertices and edges, computing adjacency and
    /// vertex degree. `vertex_id`/`edge_id` fields are trusted to already
    /// be dense and consistent with array position; callers assign those
    /// during noding.
    pub fn build(vertices: Vec<Vertex>, edges: Vec<Edge>) -> Result<Self, NetworkError> {
        let mut adj: Vec<IndexMap<EdgeId, VertexId>> = vec![IndexMap::new(); vertices.len()];

        for edge in &edges {
            let src = edge.source.as_usize();
            let dst = edge.target.as_usize();
            adj.get_mut(src)
                .ok_or(NetworkError::VertexNotFound(edge.source))?
                .insert(edge.edge_id, edge.target);
            if !edge.is_self_loop() {
                adj.get_mut(dst)
                    .ok_or(NetworkError::VertexNotFound(edge.target))?
                    .insert(edge.edge_id, edge.source);
            }
        }

        let mut vertices = vertices;
        for (idx, out) in adj.iter().enumerate() {
            if vertices[idx].vertex_id.as_usize() != idx {
                return Err(NetworkError::VertexNotFound(vertices[idx].vertex_id));
            }
            let degree = out.len();
            vertices[idx].degree = degree;
            vertices[idx].classification = VertexClass::from_degree(degree);
        }

        Ok(Graph {
            vertices: vertices.into_boxed_slice(),
            edges: edges.into_boxed_slice(),
            adj: adj.into_boxed_slice(),
        })
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.n_vertices()).map(VertexId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.n_edges()).map(EdgeId)
    }

    pub fn get_vertex(&self, vertex_id: &VertexId) -> Result<&Vertex, NetworkError> {
        self.vertices
            .get(vertex_id.as_usize())
            .ok_or(NetworkError::VertexNotFound(*vertex_id))
    }

    pub fn get_edge(&self, edge_id: &EdgeId) -> Result<&Edge, NetworkError> {
        self.edges
            .get(edge_id.as_usize())
            .ok_or(NetworkError::EdgeNotFound(*edge_id))
    }

    /// edges incident on `vertex_id`, paired with the vertex at the other
    /// end of each edge.
    pub fn incident_edges(&self, vertex_id: &VertexId) -> Vec<(EdgeId, VertexId)> {
        match self.adj.get(vertex_id.as_usize()) {
            Some(map) => map.iter().map(|(e, v)| (*e, *v)).collect_vec(),
            None => Vec::new(),
        }
    }

    pub fn degree(&self, vertex_id: &VertexId) -> usize {
        self.adj
            .get(vertex_id.as_usize())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// the vertex at the other end of `edge_id` from `vertex_id`.
    pub fn opposite_vertex(
        &self,
        edge_id: &EdgeId,
        vertex_id: &VertexId,
    ) -> Result<VertexId, NetworkError> {
        let edge = self.get_edge(edge_id)?;
        edge.other_endpoint(*vertex_id)
            .ok_or(NetworkError::EdgeNotIncident {
                edge: *edge_id,
                vertex: *vertex_id,
            })
    }

    pub fn edge_triplet(
        &self,
        edge_id: &EdgeId,
    ) -> Result<(&Vertex, &Edge, &Vertex), NetworkError> {
        let edge = self.get_edge(edge_id)?;
        let src = self.get_vertex(&edge.source)?;
        let dst = self.get_vertex(&edge.target)?;
        Ok((src, edge, dst))
    }

    pub fn edges_iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn vertices_iter(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }
}
