use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Identifier of a vertex (a k-mer junction) in the assembly graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(u64);

impl VertexId {
    pub fn new(raw: u64) -> Self {
        VertexId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifier of an edge (a unitig) in the assembly graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    pub fn new(raw: u64) -> Self {
        EdgeId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Read-only view of a strand-paired (conjugate) graph.
///
/// Every vertex and edge has a conjugate on the opposite strand. An edge
/// `u -> w` has a conjugate `w' -> u'`. The ids handed to these methods must
/// come from the same graph; implementations may panic on foreign ids.
pub trait ConjugateGraph {
    /// All vertices, in a stable order.
    fn vertices(&self) -> Vec<VertexId>;

    fn outgoing_edges(&self, v: VertexId) -> Vec<EdgeId>;

    fn incoming_edges(&self, v: VertexId) -> Vec<EdgeId>;

    fn conjugate_vertex(&self, v: VertexId) -> VertexId;

    fn conjugate_edge(&self, e: EdgeId) -> EdgeId;

    fn edge_start(&self, e: EdgeId) -> VertexId;

    fn edge_end(&self, e: EdgeId) -> VertexId;

    /// Edges structurally adjacent to `e`, i.e. sharing one of its junctions.
    fn neighbouring_edges(&self, e: EdgeId) -> Vec<EdgeId>;

    fn is_palindromic(&self, v: VertexId) -> bool {
        self.conjugate_vertex(v) == v
    }

    /// One vertex per conjugate pair: the first of the pair in `vertices()` order.
    fn representatives(&self) -> Vec<VertexId> {
        let mut seen = HashSet::new();
        let mut reps = Vec::new();
        for v in self.vertices() {
            if seen.contains(&self.conjugate_vertex(v)) {
                continue;
            }
            seen.insert(v);
            reps.push(v);
        }
        reps
    }
}

/// Serialisable description of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub id: VertexId,
    pub conjugate: VertexId,
}

/// Serialisable description of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub start: VertexId,
    pub end: VertexId,
    pub conjugate: EdgeId,
    pub length: usize,
}

#[derive(Debug, Clone)]
struct VertexEntry {
    conjugate: VertexId,
    outgoing: Vec<EdgeId>,
    incoming: Vec<EdgeId>,
}

impl VertexEntry {
    fn new(conjugate: VertexId) -> Self {
        VertexEntry {
            conjugate,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }
}

/// In-memory conjugate de Bruijn graph.
#[derive(Debug, Clone, Default)]
pub struct AssemblyGraph {
    vertices: BTreeMap<VertexId, VertexEntry>,
    edges: BTreeMap<EdgeId, EdgeRecord>,
    next_vertex: u64,
    next_edge: u64,
}

impl AssemblyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex together with its conjugate and return both.
    pub fn add_vertex_pair(&mut self) -> (VertexId, VertexId) {
        let v = VertexId(self.next_vertex);
        let conj = VertexId(self.next_vertex + 1);
        self.next_vertex += 2;
        self.vertices.insert(v, VertexEntry::new(conj));
        self.vertices.insert(conj, VertexEntry::new(v));
        (v, conj)
    }

    /// Add a vertex that is its own conjugate.
    pub fn add_palindromic_vertex(&mut self) -> VertexId {
        let v = VertexId(self.next_vertex);
        self.next_vertex += 1;
        self.vertices.insert(v, VertexEntry::new(v));
        v
    }

    /// Add `start -> end` and its conjugate `end' -> start'`.
    pub fn add_edge_pair(
        &mut self,
        start: VertexId,
        end: VertexId,
        length: usize,
    ) -> Result<(EdgeId, EdgeId)> {
        let start_conj = self
            .vertices
            .get(&start)
            .map(|entry| entry.conjugate)
            .ok_or(ResolveError::UnknownVertex(start))?;
        let end_conj = self
            .vertices
            .get(&end)
            .map(|entry| entry.conjugate)
            .ok_or(ResolveError::UnknownVertex(end))?;

        let e = EdgeId(self.next_edge);
        let conj = EdgeId(self.next_edge + 1);
        self.next_edge += 2;
        self.attach_edge(EdgeRecord {
            id: e,
            start,
            end,
            conjugate: conj,
            length,
        });
        self.attach_edge(EdgeRecord {
            id: conj,
            start: end_conj,
            end: start_conj,
            conjugate: e,
            length,
        });
        Ok((e, conj))
    }

    /// Build a graph from explicit records, checking the strand invariants.
    pub fn from_records(vertices: &[VertexRecord], edges: &[EdgeRecord]) -> Result<Self> {
        let mut graph = AssemblyGraph::new();
        for record in vertices {
            if graph.vertices.contains_key(&record.id) {
                return Err(ResolveError::DuplicateVertex(record.id));
            }
            graph
                .vertices
                .insert(record.id, VertexEntry::new(record.conjugate));
        }
        for (&v, entry) in &graph.vertices {
            let back = graph
                .vertices
                .get(&entry.conjugate)
                .map(|conj| conj.conjugate)
                .ok_or(ResolveError::UnknownVertex(entry.conjugate))?;
            if back != v {
                return Err(ResolveError::BrokenVertexConjugate {
                    vertex: v,
                    conjugate: entry.conjugate,
                    back,
                });
            }
        }

        let mut by_id = BTreeMap::new();
        for record in edges {
            if by_id.insert(record.id, *record).is_some() {
                return Err(ResolveError::DuplicateEdge(record.id));
            }
            for v in [record.start, record.end] {
                if !graph.vertices.contains_key(&v) {
                    return Err(ResolveError::UnknownVertex(v));
                }
            }
        }
        for record in by_id.values() {
            let conj = by_id
                .get(&record.conjugate)
                .ok_or(ResolveError::UnknownEdge(record.conjugate))?;
            if conj.conjugate != record.id {
                return Err(ResolveError::BrokenEdgeConjugate {
                    edge: record.id,
                    conjugate: conj.id,
                    back: conj.conjugate,
                });
            }
            let mirrored_start = graph.vertices[&record.end].conjugate;
            let mirrored_end = graph.vertices[&record.start].conjugate;
            if conj.start != mirrored_start || conj.end != mirrored_end {
                return Err(ResolveError::MismatchedConjugateEnds {
                    edge: record.id,
                    start: record.start,
                    end: record.end,
                    conjugate: conj.id,
                    conj_start: conj.start,
                    conj_end: conj.end,
                });
            }
            if conj.length != record.length {
                return Err(ResolveError::MismatchedConjugateLength {
                    edge: record.id,
                    length: record.length,
                    conjugate: conj.id,
                    conj_length: conj.length,
                });
            }
        }
        for record in by_id.into_values() {
            graph.attach_edge(record);
        }

        graph.next_vertex = graph.vertices.keys().next_back().map_or(0, |v| v.0 + 1);
        graph.next_edge = graph.edges.keys().next_back().map_or(0, |e| e.0 + 1);
        Ok(graph)
    }

    /// Records describing this graph, in id order.
    pub fn records(&self) -> (Vec<VertexRecord>, Vec<EdgeRecord>) {
        let vertices = self
            .vertices
            .iter()
            .map(|(&id, entry)| VertexRecord {
                id,
                conjugate: entry.conjugate,
            })
            .collect();
        let edges = self.edges.values().copied().collect();
        (vertices, edges)
    }

    fn attach_edge(&mut self, record: EdgeRecord) {
        if let Some(entry) = self.vertices.get_mut(&record.start) {
            entry.outgoing.push(record.id);
        }
        if let Some(entry) = self.vertices.get_mut(&record.end) {
            entry.incoming.push(record.id);
        }
        self.edges.insert(record.id, record);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edges.contains_key(&e)
    }

    pub fn edge_length(&self, e: EdgeId) -> usize {
        self.edges[&e].length
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.edges.values()
    }
}

impl ConjugateGraph for AssemblyGraph {
    fn vertices(&self) -> Vec<VertexId> {
        self.vertices.keys().copied().collect()
    }

    fn outgoing_edges(&self, v: VertexId) -> Vec<EdgeId> {
        self.vertices
            .get(&v)
            .map(|entry| entry.outgoing.clone())
            .unwrap_or_default()
    }

    fn incoming_edges(&self, v: VertexId) -> Vec<EdgeId> {
        self.vertices
            .get(&v)
            .map(|entry| entry.incoming.clone())
            .unwrap_or_default()
    }

    fn conjugate_vertex(&self, v: VertexId) -> VertexId {
        self.vertices[&v].conjugate
    }

    fn conjugate_edge(&self, e: EdgeId) -> EdgeId {
        self.edges[&e].conjugate
    }

    fn edge_start(&self, e: EdgeId) -> VertexId {
        self.edges[&e].start
    }

    fn edge_end(&self, e: EdgeId) -> VertexId {
        self.edges[&e].end
    }

    fn neighbouring_edges(&self, e: EdgeId) -> Vec<EdgeId> {
        let Some(record) = self.edges.get(&e) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for v in [record.start, record.end] {
            let Some(entry) = self.vertices.get(&v) else {
                continue;
            };
            for &other in entry.incoming.iter().chain(entry.outgoing.iter()) {
                if other != e && seen.insert(other) {
                    result.push(other);
                }
            }
        }
        result
    }
}
