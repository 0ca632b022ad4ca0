#![allow(dead_code)]

use repeatrush::conjugate_graph::{AssemblyGraph, EdgeId, VertexId};
use repeatrush::paired_info::{PairInfo, PairedInfoIndex};

/// Vertex `v` with outgoing `a`, `b` and incoming `c`, `d`, plus two far
/// edges `x` and `y`. With `touching` set, `y` starts where `x` ends.
pub struct Star {
    pub graph: AssemblyGraph,
    pub v: VertexId,
    pub a: EdgeId,
    pub b: EdgeId,
    pub c: EdgeId,
    pub d: EdgeId,
    pub x: EdgeId,
    pub y: EdgeId,
}

pub fn star(touching: bool) -> Star {
    let mut graph = AssemblyGraph::new();
    let (v, _) = graph.add_vertex_pair();
    let (a_end, _) = graph.add_vertex_pair();
    let (b_end, _) = graph.add_vertex_pair();
    let (c_start, _) = graph.add_vertex_pair();
    let (d_start, _) = graph.add_vertex_pair();
    let (x0, _) = graph.add_vertex_pair();
    let (x1, _) = graph.add_vertex_pair();
    let (y1, _) = graph.add_vertex_pair();
    let (a, _) = graph.add_edge_pair(v, a_end, 500).unwrap();
    let (b, _) = graph.add_edge_pair(v, b_end, 500).unwrap();
    let (c, _) = graph.add_edge_pair(c_start, v, 500).unwrap();
    let (d, _) = graph.add_edge_pair(d_start, v, 500).unwrap();
    let (x, _) = graph.add_edge_pair(x0, x1, 300).unwrap();
    let y = if touching {
        graph.add_edge_pair(x1, y1, 300).unwrap().0
    } else {
        let (y0, _) = graph.add_vertex_pair();
        graph.add_edge_pair(y0, y1, 300).unwrap().0
    };
    Star {
        graph,
        v,
        a,
        b,
        c,
        d,
        x,
        y,
    }
}

/// `(A,X,+10)`, `(B,Y,+10)`, `(C,X,-10)`, `(D,Y,-10)`.
pub fn two_thread_index(s: &Star) -> PairedInfoIndex {
    PairedInfoIndex::from_infos([
        PairInfo::new(s.a, s.x, 10.0, 1.0),
        PairInfo::new(s.b, s.y, 10.0, 1.0),
        PairInfo::new(s.c, s.x, -10.0, 1.0),
        PairInfo::new(s.d, s.y, -10.0, 1.0),
    ])
}

/// A self-loop on a fresh vertex; touches nothing else.
pub fn isolated_edge(graph: &mut AssemblyGraph) -> EdgeId {
    let (p, _) = graph.add_vertex_pair();
    graph.add_edge_pair(p, p, 200).unwrap().0
}
