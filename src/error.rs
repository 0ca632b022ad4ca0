use crate::conjugate_graph::{EdgeId, VertexId};
use thiserror::Error;

/// Failures raised while building or loading the inputs of a resolution run.
///
/// Anomalies met while resolving a vertex (colour conflicts, one-sided
/// evidence) are logged instead and never show up here.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("duplicate vertex id {0}")]
    DuplicateVertex(VertexId),

    #[error("duplicate edge id {0}")]
    DuplicateEdge(EdgeId),

    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),

    #[error("vertex {vertex} has conjugate {conjugate} whose conjugate is {back}")]
    BrokenVertexConjugate {
        vertex: VertexId,
        conjugate: VertexId,
        back: VertexId,
    },

    #[error("edge {edge} has conjugate {conjugate} whose conjugate is {back}")]
    BrokenEdgeConjugate {
        edge: EdgeId,
        conjugate: EdgeId,
        back: EdgeId,
    },

    #[error("edge {edge} ({start} -> {end}) does not mirror its conjugate {conjugate} ({conj_start} -> {conj_end})")]
    MismatchedConjugateEnds {
        edge: EdgeId,
        start: VertexId,
        end: VertexId,
        conjugate: EdgeId,
        conj_start: VertexId,
        conj_end: VertexId,
    },

    #[error("edge {edge} has length {length} but its conjugate {conjugate} has length {conj_length}")]
    MismatchedConjugateLength {
        edge: EdgeId,
        length: usize,
        conjugate: EdgeId,
        conj_length: usize,
    },

    #[error("paired info ({first}, {second}, {d}) refers to an edge missing from the graph")]
    DanglingPairInfo { first: EdgeId, second: EdgeId, d: f64 },

    #[error("paired info is not strand symmetric: {missing} conjugate observations missing, first is ({first}, {second}, {d})")]
    AsymmetricPairInfo {
        missing: usize,
        first: EdgeId,
        second: EdgeId,
        d: f64,
    },

    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
