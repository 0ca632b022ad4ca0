use crate::conjugate_graph::{AssemblyGraph, ConjugateGraph, EdgeId};
use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One clustered paired-read observation: `second` lies `d` bases
/// downstream of `first` (upstream when `d` is negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairInfo {
    pub first: EdgeId,
    pub second: EdgeId,
    pub d: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl PairInfo {
    pub fn new(first: EdgeId, second: EdgeId, d: f64, weight: f64) -> Self {
        PairInfo {
            first,
            second,
            d,
            weight,
        }
    }

    /// The same observation seen from `second`.
    pub fn mirrored(&self) -> Self {
        PairInfo {
            first: self.second,
            second: self.first,
            d: -self.d,
            weight: self.weight,
        }
    }
}

/// Read-only query surface over paired information.
pub trait PairedInfoSource {
    /// Observations whose `first` edge is `e`. Empty when there are none.
    fn edge_info(&self, e: EdgeId) -> &[PairInfo];
}

/// Paired information keyed by the left edge.
#[derive(Debug, Clone, Default)]
pub struct PairedInfoIndex {
    by_edge: BTreeMap<EdgeId, Vec<PairInfo>>,
    len: usize,
}

impl PairedInfoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_infos<I: IntoIterator<Item = PairInfo>>(infos: I) -> Self {
        let mut index = Self::new();
        for info in infos {
            index.insert(info);
        }
        index
    }

    pub fn insert(&mut self, info: PairInfo) {
        self.by_edge.entry(info.first).or_default().push(info);
        self.len += 1;
    }

    /// Insert `info` and its view from the other edge.
    pub fn insert_with_mirror(&mut self, info: PairInfo) {
        self.insert(info);
        if info.first != info.second || info.d != 0.0 {
            self.insert(info.mirrored());
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairInfo> {
        self.by_edge.values().flatten()
    }

    /// Fails on the first observation that names an edge the graph lacks.
    pub fn validate_edges(&self, graph: &AssemblyGraph) -> Result<()> {
        match self
            .iter()
            .find(|info| !graph.contains_edge(info.first) || !graph.contains_edge(info.second))
        {
            Some(info) => Err(ResolveError::DanglingPairInfo {
                first: info.first,
                second: info.second,
                d: info.d,
            }),
            None => Ok(()),
        }
    }

    /// Observations whose strand-conjugate counterpart is absent.
    ///
    /// The conjugate of `(a, b, d)` is `(b', a', d + len(b) - len(a))`.
    pub fn check_conjugate_symmetry(&self, graph: &AssemblyGraph, tolerance: f64) -> Vec<PairInfo> {
        self.iter()
            .filter(|info| {
                let first = graph.conjugate_edge(info.second);
                let second = graph.conjugate_edge(info.first);
                let d = info.d + graph.edge_length(info.second) as f64
                    - graph.edge_length(info.first) as f64;
                !self
                    .edge_info(first)
                    .iter()
                    .any(|other| other.second == second && (other.d - d).abs() <= tolerance)
            })
            .copied()
            .collect()
    }

    /// Like [`check_conjugate_symmetry`](Self::check_conjugate_symmetry), as an error.
    pub fn ensure_conjugate_symmetry(&self, graph: &AssemblyGraph, tolerance: f64) -> Result<()> {
        let missing = self.check_conjugate_symmetry(graph, tolerance);
        match missing.first() {
            Some(info) => Err(ResolveError::AsymmetricPairInfo {
                missing: missing.len(),
                first: info.first,
                second: info.second,
                d: info.d,
            }),
            None => Ok(()),
        }
    }
}

impl PairedInfoSource for PairedInfoIndex {
    fn edge_info(&self, e: EdgeId) -> &[PairInfo] {
        self.by_edge.get(&e).map(Vec::as_slice).unwrap_or(&[])
    }
}
