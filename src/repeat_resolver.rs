use crate::compatibility::{group, ColorClasses, Direction};
use crate::config::ResolverConfig;
use crate::conjugate_graph::{
    AssemblyGraph, ConjugateGraph, EdgeId, EdgeRecord, VertexId, VertexRecord,
};
use crate::cross_direction::{match_directions, ColorPair, SupportPatterns};
use crate::error::{ResolveError, Result};
use crate::paired_info::{PairedInfoIndex, PairedInfoSource};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, trace};
use uf_rush::UFRush;

/// The edges of a vertex that end up on one copy after a split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexCopy {
    pub patterns: BTreeSet<ColorPair>,
    pub outgoing: Vec<EdgeId>,
    pub incoming: Vec<EdgeId>,
}

/// Why a vertex with multiplicity above one was kept whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The vertex is its own conjugate.
    Palindromic,
    /// Near-side edges supporting several patterns glued them into one copy.
    GluedPatterns,
    /// Some incident edge supports no pattern and has no copy to go to.
    UnsupportedEdges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitOutcome {
    Unchanged,
    Split,
    Skipped(SkipReason),
}

/// Everything learned about one vertex.
#[derive(Debug, Clone)]
pub struct VertexResolution {
    pub vertex: VertexId,
    pub forward: ColorClasses,
    pub backward: ColorClasses,
    pub patterns: SupportPatterns,
    pub copies: Vec<VertexCopy>,
    pub unsupported: Vec<EdgeId>,
    pub outcome: SplitOutcome,
}

impl VertexResolution {
    pub fn multiplicity(&self) -> usize {
        self.patterns.multiplicity()
    }
}

/// Per-vertex line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VertexSummary {
    pub round: usize,
    /// Id in the graph the round ran on.
    pub vertex: VertexId,
    /// Id in the input graph.
    pub original: VertexId,
    pub multiplicity: usize,
    pub copies: usize,
    pub outcome: SplitOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub rounds: usize,
    pub vertices_examined: usize,
    /// Sum of all vertex multiplicities.
    pub multiplicity_sum: usize,
    pub vertices_needing_split: usize,
    pub splits_applied: usize,
    pub splits_skipped: usize,
    pub copies_created: usize,
    pub one_sided_edges: usize,
    pub bridged_edges: usize,
    pub color_conflicts: usize,
}

/// Result of [`RepeatResolver::resolve_repeats`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub graph: AssemblyGraph,
    /// Paired info aligned to `graph`; edge ids survive the rebuild.
    pub index: PairedInfoIndex,
    /// New vertex id to the input vertex it was made from.
    pub vertex_origin: BTreeMap<VertexId, VertexId>,
    pub stats: ResolveStats,
    pub vertices: Vec<VertexSummary>,
}

impl Resolution {
    /// Vertices of the resolved graph that stand for `original`.
    pub fn copies_of(&self, original: VertexId) -> Vec<VertexId> {
        self.vertex_origin
            .iter()
            .filter(|(_, &old)| old == original)
            .map(|(&new, _)| new)
            .collect()
    }
}

/// Splits repeat vertices using paired information.
#[derive(Debug, Clone, Default)]
pub struct RepeatResolver {
    config: ResolverConfig,
}

impl RepeatResolver {
    pub fn new(config: ResolverConfig) -> Self {
        RepeatResolver { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Colour, match and partition the edges of one vertex.
    pub fn resolve_vertex<G, P>(&self, graph: &G, index: &P, vertex: VertexId) -> VertexResolution
    where
        G: ConjugateGraph + ?Sized,
        P: PairedInfoSource + ?Sized,
    {
        debug!("Parsing vertex {}", vertex);
        let forward = group(graph, index, vertex, Direction::Forward, self.config.leap);
        let backward = group(graph, index, vertex, Direction::Backward, self.config.leap);
        let patterns = match_directions(&forward, &backward, self.config.bridge_one_sided);
        let (copies, unsupported) = partition_copies(graph, vertex, &patterns);

        let multiplicity = patterns.multiplicity();
        let outcome = if multiplicity < 2 {
            SplitOutcome::Unchanged
        } else if graph.is_palindromic(vertex) {
            SplitOutcome::Skipped(SkipReason::Palindromic)
        } else if copies.len() < 2 {
            SplitOutcome::Skipped(SkipReason::GluedPatterns)
        } else if !unsupported.is_empty() {
            SplitOutcome::Skipped(SkipReason::UnsupportedEdges)
        } else {
            SplitOutcome::Split
        };
        if multiplicity > 1 {
            trace!("vertex {} splitted to {}", vertex, multiplicity);
        }
        if let SplitOutcome::Skipped(reason) = outcome {
            debug!(
                "vertex {} keeps its edges ({:?}): {} patterns, {} copies, {} unsupported edges",
                vertex,
                reason,
                multiplicity,
                copies.len(),
                unsupported.len()
            );
        }

        VertexResolution {
            vertex,
            forward,
            backward,
            patterns,
            copies,
            unsupported,
            outcome,
        }
    }

    /// Resolve every conjugate pair of vertices and rebuild the graph.
    ///
    /// Each round scans one representative per conjugate pair against the
    /// graph of the previous round; splits are applied all at once when the
    /// round ends. Another round runs only if something was split and
    /// `max_rounds` allows it.
    pub fn resolve_repeats(
        &self,
        graph: &AssemblyGraph,
        index: &PairedInfoIndex,
    ) -> Result<Resolution> {
        self.config.validate()?;
        index.validate_edges(graph)?;
        if self.config.strict_symmetry {
            index.ensure_conjugate_symmetry(graph, self.config.symmetry_tolerance)?;
        }

        info!("resolve_repeats started");
        let mut stats = ResolveStats::default();
        let mut summaries = Vec::new();
        let mut current = graph.clone();
        let mut origin: BTreeMap<VertexId, VertexId> =
            graph.vertices().into_iter().map(|v| (v, v)).collect();

        for round in 1..=self.config.max_rounds {
            let representatives = current.representatives();
            info!(
                "Having {} paired vertices, trying to split (round {})",
                representatives.len(),
                round
            );
            let resolutions = self.scan(&current, index, &representatives)?;

            let mut splits = 0;
            for resolution in &resolutions {
                let multiplicity = resolution.multiplicity();
                stats.vertices_examined += 1;
                stats.multiplicity_sum += multiplicity;
                stats.one_sided_edges += resolution.patterns.one_sided().len();
                stats.bridged_edges += resolution.patterns.bridged().len();
                stats.color_conflicts +=
                    resolution.forward.conflicts() + resolution.backward.conflicts();
                if multiplicity > 1 {
                    stats.vertices_needing_split += 1;
                }
                match resolution.outcome {
                    SplitOutcome::Split => {
                        splits += 1;
                        stats.splits_applied += 1;
                        stats.copies_created += resolution.copies.len();
                    }
                    SplitOutcome::Skipped(_) => stats.splits_skipped += 1,
                    SplitOutcome::Unchanged => {}
                }
                summaries.push(VertexSummary {
                    round,
                    vertex: resolution.vertex,
                    original: origin[&resolution.vertex],
                    multiplicity,
                    copies: resolution.copies.len(),
                    outcome: resolution.outcome,
                });
            }

            let rebuilt = rebuild(&current, &resolutions)?;
            origin = rebuilt
                .origin
                .into_iter()
                .map(|(new, old)| (new, origin[&old]))
                .collect();
            current = rebuilt.graph;
            stats.rounds = round;
            info!(
                "round {}: {} vertices split, graph now has {} vertices",
                round,
                splits,
                current.vertex_count()
            );
            if splits == 0 {
                break;
            }
        }

        info!("total vert {}", stats.multiplicity_sum);
        info!(
            "{} of {} vertex pairs needed a split, {} applied, {} skipped",
            stats.vertices_needing_split,
            stats.vertices_examined,
            stats.splits_applied,
            stats.splits_skipped
        );

        Ok(Resolution {
            graph: current,
            index: index.clone(),
            vertex_origin: origin,
            stats,
            vertices: summaries,
        })
    }

    fn scan(
        &self,
        graph: &AssemblyGraph,
        index: &PairedInfoIndex,
        representatives: &[VertexId],
    ) -> Result<Vec<VertexResolution>> {
        if self.config.threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()?;
            Ok(pool.install(|| {
                representatives
                    .par_iter()
                    .map(|&v| self.resolve_vertex(graph, index, v))
                    .collect()
            }))
        } else {
            Ok(representatives
                .iter()
                .map(|&v| self.resolve_vertex(graph, index, v))
                .collect())
        }
    }
}

/// Group the colour pairs into copies and hand each incident edge to the
/// copy holding its patterns.
///
/// Pairs supported by the same edge cannot be told apart and are united.
/// Returns the copies and the incident edges that support no pattern.
fn partition_copies<G>(
    graph: &G,
    vertex: VertexId,
    patterns: &SupportPatterns,
) -> (Vec<VertexCopy>, Vec<EdgeId>)
where
    G: ConjugateGraph + ?Sized,
{
    let pairs: Vec<ColorPair> = patterns.color_pairs().iter().copied().collect();
    if pairs.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let slot: HashMap<ColorPair, usize> = pairs.iter().enumerate().map(|(i, &p)| (p, i)).collect();

    let uf = UFRush::new(pairs.len());
    for supported in patterns.by_edge().values() {
        let mut iter = supported.iter();
        if let Some(first) = iter.next() {
            for other in iter {
                uf.unite(slot[first], slot[other]);
            }
        }
    }

    let mut copies: Vec<VertexCopy> = Vec::new();
    let mut copy_of_root: HashMap<usize, usize> = HashMap::new();
    for (i, &pair) in pairs.iter().enumerate() {
        let idx = *copy_of_root.entry(uf.find(i)).or_insert_with(|| {
            copies.push(VertexCopy::default());
            copies.len() - 1
        });
        copies[idx].patterns.insert(pair);
    }

    let copy_of_edge = |e: EdgeId| {
        patterns
            .patterns_of(e)
            .and_then(|supported| supported.iter().next())
            .map(|pair| copy_of_root[&uf.find(slot[pair])])
    };
    let mut unsupported = Vec::new();
    for e in graph.outgoing_edges(vertex) {
        match copy_of_edge(e) {
            Some(idx) => copies[idx].outgoing.push(e),
            None => unsupported.push(e),
        }
    }
    for e in graph.incoming_edges(vertex) {
        match copy_of_edge(e) {
            Some(idx) => copies[idx].incoming.push(e),
            None if !unsupported.contains(&e) => unsupported.push(e),
            None => {}
        }
    }
    (copies, unsupported)
}

struct Rebuilt {
    graph: AssemblyGraph,
    origin: BTreeMap<VertexId, VertexId>,
}

/// Build the graph of the next round: split vertices become their copies,
/// mirrored on the conjugate strand, every other vertex is carried over.
fn rebuild(graph: &AssemblyGraph, resolutions: &[VertexResolution]) -> Result<Rebuilt> {
    let split: HashMap<VertexId, &VertexResolution> = resolutions
        .iter()
        .filter(|r| r.outcome == SplitOutcome::Split)
        .map(|r| (r.vertex, r))
        .collect();

    let mut next = 0u64;
    let mut vertices = Vec::new();
    let mut origin: BTreeMap<VertexId, VertexId> = BTreeMap::new();
    let mut whole: HashMap<VertexId, VertexId> = HashMap::new();
    let mut start_of: HashMap<EdgeId, VertexId> = HashMap::new();
    let mut end_of: HashMap<EdgeId, VertexId> = HashMap::new();

    let mut new_pair = |old: VertexId, old_conj: VertexId, vertices: &mut Vec<VertexRecord>| {
        let v = VertexId::new(next);
        let conj = VertexId::new(next + 1);
        next += 2;
        vertices.push(VertexRecord {
            id: v,
            conjugate: conj,
        });
        vertices.push(VertexRecord {
            id: conj,
            conjugate: v,
        });
        origin.insert(v, old);
        origin.insert(conj, old_conj);
        (v, conj)
    };

    let mut palindromes = Vec::new();
    for v in graph.representatives() {
        let conj = graph.conjugate_vertex(v);
        if conj == v {
            palindromes.push(v);
            continue;
        }
        match split.get(&v) {
            Some(resolution) => {
                for copy in &resolution.copies {
                    let (c, c_conj) = new_pair(v, conj, &mut vertices);
                    for &e in &copy.outgoing {
                        start_of.insert(e, c);
                        end_of.insert(graph.conjugate_edge(e), c_conj);
                    }
                    for &e in &copy.incoming {
                        end_of.insert(e, c);
                        start_of.insert(graph.conjugate_edge(e), c_conj);
                    }
                }
            }
            None => {
                let (c, c_conj) = new_pair(v, conj, &mut vertices);
                whole.insert(v, c);
                whole.insert(conj, c_conj);
            }
        }
    }
    for v in palindromes {
        let id = VertexId::new(next);
        next += 1;
        vertices.push(VertexRecord { id, conjugate: id });
        origin.insert(id, v);
        whole.insert(v, id);
    }

    let mut edges = Vec::with_capacity(graph.edge_count());
    for record in graph.edges() {
        let start = start_of
            .get(&record.id)
            .or_else(|| whole.get(&record.start))
            .copied()
            .ok_or(ResolveError::UnknownVertex(record.start))?;
        let end = end_of
            .get(&record.id)
            .or_else(|| whole.get(&record.end))
            .copied()
            .ok_or(ResolveError::UnknownVertex(record.end))?;
        edges.push(EdgeRecord {
            start,
            end,
            ..*record
        });
    }

    let graph = AssemblyGraph::from_records(&vertices, &edges)?;
    Ok(Rebuilt { graph, origin })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paired_info::PairInfo;

    struct Star {
        graph: AssemblyGraph,
        v: VertexId,
        a: EdgeId,
        b: EdgeId,
        c: EdgeId,
        d: EdgeId,
        x: EdgeId,
        y: EdgeId,
    }

    /// Vertex `v` with outgoing `a`, `b`, incoming `c`, `d`, and two far
    /// edges `x`, `y` elsewhere in the graph.
    fn star() -> Star {
        let mut graph = AssemblyGraph::new();
        let (v, _) = graph.add_vertex_pair();
        let (a_end, _) = graph.add_vertex_pair();
        let (b_end, _) = graph.add_vertex_pair();
        let (c_start, _) = graph.add_vertex_pair();
        let (d_start, _) = graph.add_vertex_pair();
        let (x0, _) = graph.add_vertex_pair();
        let (x1, _) = graph.add_vertex_pair();
        let (y0, _) = graph.add_vertex_pair();
        let (y1, _) = graph.add_vertex_pair();
        let (a, _) = graph.add_edge_pair(v, a_end, 100).unwrap();
        let (b, _) = graph.add_edge_pair(v, b_end, 100).unwrap();
        let (c, _) = graph.add_edge_pair(c_start, v, 100).unwrap();
        let (d, _) = graph.add_edge_pair(d_start, v, 100).unwrap();
        let (x, _) = graph.add_edge_pair(x0, x1, 100).unwrap();
        let (y, _) = graph.add_edge_pair(y0, y1, 100).unwrap();
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

    fn two_copy_index(s: &Star) -> PairedInfoIndex {
        PairedInfoIndex::from_infos([
            PairInfo::new(s.a, s.x, 10.0, 1.0),
            PairInfo::new(s.b, s.y, 10.0, 1.0),
            PairInfo::new(s.c, s.x, -10.0, 1.0),
            PairInfo::new(s.d, s.y, -10.0, 1.0),
        ])
    }

    #[test]
    fn test_partition_two_copies() {
        let s = star();
        let index = two_copy_index(&s);
        let resolution = RepeatResolver::default().resolve_vertex(&s.graph, &index, s.v);

        assert_eq!(resolution.multiplicity(), 2);
        assert_eq!(resolution.outcome, SplitOutcome::Split);
        assert_eq!(resolution.copies.len(), 2);
        assert_eq!(resolution.copies[0].outgoing, vec![s.a]);
        assert_eq!(resolution.copies[0].incoming, vec![s.c]);
        assert_eq!(resolution.copies[1].outgoing, vec![s.b]);
        assert_eq!(resolution.copies[1].incoming, vec![s.d]);
        assert!(resolution.unsupported.is_empty());
    }

    #[test]
    fn test_rebuild_splits_vertex_and_its_conjugate() {
        let s = star();
        let index = two_copy_index(&s);
        let resolution = RepeatResolver::default()
            .resolve_repeats(&s.graph, &index)
            .unwrap();
        let g = &resolution.graph;

        assert_eq!(g.vertex_count(), s.graph.vertex_count() + 2);
        assert_eq!(g.edge_count(), s.graph.edge_count());
        assert_eq!(resolution.stats.splits_applied, 1);
        assert_eq!(resolution.stats.copies_created, 2);

        let first = g.edge_start(s.a);
        let second = g.edge_start(s.b);
        assert_ne!(first, second);
        assert_eq!(g.edge_end(s.c), first);
        assert_eq!(g.edge_end(s.d), second);
        assert_eq!(g.outgoing_edges(first), vec![s.a]);
        assert_eq!(g.incoming_edges(second), vec![s.d]);

        let conj = g.conjugate_vertex(first);
        assert_eq!(g.edge_end(g.conjugate_edge(s.a)), conj);
        assert_eq!(g.edge_start(g.conjugate_edge(s.c)), conj);

        let mut copies = resolution.copies_of(s.v);
        copies.sort();
        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(copies, expected);
        assert_eq!(resolution.index.len(), index.len());
    }

    #[test]
    fn test_pattern_shared_by_one_edge_glues_copies() {
        let s = star();
        let p = s.y;
        let index = PairedInfoIndex::from_infos([
            PairInfo::new(s.a, s.x, 10.0, 1.0),
            PairInfo::new(s.a, s.c, 10.0, 1.0),
            PairInfo::new(s.a, p, -10.0, 1.0),
            PairInfo::new(s.b, s.x, 10.0, 1.0),
            PairInfo::new(s.b, p, -10.0, 1.0),
        ]);
        let resolution = RepeatResolver::default().resolve_vertex(&s.graph, &index, s.v);
        assert_eq!(resolution.multiplicity(), 2);
        assert_eq!(resolution.copies.len(), 1);
        assert_eq!(
            resolution.outcome,
            SplitOutcome::Skipped(SkipReason::GluedPatterns)
        );
    }

    #[test]
    fn test_unsupported_edge_keeps_vertex_whole() {
        let mut s = star();
        let (z_end, _) = s.graph.add_vertex_pair();
        s.graph.add_edge_pair(s.v, z_end, 100).unwrap();
        let index = two_copy_index(&s);

        let resolver = RepeatResolver::default();
        let resolution = resolver.resolve_vertex(&s.graph, &index, s.v);
        assert_eq!(resolution.multiplicity(), 2);
        assert_eq!(resolution.unsupported.len(), 1);
        assert_eq!(
            resolution.outcome,
            SplitOutcome::Skipped(SkipReason::UnsupportedEdges)
        );

        let resolved = resolver.resolve_repeats(&s.graph, &index).unwrap();
        assert_eq!(resolved.graph.vertex_count(), s.graph.vertex_count());
        assert_eq!(resolved.stats.splits_skipped, 1);
        assert_eq!(resolved.stats.splits_applied, 0);
    }

    #[test]
    fn test_palindromic_vertex_is_not_split() {
        let mut graph = AssemblyGraph::new();
        let p = graph.add_palindromic_vertex();
        let ends: Vec<VertexId> = (0..6).map(|_| graph.add_vertex_pair().0).collect();
        let (a, _) = graph.add_edge_pair(p, ends[0], 50).unwrap();
        let (b, _) = graph.add_edge_pair(p, ends[1], 50).unwrap();
        let (c, _) = graph.add_edge_pair(ends[2], p, 50).unwrap();
        let (d, _) = graph.add_edge_pair(ends[3], p, 50).unwrap();
        let (x, _) = graph.add_edge_pair(ends[4], ends[4], 50).unwrap();
        let (y, _) = graph.add_edge_pair(ends[5], ends[5], 50).unwrap();
        let index = PairedInfoIndex::from_infos([
            PairInfo::new(a, x, 10.0, 1.0),
            PairInfo::new(b, y, 10.0, 1.0),
            PairInfo::new(c, x, -10.0, 1.0),
            PairInfo::new(d, y, -10.0, 1.0),
        ]);

        let resolver = RepeatResolver::default();
        let resolution = resolver.resolve_vertex(&graph, &index, p);
        assert_eq!(resolution.multiplicity(), 2);
        assert_eq!(
            resolution.outcome,
            SplitOutcome::Skipped(SkipReason::Palindromic)
        );
        let resolved = resolver.resolve_repeats(&graph, &index).unwrap();
        assert_eq!(resolved.graph.vertex_count(), graph.vertex_count());
        assert_eq!(resolved.copies_of(p).len(), 1);
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        let s = star();
        let index = two_copy_index(&s);
        let sequential = RepeatResolver::default()
            .resolve_repeats(&s.graph, &index)
            .unwrap();
        let parallel = RepeatResolver::new(ResolverConfig {
            threads: 4,
            ..ResolverConfig::default()
        })
        .resolve_repeats(&s.graph, &index)
        .unwrap();

        assert_eq!(sequential.stats, parallel.stats);
        assert_eq!(sequential.vertices, parallel.vertices);
        assert_eq!(sequential.graph.records(), parallel.graph.records());
    }

    #[test]
    fn test_second_round_reaches_fixed_point() {
        let s = star();
        let index = two_copy_index(&s);
        let resolution = RepeatResolver::new(ResolverConfig {
            max_rounds: 5,
            ..ResolverConfig::default()
        })
        .resolve_repeats(&s.graph, &index)
        .unwrap();

        assert_eq!(resolution.stats.rounds, 2);
        assert_eq!(resolution.stats.splits_applied, 1);
        assert_eq!(resolution.copies_of(s.v).len(), 2);
        assert!(resolution
            .vertices
            .iter()
            .filter(|summary| summary.round == 2)
            .all(|summary| summary.outcome != SplitOutcome::Split));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let s = star();
        let resolver = RepeatResolver::new(ResolverConfig {
            max_rounds: 0,
            ..ResolverConfig::default()
        });
        let err = resolver
            .resolve_repeats(&s.graph, &PairedInfoIndex::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfig { .. }));
    }
}
