//! Matching of forward and backward colourings into support patterns.

use crate::compatibility::{Color, ColorClasses};
use crate::conjugate_graph::EdgeId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// `(forward colour, backward colour)` seen together on one thread of evidence.
pub type ColorPair = (Color, Color);

/// Distinct support patterns of a vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportPatterns {
    color_pairs: BTreeSet<ColorPair>,
    by_edge: BTreeMap<EdgeId, BTreeSet<ColorPair>>,
    bridged: Vec<EdgeId>,
    one_sided: Vec<EdgeId>,
}

impl SupportPatterns {
    pub fn color_pairs(&self) -> &BTreeSet<ColorPair> {
        &self.color_pairs
    }

    /// Number of distinct copies the vertex stands for. 0 or 1 means no split.
    pub fn multiplicity(&self) -> usize {
        self.color_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.color_pairs.is_empty()
    }

    /// Patterns supported by a near-side edge.
    pub fn patterns_of(&self, edge: EdgeId) -> Option<&BTreeSet<ColorPair>> {
        self.by_edge.get(&edge)
    }

    pub fn by_edge(&self) -> &BTreeMap<EdgeId, BTreeSet<ColorPair>> {
        &self.by_edge
    }

    /// One-sided edges that were matched through a shared far-side edge.
    pub fn bridged(&self) -> &[EdgeId] {
        &self.bridged
    }

    /// Edges with evidence in one direction only that contributed nothing.
    pub fn one_sided(&self) -> &[EdgeId] {
        &self.one_sided
    }

    fn support(&mut self, edge: EdgeId, pair: ColorPair) {
        self.color_pairs.insert(pair);
        self.by_edge.entry(edge).or_default().insert(pair);
    }
}

/// Combine the colourings of both directions.
///
/// A near-side edge coloured in both directions contributes the Cartesian
/// product of its two colour sets. With `bridge_one_sided`, an edge coloured
/// only forward and an edge coloured only backward that share a far-side
/// edge present in both colourings are matched through it and contribute
/// that far-side edge's colour pair. Every other one-sided edge is logged and
/// ignored.
pub fn match_directions(
    forward: &ColorClasses,
    backward: &ColorClasses,
    bridge_one_sided: bool,
) -> SupportPatterns {
    let mut patterns = SupportPatterns::default();
    let mut forward_only = BTreeSet::new();

    for (&edge, forward_colors) in forward.left_colors() {
        let Some(backward_colors) = backward.colors_of_left(edge) else {
            forward_only.insert(edge);
            continue;
        };
        for &c0 in forward_colors {
            for &c1 in backward_colors {
                patterns.support(edge, (c0, c1));
            }
        }
    }
    let mut backward_only: BTreeSet<EdgeId> = backward
        .left_colors()
        .keys()
        .filter(|edge| forward.colors_of_left(**edge).is_none())
        .copied()
        .collect();

    if bridge_one_sided {
        let mut bridged = BTreeSet::new();
        for &right in forward.right_edges() {
            let (Some(c0), Some(c1)) = (forward.color_of(right), backward.color_of(right)) else {
                continue;
            };
            let (Some(ahead), Some(behind)) = (forward.partners_of(right), backward.partners_of(right))
            else {
                continue;
            };
            let ahead: Vec<EdgeId> = ahead.intersection(&forward_only).copied().collect();
            let behind: Vec<EdgeId> = behind.intersection(&backward_only).copied().collect();
            if ahead.is_empty() || behind.is_empty() {
                continue;
            }
            debug!(
                "bridging {:?} and {:?} through {} as ({}, {})",
                ahead, behind, right, c0, c1
            );
            for edge in ahead.into_iter().chain(behind) {
                patterns.support(edge, (c0, c1));
                bridged.insert(edge);
            }
        }
        forward_only.retain(|edge| !bridged.contains(edge));
        backward_only.retain(|edge| !bridged.contains(edge));
        patterns.bridged = bridged.into_iter().collect();
    }

    for edge in forward_only.iter().chain(backward_only.iter()) {
        warn!("an edge {} has paired info in only one direction", edge);
    }
    patterns.one_sided = forward_only.into_iter().chain(backward_only).collect();
    patterns
}
