//! Colouring of the far-side edges paired with a vertex.
//!
//! For one vertex and one direction every edge that some incident edge is
//! paired with gets a colour; far-side edges that touch each other in the
//! graph share a colour. Each incident (near-side) edge then carries the set
//! of colours of its partners.

use crate::conjugate_graph::{ConjugateGraph, EdgeId, VertexId};
use crate::paired_info::PairedInfoSource;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, error, trace};

/// Colour of a connectivity class. Colours start at 1; 0 means unvisited.
pub type Color = u32;

/// Which side of the near-side edge the far-side edge lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Far-side edge ahead (`d > 0`).
    Forward,
    /// Far-side edge behind (`d < 0`).
    Backward,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Forward, Direction::Backward];

    pub fn mult(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }

    /// Observations with zero distance belong to neither direction.
    pub fn admits(self, d: f64) -> bool {
        d * self.mult() > 0.0
    }
}

/// Colouring of the far-side edges of one vertex in one direction.
#[derive(Debug, Clone)]
pub struct ColorClasses {
    right_edges: Vec<EdgeId>,
    right_ids: HashMap<EdgeId, usize>,
    right_to_left: Vec<BTreeSet<EdgeId>>,
    colors: Vec<Color>,
    color_count: Color,
    left_colors: BTreeMap<EdgeId, BTreeSet<Color>>,
    conflicts: usize,
}

impl ColorClasses {
    /// Far-side edges in first-seen order (their compact ids).
    pub fn right_edges(&self) -> &[EdgeId] {
        &self.right_edges
    }

    pub fn is_empty(&self) -> bool {
        self.right_edges.is_empty()
    }

    pub fn color_of(&self, right: EdgeId) -> Option<Color> {
        self.right_ids.get(&right).map(|&id| self.colors[id])
    }

    /// Near-side edges paired with `right` in this direction.
    pub fn partners_of(&self, right: EdgeId) -> Option<&BTreeSet<EdgeId>> {
        self.right_ids.get(&right).map(|&id| &self.right_to_left[id])
    }

    pub fn color_count(&self) -> Color {
        self.color_count
    }

    pub fn left_colors(&self) -> &BTreeMap<EdgeId, BTreeSet<Color>> {
        &self.left_colors
    }

    pub fn colors_of_left(&self, left: EdgeId) -> Option<&BTreeSet<Color>> {
        self.left_colors.get(&left)
    }

    /// Number of colour conflicts met during the traversal.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    /// The colour classes as sets of far-side edges, independent of labels.
    pub fn classes(&self) -> BTreeSet<BTreeSet<EdgeId>> {
        let mut by_color: BTreeMap<Color, BTreeSet<EdgeId>> = BTreeMap::new();
        for (id, &edge) in self.right_edges.iter().enumerate() {
            by_color.entry(self.colors[id]).or_default().insert(edge);
        }
        by_color.into_values().collect()
    }
}

/// Edges reachable from `e` in at most `leap + 1` neighbour steps, excluding `e`.
pub fn neighbours_within<G>(graph: &G, e: EdgeId, leap: usize) -> Vec<EdgeId>
where
    G: ConjugateGraph + ?Sized,
{
    let mut seen = HashSet::new();
    seen.insert(e);
    let mut result = Vec::new();
    let mut frontier = vec![e];
    for _ in 0..=leap {
        let mut next = Vec::new();
        for &edge in &frontier {
            for n in graph.neighbouring_edges(edge) {
                if seen.insert(n) {
                    result.push(n);
                    next.push(n);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    result
}

/// Colour the far-side edges of `vertex` for one direction.
pub fn group<G, P>(
    graph: &G,
    index: &P,
    vertex: VertexId,
    direction: Direction,
    leap: usize,
) -> ColorClasses
where
    G: ConjugateGraph + ?Sized,
    P: PairedInfoSource + ?Sized,
{
    let mut right_edges = Vec::new();
    let mut right_ids: HashMap<EdgeId, usize> = HashMap::new();
    let mut right_to_left: Vec<BTreeSet<EdgeId>> = Vec::new();

    let near_side = graph
        .outgoing_edges(vertex)
        .into_iter()
        .chain(graph.incoming_edges(vertex));
    for near in near_side {
        for info in index.edge_info(near) {
            if !direction.admits(info.d) {
                continue;
            }
            let id = *right_ids.entry(info.second).or_insert_with(|| {
                right_edges.push(info.second);
                right_to_left.push(BTreeSet::new());
                right_edges.len() - 1
            });
            right_to_left[id].insert(info.first);
        }
    }
    debug!("{} {:?}: {} far-side edges", vertex, direction, right_edges.len());

    let adjacency: Vec<Vec<usize>> = right_edges
        .iter()
        .enumerate()
        .map(|(i, &right)| {
            let neighbours = neighbours_within(graph, right, leap);
            trace!("neighbours to {} ({}): {}", i, right, neighbours.len());
            neighbours
                .into_iter()
                .filter_map(|n| right_ids.get(&n).copied())
                .collect()
        })
        .collect();

    let (colors, color_count, conflicts) = paint(&adjacency, &right_edges);

    let mut left_colors: BTreeMap<EdgeId, BTreeSet<Color>> = BTreeMap::new();
    for (id, lefts) in right_to_left.iter().enumerate() {
        for &left in lefts {
            left_colors.entry(left).or_default().insert(colors[id]);
        }
    }

    ColorClasses {
        right_edges,
        right_ids,
        right_to_left,
        colors,
        color_count,
        left_colors,
        conflicts,
    }
}

/// Depth-first colouring with an explicit stack.
///
/// A neighbour already painted with another colour is reported and keeps its
/// colour. Returns the colours, the number of colours and the conflict count.
fn paint(adjacency: &[Vec<usize>], right_edges: &[EdgeId]) -> (Vec<Color>, Color, usize) {
    let mut colors: Vec<Color> = vec![0; adjacency.len()];
    let mut color: Color = 0;
    let mut conflicts = 0;
    let mut stack = Vec::new();

    for seed in 0..adjacency.len() {
        if colors[seed] != 0 {
            continue;
        }
        color += 1;
        colors[seed] = color;
        stack.push(seed);
        while let Some(current) = stack.pop() {
            for &next in &adjacency[current] {
                match colors[next] {
                    0 => {
                        colors[next] = color;
                        stack.push(next);
                    }
                    c if c != color => {
                        error!(
                            "colour conflict: {} reaches {} which already has colour {} (current {})",
                            right_edges[current], right_edges[next], c, color
                        );
                        conflicts += 1;
                    }
                    _ => {}
                }
            }
        }
    }
    (colors, color, conflicts)
}
