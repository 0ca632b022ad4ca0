//! Write an AssemblyGraph as GFA 1.0: one segment per conjugate edge pair,
//! links where one edge enters the junction another one leaves.
use crate::conjugate_graph::{AssemblyGraph, ConjugateGraph, EdgeId};
use crate::error::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// A segment with an orientation.
/// The least significant bit holds the orientation (1 = reverse), the rest
/// the segment id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentHandle(u64);

impl SegmentHandle {
    pub fn new(segment: u64, is_reverse: bool) -> Self {
        SegmentHandle((segment << 1) | is_reverse as u64)
    }

    /// The handle under which `e` is written: the smaller id of the
    /// conjugate pair names the segment, the other one reads it reversed.
    pub fn of_edge(graph: &AssemblyGraph, e: EdgeId) -> Self {
        let conj = graph.conjugate_edge(e);
        if e <= conj {
            Self::new(e.as_u64(), false)
        } else {
            Self::new(conj.as_u64(), true)
        }
    }

    pub fn segment(&self) -> u64 {
        self.0 >> 1
    }

    pub fn is_reverse(&self) -> bool {
        (self.0 & 1) == 1
    }

    pub fn orientation_char(&self) -> char {
        if self.is_reverse() {
            '-'
        } else {
            '+'
        }
    }

    pub fn flip(&self) -> Self {
        SegmentHandle(self.0 ^ 1)
    }
}

impl fmt::Display for SegmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.segment(), self.orientation_char())
    }
}

/// A GFA link between two oriented segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    pub from: SegmentHandle,
    pub to: SegmentHandle,
}

impl Link {
    /// The link and its reverse complement share one canonical form.
    pub fn canonical(&self) -> Self {
        let flipped = Link {
            from: self.to.flip(),
            to: self.from.flip(),
        };
        if *self <= flipped {
            *self
        } else {
            flipped
        }
    }
}

/// Canonical links of the graph, each reported once per strand pair.
pub fn collect_links(graph: &AssemblyGraph) -> BTreeSet<Link> {
    let mut links = BTreeSet::new();
    for v in graph.vertices() {
        let incoming = graph.incoming_edges(v);
        let outgoing = graph.outgoing_edges(v);
        for &a in &incoming {
            for &b in &outgoing {
                let link = Link {
                    from: SegmentHandle::of_edge(graph, a),
                    to: SegmentHandle::of_edge(graph, b),
                };
                links.insert(link.canonical());
            }
        }
    }
    links
}

pub fn write_gfa<W: Write>(graph: &AssemblyGraph, k: usize, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "H\tVN:Z:1.0")?;

    for record in graph.edges() {
        if record.id > record.conjugate {
            continue;
        }
        writeln!(
            writer,
            "S\t{}\t*\tLN:i:{}",
            record.id.as_u64(),
            record.length
        )?;
    }

    for link in collect_links(graph) {
        writeln!(
            writer,
            "L\t{}\t{}\t{}\t{}\t{}M",
            link.from.segment(),
            link.from.orientation_char(),
            link.to.segment(),
            link.to.orientation_char(),
            k
        )?;
    }
    Ok(())
}

pub fn write_gfa_file<P: AsRef<Path>>(graph: &AssemblyGraph, k: usize, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_gfa(graph, k, &mut writer)?;
    writer.flush()?;
    Ok(())
}
