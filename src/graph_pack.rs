use crate::conjugate_graph::{AssemblyGraph, EdgeRecord, VertexRecord};
use crate::error::Result;
use crate::paired_info::{PairInfo, PairedInfoIndex};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A graph and its clustered paired info as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPack {
    /// k-mer size; consecutive edges overlap by k bases.
    #[serde(default)]
    pub k: usize,
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub paired_info: Vec<PairInfo>,
}

impl GraphPack {
    pub fn from_parts(k: usize, graph: &AssemblyGraph, index: &PairedInfoIndex) -> Self {
        let (vertices, edges) = graph.records();
        GraphPack {
            k,
            vertices,
            edges,
            paired_info: index.iter().copied().collect(),
        }
    }

    /// Build and validate the graph and the index.
    pub fn to_parts(&self) -> Result<(AssemblyGraph, PairedInfoIndex)> {
        let graph = AssemblyGraph::from_records(&self.vertices, &self.edges)?;
        let index = PairedInfoIndex::from_infos(self.paired_info.iter().copied());
        index.validate_edges(&graph)?;
        Ok((graph, index))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
