pub mod compatibility;
pub mod config;
pub mod conjugate_graph;
pub mod cross_direction;
pub mod error;
pub mod gfa_writer;
pub mod graph_pack;
pub mod paired_info;
pub mod repeat_resolver;
pub mod repeatrush;

pub use config::ResolverConfig;
pub use conjugate_graph::{AssemblyGraph, ConjugateGraph, EdgeId, VertexId};
pub use error::{ResolveError, Result};
pub use paired_info::{PairInfo, PairedInfoIndex, PairedInfoSource};
pub use repeat_resolver::{RepeatResolver, Resolution};
pub use repeatrush::{run_repeatrush, Args};
