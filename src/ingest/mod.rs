//! Text formats: edge lists in, adjacency lists in and out.

mod adjacency;
mod edges;

pub use adjacency::{write_adjacency, write_record_line, AdjacencyReader};
pub use edges::{parse_edge_line, Edge, EdgeReader};
