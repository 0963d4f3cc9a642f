//! Dense adjacency storage for sparse edge lists.
//!
//! `flatadj` renumbers an arbitrarily numbered, undirected edge list into dense vertex
//! IDs ([`remap`]), lays the resulting neighbor lists out as one flat array plus a lookup
//! table ([`storage`]), and serves contiguous record ranges back with a single bounded
//! read.

#![warn(missing_docs)]

pub mod admin;
pub mod cli;
pub mod compare;
pub mod ingest;
mod logging;
pub mod primitives;
pub mod remap;
pub mod storage;
pub mod types;

pub use logging::init_logging;
pub use remap::{remap, remap_stream, RemapTable, RemappedGraph};
pub use storage::{
    build, read_range, write_store, FlatStore, Span, StoreBuilder, StoreOptions, StoreReader,
    StoreWriter,
};
pub use types::{DenseId, Element, FlatAdjError, Result, VertexId, SEPARATOR};
