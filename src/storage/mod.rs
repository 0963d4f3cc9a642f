#![forbid(unsafe_code)]
//! Flat-array record store.
//!
//! A store is one contiguous array of [`Element`](crate::types::Element)s, each record
//! terminated by [`SEPARATOR`](crate::types::SEPARATOR), plus a lookup table holding one
//! [`Span`] per record. [`StoreBuilder`] lays records out in memory and [`StoreWriter`]
//! streams them into a single-file container that [`StoreReader`] serves with positioned
//! range reads.

mod builder;
mod flat;
mod header;
mod lookup;
mod options;
mod reader;
mod writer;

pub use builder::{build, StoreBuilder};
pub use flat::{check_range, read_one, read_range, resolve_range, split_records, FlatStore};
pub use header::{StoreHeader, HEADER_LEN, MAGIC, VERSION_MAJOR, VERSION_MINOR};
pub use lookup::{OffsetCursor, Span, MAX_OFFSET, SPAN_LEN};
pub use options::StoreOptions;
pub use reader::StoreReader;
pub use writer::{write_store, BuildSummary, StoreWriter};

pub(crate) use flat::ChainCheck;
