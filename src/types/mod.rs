#![forbid(unsafe_code)]
//! Identifiers, element constants and the crate-wide error type.

use std::fmt;

/// Checksum helpers used by the store container.
pub mod checksum;

/// A single value in the flat array.
pub type Element = i32;

/// Value terminating every record in the flat array. Never a legal element.
pub const SEPARATOR: Element = -1;

/// Original, sparse vertex identifier as it appears in an edge list.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VertexId(pub i64);

/// Dense vertex identifier in `[0, vertex_count)`.
///
/// Dense IDs never exceed [`DenseId::MAX`], so every one of them is a storable,
/// non-separator [`Element`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct DenseId(pub u32);

impl DenseId {
    /// Largest dense ID that still fits a non-negative `i32` element.
    pub const MAX: DenseId = DenseId(i32::MAX as u32);

    /// Converts a position into a dense ID, failing when it exceeds [`DenseId::MAX`].
    pub fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .ok()
            .filter(|&raw| raw <= Self::MAX.0)
            .map(DenseId)
            .ok_or(FlatAdjError::Overflow("dense vertex id exceeds i32::MAX"))
    }

    /// Returns the dense ID as a store element.
    pub const fn as_element(self) -> Element {
        // bounded by DenseId::MAX at construction
        self.0 as Element
    }

    /// Returns the dense ID as a record index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for VertexId {
    fn from(value: i64) -> Self {
        VertexId(value)
    }
}

/// Errors raised while ingesting, building or reading a store.
#[derive(thiserror::Error, Debug)]
pub enum FlatAdjError {
    /// Underlying file system failure.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed line or token in text input.
    #[error("parse error on line {line}: {reason}")]
    Parse {
        /// 1-based line number of the offending input.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
    /// Requested record range lies outside the store.
    #[error("record range {start}..{end} outside store of {count} records")]
    Range {
        /// Requested first record.
        start: u64,
        /// Requested end record (exclusive).
        end: u64,
        /// Number of records in the store.
        count: u64,
    },
    /// An offset, cursor or identifier exceeded its integer width.
    #[error("overflow: {0}")]
    Overflow(&'static str),
    /// A record contains the separator value.
    #[error("record {record} contains the reserved separator value {SEPARATOR}")]
    ReservedElement {
        /// Position of the offending record.
        record: u64,
    },
    /// Persisted bytes failed validation.
    #[error("corruption: {0}")]
    Corruption(String),
    /// Caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

impl FlatAdjError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        FlatAdjError::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn corruption(reason: impl Into<String>) -> Self {
        FlatAdjError::Corruption(reason.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlatAdjError>;
