#![forbid(unsafe_code)]

//! Store inspection and integrity tooling.
//!
//! This module reports statistics about a persisted store and verifies its structure
//! and checksums.

mod error;
mod stats;
mod util;
mod verify;

/// Error types for administrative operations.
pub use error::{AdminError, Result};

/// Statistics collection and reporting.
///
/// Summarizes record counts, degree distribution and on-disk section sizes.
pub use stats::{stats, DegreeStats, FilesystemStats, StatsReport, StoreStatsSection};

/// Store integrity verification.
///
/// Verifies the header, section checksums and lookup layout and reports any issues found.
pub use verify::{verify, VerifyCounts, VerifyFinding, VerifyLevel, VerifyReport, VerifySeverity};

/// Opens a store for administrative access.
pub use util::open_store;
