#![forbid(unsafe_code)]

//! Command-line interface operations.
//!
//! This module provides the file-to-file pipelines behind the `flatadj` binary:
//! remapping edge lists, building stores and exporting them back to text.

/// Text import and export pipelines.
///
/// Handles edge-list remapping, store construction from adjacency text, and exporting
/// store records back to adjacency text.
pub mod import_export;
