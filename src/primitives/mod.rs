//! Low-level primitives for building the store.
//!
//! Includes byte encoding utilities and positioned file I/O.

/// Byte-level utilities and encoding/decoding.
///
/// Little-endian element codecs and a bounds-checked parsing cursor.
pub mod bytes;

/// I/O abstractions and utilities.
///
/// Positioned reads and writes that let many readers share one file handle.
pub mod io;
