#![forbid(unsafe_code)]
//! Little-endian encoders and a bounds-checked cursor shared by the store layers.

pub mod le {
    //! Fixed-width little-endian integers and element arrays.

    use crate::types::{Element, FlatAdjError, Result};

    /// Width of one persisted element in bytes.
    pub const ELEMENT_LEN: usize = core::mem::size_of::<Element>();

    /// Appends an `i32` in little-endian order.
    pub fn put_i32(dst: &mut Vec<u8>, v: i32) {
        dst.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends a `u16` in little-endian order.
    pub fn put_u16(dst: &mut Vec<u8>, v: u16) {
        dst.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends a `u32` in little-endian order.
    pub fn put_u32(dst: &mut Vec<u8>, v: u32) {
        dst.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends a `u64` in little-endian order.
    pub fn put_u64(dst: &mut Vec<u8>, v: u64) {
        dst.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends every element of `values`.
    pub fn encode_elements(values: &[Element], dst: &mut Vec<u8>) {
        dst.reserve(values.len() * ELEMENT_LEN);
        for &v in values {
            put_i32(dst, v);
        }
    }

    /// Decodes a byte region into elements. The region must be a whole number of elements.
    pub fn decode_elements(src: &[u8]) -> Result<Vec<Element>> {
        if src.len() % ELEMENT_LEN != 0 {
            return Err(FlatAdjError::corruption(format!(
                "element region of {} bytes is not a multiple of {ELEMENT_LEN}",
                src.len()
            )));
        }
        Ok(src
            .chunks_exact(ELEMENT_LEN)
            .map(|chunk| Element::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }
}

pub mod buf {
    //! A slice-backed cursor for parsing fixed layouts.

    use core::fmt;

    use crate::types::{FlatAdjError, Result};

    /// A cursor for reading bytes from a slice with offset tracking.
    pub struct Cursor<'a> {
        /// The underlying byte slice.
        pub buf: &'a [u8],
        /// Current read offset.
        pub off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Takes the next `n` bytes, failing instead of reading past the end.
        pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
            let end = self
                .off
                .checked_add(n)
                .ok_or(FlatAdjError::Overflow("cursor offset overflow during take"))?;
            if end > self.buf.len() {
                return Err(FlatAdjError::corruption(format!(
                    "cursor take beyond buffer: need {}, remaining {}",
                    n,
                    self.remaining()
                )));
            }
            let slice = &self.buf[self.off..end];
            self.off = end;
            Ok(slice)
        }

        /// Takes exactly `N` bytes as an array.
        pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
            let mut out = [0u8; N];
            out.copy_from_slice(self.take(N)?);
            Ok(out)
        }

        /// Reads a little-endian `u16`.
        pub fn u16_le(&mut self) -> Result<u16> {
            Ok(u16::from_le_bytes(self.take_array()?))
        }

        /// Reads a little-endian `u32`.
        pub fn u32_le(&mut self) -> Result<u32> {
            Ok(u32::from_le_bytes(self.take_array()?))
        }

        /// Reads a little-endian `i32`.
        pub fn i32_le(&mut self) -> Result<i32> {
            Ok(i32::from_le_bytes(self.take_array()?))
        }

        /// Reads a little-endian `u64`.
        pub fn u64_le(&mut self) -> Result<u64> {
            Ok(u64::from_le_bytes(self.take_array()?))
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}
