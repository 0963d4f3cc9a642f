use crate::primitives::bytes::{buf::Cursor, le};
use crate::types::checksum::region_crc32;
use crate::types::{Element, FlatAdjError, Result, SEPARATOR};

use super::lookup::{MAX_OFFSET, SPAN_LEN};

/// File magic identifying a store.
pub const MAGIC: &[u8; 8] = b"FLATADJ\0";
/// Size of the fixed header preceding the data section.
pub const HEADER_LEN: usize = 64;
/// Format major version written by this crate.
pub const VERSION_MAJOR: u16 = 1;
/// Format minor version written by this crate.
pub const VERSION_MINOR: u16 = 0;

const HEADER_CRC_OFFSET: usize = 60;

/// Decoded store header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct StoreHeader {
    pub separator: Element,
    pub vertex_count: u64,
    pub element_count: u64,
    pub data_offset: u64,
    pub lookup_offset: u64,
    pub data_crc32: u32,
    pub lookup_crc32: u32,
}

impl StoreHeader {
    /// Header for a store of the given shape; section CRCs are filled in by the writer.
    pub fn new(vertex_count: u64, element_count: u64) -> Result<Self> {
        let data_bytes = element_count
            .checked_mul(le::ELEMENT_LEN as u64)
            .ok_or(FlatAdjError::Overflow("data section size exceeds u64"))?;
        let lookup_offset = (HEADER_LEN as u64)
            .checked_add(data_bytes)
            .ok_or(FlatAdjError::Overflow("lookup offset exceeds u64"))?;
        Ok(Self {
            separator: SEPARATOR,
            vertex_count,
            element_count,
            data_offset: HEADER_LEN as u64,
            lookup_offset,
            data_crc32: 0,
            lookup_crc32: 0,
        })
    }

    /// Byte length of the lookup section.
    pub fn lookup_len(&self) -> u64 {
        self.vertex_count * SPAN_LEN as u64
    }

    /// Exact length the file must have.
    pub fn file_len(&self) -> u64 {
        self.lookup_offset + self.lookup_len()
    }

    /// Byte offset of element `index` in the data section.
    pub fn element_offset(&self, index: u64) -> u64 {
        self.data_offset + index * le::ELEMENT_LEN as u64
    }

    /// Byte offset of lookup entry `id`.
    pub fn span_offset(&self, id: u64) -> u64 {
        self.lookup_offset + id * SPAN_LEN as u64
    }

    /// Serializes the header, sealing it with its own CRC.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        buf.extend_from_slice(MAGIC);
        le::put_u16(&mut buf, VERSION_MAJOR);
        le::put_u16(&mut buf, VERSION_MINOR);
        le::put_i32(&mut buf, self.separator);
        le::put_u64(&mut buf, self.vertex_count);
        le::put_u64(&mut buf, self.element_count);
        le::put_u64(&mut buf, self.data_offset);
        le::put_u64(&mut buf, self.lookup_offset);
        le::put_u32(&mut buf, self.data_crc32);
        le::put_u32(&mut buf, self.lookup_crc32);
        le::put_u32(&mut buf, 0);
        let crc = region_crc32(&buf[..HEADER_CRC_OFFSET]);
        le::put_u32(&mut buf, crc);

        let mut out = [0u8; HEADER_LEN];
        out.copy_from_slice(&buf);
        out
    }

    /// Parses and validates a header.
    ///
    /// Checks magic, version, header CRC, separator, and that the section offsets agree
    /// with the recorded counts. The file length is checked separately by the reader.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(FlatAdjError::corruption(format!(
                "store header truncated: {} of {HEADER_LEN} bytes",
                bytes.len()
            )));
        }
        let bytes = &bytes[..HEADER_LEN];
        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(FlatAdjError::corruption("invalid store magic"));
        }

        let mut cur = Cursor::new(bytes);
        cur.take(MAGIC.len())?;
        let major = cur.u16_le()?;
        let minor = cur.u16_le()?;
        if major != VERSION_MAJOR || minor != VERSION_MINOR {
            return Err(FlatAdjError::corruption(format!(
                "unsupported store version {major}.{minor}"
            )));
        }
        let separator = cur.i32_le()?;
        let vertex_count = cur.u64_le()?;
        let element_count = cur.u64_le()?;
        let data_offset = cur.u64_le()?;
        let lookup_offset = cur.u64_le()?;
        let data_crc32 = cur.u32_le()?;
        let lookup_crc32 = cur.u32_le()?;
        let _reserved = cur.u32_le()?;
        let stored_crc = cur.u32_le()?;

        let actual_crc = region_crc32(&bytes[..HEADER_CRC_OFFSET]);
        if stored_crc != actual_crc {
            return Err(FlatAdjError::corruption(format!(
                "header checksum mismatch: stored {stored_crc:#010x}, computed {actual_crc:#010x}"
            )));
        }
        if separator != SEPARATOR {
            return Err(FlatAdjError::corruption(format!(
                "unsupported separator {separator}"
            )));
        }
        if element_count > MAX_OFFSET {
            return Err(FlatAdjError::corruption(format!(
                "{element_count} elements exceed the addressable flat array"
            )));
        }
        if vertex_count > element_count {
            return Err(FlatAdjError::corruption(format!(
                "{vertex_count} records cannot fit in {element_count} elements"
            )));
        }

        let expected = Self::new(vertex_count, element_count)?;
        if data_offset != expected.data_offset || lookup_offset != expected.lookup_offset {
            return Err(FlatAdjError::corruption(format!(
                "section offsets {data_offset}/{lookup_offset} disagree with counts \
                 (expected {}/{})",
                expected.data_offset, expected.lookup_offset
            )));
        }
        Ok(Self {
            data_crc32,
            lookup_crc32,
            ..expected
        })
    }
}
