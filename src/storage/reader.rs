use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::flat::{check_range, covering, split_records, FlatStore};
use super::header::{StoreHeader, HEADER_LEN};
use super::lookup::{Span, SPAN_LEN};
use super::options::StoreOptions;
use crate::primitives::bytes::le;
use crate::primitives::io::{FileIo, StdFileIo};
use crate::types::checksum::{Checksum, Crc32Fast};
use crate::types::{Element, FlatAdjError, Result};

/// Random-access reader over a persisted store.
///
/// Reads are positioned, so a reader can be shared across threads. A range read costs two
/// lookup-entry reads plus one contiguous data read, independent of the store size.
#[derive(Clone)]
pub struct StoreReader {
    io: Arc<dyn FileIo>,
    header: StoreHeader,
}

impl fmt::Debug for StoreReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreReader")
            .field("header", &self.header)
            .finish()
    }
}

impl StoreReader {
    /// Opens and validates the store at `path`.
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        let io = StdFileIo::open_read(path)?;
        let reader = Self::from_io(Arc::new(io), options)?;
        debug!(
            store_path = %path.display(),
            vertices = reader.header.vertex_count,
            elements = reader.header.element_count,
            "store.open"
        );
        Ok(reader)
    }

    /// Validates a store served by an arbitrary [`FileIo`].
    ///
    /// The header and exact file length are always checked; section checksums only when
    /// `options.verify_checksums` is set.
    pub fn from_io(io: Arc<dyn FileIo>, options: &StoreOptions) -> Result<Self> {
        let len = io.len()?;
        if len < HEADER_LEN as u64 {
            return Err(FlatAdjError::corruption(format!(
                "store file of {len} bytes is shorter than its header"
            )));
        }
        let mut raw = [0u8; HEADER_LEN];
        io.read_at(0, &mut raw)?;
        let header = StoreHeader::decode(&raw)?;
        if len != header.file_len() {
            return Err(FlatAdjError::corruption(format!(
                "store file is {len} bytes but its header describes {}",
                header.file_len()
            )));
        }
        let reader = Self { io, header };
        if options.verify_checksums {
            reader.check_checksums(options.buffer_len())?;
        }
        Ok(reader)
    }

    /// Decoded header.
    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    /// Number of records.
    pub fn vertex_count(&self) -> u64 {
        self.header.vertex_count
    }

    /// Flat-array length, separators included.
    pub fn element_count(&self) -> u64 {
        self.header.element_count
    }

    /// True when the store has no records.
    pub fn is_empty(&self) -> bool {
        self.header.vertex_count == 0
    }

    /// Lookup entry for record `id`.
    pub fn span(&self, id: u64) -> Result<Span> {
        check_range(id, id.saturating_add(1), self.vertex_count())?;
        self.read_span(id)
    }

    fn read_span(&self, id: u64) -> Result<Span> {
        let mut raw = [0u8; SPAN_LEN];
        self.io.read_at(self.header.span_offset(id), &mut raw)?;
        Span::decode(&raw)
    }

    /// Raw flat-array slice covering records `[start, end)`, separators included.
    pub fn read_range_flat(&self, start: u64, end: u64) -> Result<Vec<Element>> {
        check_range(start, end, self.vertex_count())?;
        if start == end {
            return Ok(Vec::new());
        }
        let first = self.read_span(start)?;
        let last = if end - start == 1 {
            first
        } else {
            self.read_span(end - 1)?
        };
        let range = covering(first, last)?;
        self.read_elements(range.start as u64, range.end as u64)
    }

    /// Records `[start, end)` decoded back into lists.
    pub fn read_range(&self, start: u64, end: u64) -> Result<Vec<Vec<Element>>> {
        let chunk = self.read_range_flat(start, end)?;
        split_records(&chunk, (end - start) as usize)
    }

    /// One record; equivalent to unwrapping `read_range(id, id + 1)`.
    pub fn read_one(&self, id: u64) -> Result<Vec<Element>> {
        let mut records = self.read_range(id, id.saturating_add(1))?;
        records
            .pop()
            .ok_or_else(|| FlatAdjError::corruption(format!("record {id} decoded to nothing")))
    }

    /// Flat-array elements `[from, to)`.
    pub fn read_elements(&self, from: u64, to: u64) -> Result<Vec<Element>> {
        if from > to || to > self.element_count() {
            return Err(FlatAdjError::corruption(format!(
                "element range {from}..{to} exceeds flat array of {} elements",
                self.element_count()
            )));
        }
        let len = usize::try_from((to - from) * le::ELEMENT_LEN as u64)
            .map_err(|_| FlatAdjError::Overflow("element range exceeds usize"))?;
        let mut raw = vec![0u8; len];
        self.io.read_at(self.header.element_offset(from), &mut raw)?;
        le::decode_elements(&raw)
    }

    /// The whole lookup table.
    pub fn lookup(&self) -> Result<Vec<Span>> {
        let mut spans = Vec::with_capacity(self.vertex_count() as usize);
        self.scan_lookup(1 << 20, |_, bytes| {
            for entry in bytes.chunks_exact(SPAN_LEN) {
                spans.push(Span::decode(entry)?);
            }
            Ok(())
        })?;
        Ok(spans)
    }

    /// Materializes the whole store, validating its layout.
    pub fn load(&self) -> Result<FlatStore> {
        let data = self.read_elements(0, self.element_count())?;
        let lookup = self.lookup()?;
        FlatStore::from_parts(data, lookup)
    }

    /// Recomputes both section checksums against the header.
    pub fn check_checksums(&self, buffer_len: usize) -> Result<()> {
        let (data_crc, lookup_crc) = self.section_checksums(buffer_len)?;
        if data_crc != self.header.data_crc32 {
            return Err(FlatAdjError::corruption(format!(
                "data section checksum mismatch: stored {:#010x}, computed {data_crc:#010x}",
                self.header.data_crc32
            )));
        }
        if lookup_crc != self.header.lookup_crc32 {
            return Err(FlatAdjError::corruption(format!(
                "lookup section checksum mismatch: stored {:#010x}, computed {lookup_crc:#010x}",
                self.header.lookup_crc32
            )));
        }
        Ok(())
    }

    pub(crate) fn section_checksums(&self, buffer_len: usize) -> Result<(u32, u32)> {
        let mut data = Crc32Fast::default();
        self.scan_data(buffer_len, |_, bytes| {
            data.update(bytes);
            Ok(())
        })?;
        let mut lookup = Crc32Fast::default();
        self.scan_lookup(buffer_len, |_, bytes| {
            lookup.update(bytes);
            Ok(())
        })?;
        Ok((data.finalize(), lookup.finalize()))
    }

    pub(crate) fn scan_data(
        &self,
        buffer_len: usize,
        f: impl FnMut(u64, &[u8]) -> Result<()>,
    ) -> Result<()> {
        self.scan_section(
            self.header.data_offset,
            self.header.element_count * le::ELEMENT_LEN as u64,
            buffer_len,
            f,
        )
    }

    pub(crate) fn scan_lookup(
        &self,
        buffer_len: usize,
        f: impl FnMut(u64, &[u8]) -> Result<()>,
    ) -> Result<()> {
        self.scan_section(
            self.header.lookup_offset,
            self.header.lookup_len(),
            buffer_len,
            f,
        )
    }

    /// Feeds a section to `f` in chunks aligned to [`SPAN_LEN`], passing each chunk's
    /// offset relative to the section start.
    fn scan_section(
        &self,
        offset: u64,
        len: u64,
        buffer_len: usize,
        mut f: impl FnMut(u64, &[u8]) -> Result<()>,
    ) -> Result<()> {
        let step = (buffer_len / SPAN_LEN).max(1) * SPAN_LEN;
        let mut buf = vec![0u8; step.min(len as usize)];
        let mut done = 0u64;
        while done < len {
            let take = (len - done).min(step as u64) as usize;
            let chunk = &mut buf[..take];
            self.io.read_at(offset + done, chunk)?;
            f(done, chunk)?;
            done += take as u64;
        }
        Ok(())
    }
}
