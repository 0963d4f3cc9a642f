use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::header::{StoreHeader, HEADER_LEN};
use super::lookup::{OffsetCursor, Span, SPAN_LEN};
use super::options::StoreOptions;
use crate::primitives::bytes::le;
use crate::primitives::io::{FileIo, StdFileIo};
use crate::types::checksum::{Checksum, Crc32Fast};
use crate::types::{Element, FlatAdjError, Result, SEPARATOR};

/// Summary returned after a store file has been persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    /// Final location of the store.
    pub path: PathBuf,
    /// Number of records written.
    pub vertices: u64,
    /// Flat-array length, separators included.
    pub elements: u64,
    /// Size of the store file in bytes.
    pub file_bytes: u64,
    /// CRC32 of the data section.
    pub data_crc32: u32,
    /// CRC32 of the lookup section.
    pub lookup_crc32: u32,
    /// Wall time spent building, in milliseconds.
    pub duration_ms: f64,
}

/// Streams records into a store file.
///
/// Output goes to a temporary file next to the destination. [`StoreWriter::finish`]
/// writes the lookup section and header, then renames the file into place. Dropping the
/// writer, or any failed push, leaves nothing at the destination.
pub struct StoreWriter {
    path: PathBuf,
    options: StoreOptions,
    out: BufWriter<NamedTempFile>,
    cursor: OffsetCursor,
    lookup: Vec<Span>,
    data_crc: Crc32Fast,
    scratch: Vec<u8>,
    poisoned: bool,
    started: Instant,
}

impl StoreWriter {
    /// Starts a new store at `path`.
    pub fn create(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !options.overwrite && path.exists() {
            return Err(FlatAdjError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("store already exists: {}", path.display()),
            )));
        }
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let tmp = NamedTempFile::new_in(&dir)?;
        debug!(
            store_path = %path.display(),
            staging_path = %tmp.path().display(),
            "store.build.begin"
        );
        let mut out = BufWriter::with_capacity(options.buffer_len(), tmp);
        // header is rewritten in place once the sections are known
        out.write_all(&[0u8; HEADER_LEN])?;
        Ok(Self {
            path,
            options,
            out,
            cursor: OffsetCursor::new(),
            lookup: Vec::new(),
            data_crc: Crc32Fast::default(),
            scratch: Vec::new(),
            poisoned: false,
            started: Instant::now(),
        })
    }

    /// Appends one record.
    ///
    /// A record holding [`SEPARATOR`] or one that would push offsets past `i32::MAX` is
    /// rejected and the writer stays usable. An I/O failure poisons the writer.
    pub fn push_record(&mut self, record: &[Element]) -> Result<Span> {
        if self.poisoned {
            return Err(FlatAdjError::Invalid("store writer failed earlier"));
        }
        let span = self.cursor.place(record)?;
        self.scratch.clear();
        le::encode_elements(record, &mut self.scratch);
        le::put_i32(&mut self.scratch, SEPARATOR);
        if let Err(err) = self.out.write_all(&self.scratch) {
            self.poisoned = true;
            return Err(err.into());
        }
        self.data_crc.update(&self.scratch);
        self.lookup.push(span);
        Ok(span)
    }

    /// Records accepted so far.
    pub fn vertex_count(&self) -> u64 {
        self.cursor.records()
    }

    /// Elements written so far, separators included.
    pub fn element_count(&self) -> u64 {
        self.cursor.position()
    }

    /// Writes the lookup section and header and moves the file into place.
    pub fn finish(mut self) -> Result<BuildSummary> {
        if self.poisoned {
            return Err(FlatAdjError::Invalid("store writer failed earlier"));
        }
        let mut header = StoreHeader::new(self.cursor.records(), self.cursor.position())?;
        header.data_crc32 = self.data_crc.finalize();

        let mut lookup_crc = Crc32Fast::default();
        let chunk_spans = (self.options.buffer_len() / SPAN_LEN).max(1);
        for chunk in self.lookup.chunks(chunk_spans) {
            self.scratch.clear();
            for span in chunk {
                span.encode(&mut self.scratch);
            }
            lookup_crc.update(&self.scratch);
            self.out.write_all(&self.scratch)?;
        }
        header.lookup_crc32 = lookup_crc.finalize();

        let tmp = self.out.into_inner().map_err(|err| err.into_error())?;
        let io = StdFileIo::new(tmp.reopen()?);
        io.write_at(0, &header.encode())?;
        let file_bytes = io.len()?;
        if file_bytes != header.file_len() {
            return Err(FlatAdjError::corruption(format!(
                "staged store is {file_bytes} bytes, expected {}",
                header.file_len()
            )));
        }
        if self.options.fsync {
            io.sync_all()?;
        }
        drop(io);

        let persisted = if self.options.overwrite {
            tmp.persist(&self.path)
        } else {
            tmp.persist_noclobber(&self.path)
        };
        persisted.map_err(|err| FlatAdjError::Io(err.error))?;

        let summary = BuildSummary {
            path: self.path,
            vertices: header.vertex_count,
            elements: header.element_count,
            file_bytes,
            data_crc32: header.data_crc32,
            lookup_crc32: header.lookup_crc32,
            duration_ms: self.started.elapsed().as_secs_f64() * 1_000.0,
        };
        info!(
            store_path = %summary.path.display(),
            vertices = summary.vertices,
            elements = summary.elements,
            file_bytes = summary.file_bytes,
            duration_ms = summary.duration_ms,
            "store.build.completed"
        );
        Ok(summary)
    }
}

/// Writes `records` to a new store at `path`.
pub fn write_store<I, R>(
    path: impl AsRef<Path>,
    records: I,
    options: StoreOptions,
) -> Result<BuildSummary>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[Element]>,
{
    let mut writer = StoreWriter::create(path, options)?;
    for record in records {
        writer.push_record(record.as_ref())?;
    }
    writer.finish()
}
