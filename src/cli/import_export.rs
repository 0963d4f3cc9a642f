use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::admin::{open_store, AdminError};
use crate::ingest::{write_adjacency, write_record_line, AdjacencyReader, EdgeReader};
use crate::remap::{remap_stream, RemapTable, RemappedGraph};
use crate::storage::{BuildSummary, StoreOptions, StoreWriter};
use crate::types::FlatAdjError;

const EXPORT_BATCH_RECORDS: u64 = 4096;

/// Configuration for remapping an edge list into adjacency-list text.
#[derive(Debug, Clone)]
pub struct RemapConfig {
    /// Edge list to read.
    pub edges: PathBuf,
    /// Adjacency-list text to write.
    pub out: PathBuf,
    /// Optional `dense original` mapping file.
    pub table_out: Option<PathBuf>,
}

/// Summary statistics from a remap operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemapSummary {
    /// Edges parsed from the input.
    pub edges_read: u64,
    /// Dense vertices produced.
    pub vertices: u64,
    /// Total neighbor entries across all lists.
    pub neighbor_entries: u64,
    /// Adjacency lines written.
    pub lines_written: u64,
}

/// Configuration for building a store from adjacency-list text.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Adjacency-list text to read.
    pub adjacency: PathBuf,
    /// Store file to create.
    pub store: PathBuf,
}

/// Configuration for going straight from an edge list to a store.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Edge list to read.
    pub edges: PathBuf,
    /// Store file to create.
    pub store: PathBuf,
    /// Optional adjacency-list text written alongside the store.
    pub adjacency_out: Option<PathBuf>,
    /// Optional `dense original` mapping file.
    pub table_out: Option<PathBuf>,
}

/// Summary statistics from a convert operation.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    /// Remap stage figures.
    pub remap: RemapSummary,
    /// Store build figures.
    pub build: BuildSummary,
}

/// Configuration for exporting a store as adjacency-list text.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Store file to read.
    pub store: PathBuf,
    /// Text file to write.
    pub out: PathBuf,
    /// First record to export; defaults to 0.
    pub start: Option<u64>,
    /// One past the last record to export; defaults to the record count.
    pub end: Option<u64>,
}

/// Summary statistics from an export operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Records written.
    pub records_exported: u64,
    /// First record written.
    pub start: u64,
    /// One past the last record written.
    pub end: u64,
}

/// Error type for command-line operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Admin operation error.
    #[error(transparent)]
    Admin(#[from] AdminError),
    /// Store or ingest error.
    #[error(transparent)]
    Store(#[from] FlatAdjError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Remaps an edge list and writes it as adjacency-list text.
///
/// Outputs are staged next to their destinations and only renamed into place once the
/// whole input has been remapped, so a parse error leaves no output behind.
pub fn run_remap(cfg: &RemapConfig) -> Result<RemapSummary, CliError> {
    let (graph, edges_read) = read_and_remap(&cfg.edges)?;
    let lines_written = write_atomically(&cfg.out, |out| Ok(write_adjacency(&graph, out)?))?;
    if let Some(path) = &cfg.table_out {
        write_atomically(path, |out| write_table(graph.table(), out))?;
    }
    Ok(RemapSummary {
        lines_written,
        ..remap_summary(&graph, edges_read)
    })
}

/// Streams adjacency-list text into a new store.
pub fn run_build(cfg: &BuildConfig, opts: &StoreOptions) -> Result<BuildSummary, CliError> {
    let mut writer = StoreWriter::create(&cfg.store, opts.clone())?;
    for record in AdjacencyReader::open(&cfg.adjacency)? {
        writer.push_record(&record?)?;
    }
    Ok(writer.finish()?)
}

/// Remaps an edge list and builds a store from it in one pass.
pub fn run_convert(cfg: &ConvertConfig, opts: &StoreOptions) -> Result<ConvertSummary, CliError> {
    let (graph, edges_read) = read_and_remap(&cfg.edges)?;
    let mut remap = remap_summary(&graph, edges_read);
    if let Some(path) = &cfg.adjacency_out {
        remap.lines_written = write_atomically(path, |out| Ok(write_adjacency(&graph, out)?))?;
    }
    if let Some(path) = &cfg.table_out {
        write_atomically(path, |out| write_table(graph.table(), out))?;
    }

    let mut writer = StoreWriter::create(&cfg.store, opts.clone())?;
    for record in graph.records() {
        writer.push_record(&record)?;
    }
    let build = writer.finish()?;
    Ok(ConvertSummary { remap, build })
}

/// Writes records of a store back out as adjacency-list text.
pub fn run_export(cfg: &ExportConfig, opts: &StoreOptions) -> Result<ExportSummary, CliError> {
    let reader = open_store(&cfg.store, opts)?;
    let start = cfg.start.unwrap_or(0);
    let end = cfg.end.unwrap_or_else(|| reader.vertex_count());
    // validate up front so a bad range never creates the output file
    crate::storage::check_range(start, end, reader.vertex_count())?;

    let records_exported = write_atomically(&cfg.out, |out| {
        let mut written = 0u64;
        let mut batch_start = start;
        while batch_start < end {
            let batch_end = end.min(batch_start + EXPORT_BATCH_RECORDS);
            for (offset, record) in reader.read_range(batch_start, batch_end)?.iter().enumerate() {
                write_record_line(out, batch_start + offset as u64, record)?;
                written += 1;
            }
            batch_start = batch_end;
        }
        Ok(written)
    })?;

    Ok(ExportSummary {
        records_exported,
        start,
        end,
    })
}

fn read_and_remap(path: &Path) -> Result<(RemappedGraph, u64), CliError> {
    let mut edges_read = 0u64;
    let edges = EdgeReader::open(path)?.inspect(|edge| {
        if edge.is_ok() {
            edges_read += 1;
        }
    });
    let graph = remap_stream(edges)?;
    Ok((graph, edges_read))
}

fn remap_summary(graph: &RemappedGraph, edges_read: u64) -> RemapSummary {
    RemapSummary {
        edges_read,
        vertices: graph.len() as u64,
        neighbor_entries: graph.iter().map(|(_, n)| n.len() as u64).sum(),
        lines_written: 0,
    }
}

fn write_table<W: Write>(table: &RemapTable, out: &mut W) -> Result<u64, CliError> {
    let mut lines = 0u64;
    for (original, dense) in table.iter() {
        writeln!(out, "{dense} {original}")?;
        lines += 1;
    }
    Ok(lines)
}

fn write_atomically<T>(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<T, CliError>,
) -> Result<T, CliError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    let value = {
        let mut out = BufWriter::new(&mut tmp);
        let value = body(&mut out)?;
        out.flush()?;
        value
    };
    tmp.persist(path).map_err(|err| CliError::Io(err.error))?;
    Ok(value)
}
