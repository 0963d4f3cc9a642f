use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::admin::util::open_store;
use crate::admin::Result;
use crate::primitives::bytes::le;
use crate::storage::{Span, StoreOptions, SPAN_LEN, VERSION_MAJOR, VERSION_MINOR};

/// Summary of a store's size and shape.
#[derive(Debug, Clone, Serialize)]
#[allow(missing_docs)]
pub struct StatsReport {
    pub store: StoreStatsSection,
    pub degrees: DegreeStats,
    pub filesystem: FilesystemStats,
}

/// Header-level figures.
#[derive(Debug, Clone, Serialize)]
#[allow(missing_docs)]
pub struct StoreStatsSection {
    pub format_version: String,
    pub vertices: u64,
    pub elements: u64,
    pub neighbor_entries: u64,
    pub data_crc32: u32,
    pub lookup_crc32: u32,
}

/// Neighbor-count distribution over all records.
#[derive(Debug, Clone, Default, Serialize)]
#[allow(missing_docs)]
pub struct DegreeStats {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub empty_records: u64,
}

/// On-disk footprint by section.
#[derive(Debug, Clone, Serialize)]
#[allow(missing_docs)]
pub struct FilesystemStats {
    pub store_path: String,
    pub size_bytes: u64,
    pub data_bytes: u64,
    pub lookup_bytes: u64,
}

/// Collects [`StatsReport`] for the store at `path` with one pass over its lookup section.
pub fn stats(path: impl AsRef<Path>, opts: &StoreOptions) -> Result<StatsReport> {
    let path = path.as_ref();
    let reader = open_store(path, opts)?;
    let header = *reader.header();
    let size_bytes = fs::metadata(path)?.len();

    let mut degrees = DegreeStats {
        min: u64::MAX,
        ..DegreeStats::default()
    };
    reader.scan_lookup(opts.buffer_len(), |_, bytes| {
        for entry in bytes.chunks_exact(SPAN_LEN) {
            let degree = Span::decode(entry)?.len() as u64;
            degrees.min = degrees.min.min(degree);
            degrees.max = degrees.max.max(degree);
            if degree == 0 {
                degrees.empty_records += 1;
            }
        }
        Ok(())
    })?;

    let neighbor_entries = header.element_count - header.vertex_count;
    if header.vertex_count == 0 {
        degrees.min = 0;
    } else {
        degrees.mean = neighbor_entries as f64 / header.vertex_count as f64;
    }

    Ok(StatsReport {
        store: StoreStatsSection {
            format_version: format!("{VERSION_MAJOR}.{VERSION_MINOR}"),
            vertices: header.vertex_count,
            elements: header.element_count,
            neighbor_entries,
            data_crc32: header.data_crc32,
            lookup_crc32: header.lookup_crc32,
        },
        degrees,
        filesystem: FilesystemStats {
            store_path: path.display().to_string(),
            size_bytes,
            data_bytes: header.element_count * le::ELEMENT_LEN as u64,
            lookup_bytes: header.lookup_len(),
        },
    })
}
