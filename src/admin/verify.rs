use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::admin::util::open_store;
use crate::admin::{AdminError, Result};
use crate::primitives::bytes::le;
use crate::storage::{ChainCheck, Span, StoreOptions, StoreReader, SPAN_LEN};
use crate::types::{FlatAdjError, SEPARATOR};

const MAX_FINDINGS: usize = 32;

/// Specifies the depth of verification checks to perform.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerifyLevel {
    /// Header, version and file length only.
    Fast,
    /// Section checksums plus a full walk of the lookup table and flat array.
    Full,
}

/// Indicates the severity level of a verification finding.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    /// Informational message about the verification process.
    Info,
    /// Non-critical issue that may indicate a problem.
    Warning,
    /// Critical issue indicating corruption.
    Error,
}

/// Represents a single issue discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// The severity level of this finding.
    pub severity: VerifySeverity,
    /// Human-readable description of the issue.
    pub message: String,
}

impl VerifyFinding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Info,
            message: message.into(),
        }
    }
}

/// Statistics collected during the verification process.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Records declared by the header.
    pub vertices: u64,
    /// Flat-array length declared by the header.
    pub elements: u64,
    /// Lookup entries decoded during a full walk.
    pub spans_checked: u64,
    /// Separators found in the flat array during a full walk.
    pub separators_found: u64,
}

/// Complete report of a verification operation.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// The verification level that was performed.
    pub level: VerifyLevel,
    /// Whether verification passed without any error finding.
    pub success: bool,
    /// List of issues discovered during verification.
    pub findings: Vec<VerifyFinding>,
    /// Statistics about the structures examined.
    pub counts: VerifyCounts,
}

/// Verifies the integrity of a store file.
///
/// - `VerifyLevel::Fast`: header magic, version, checksum, offsets and exact file length
/// - `VerifyLevel::Full`: additionally recomputes both section checksums and checks that
///   every record starts where the previous one ended, is terminated by exactly one
///   separator at `end - 1`, and that the last record ends at the flat-array length
///
/// A store that fails to open because of corruption yields a failed report rather than
/// an error.
///
/// # Errors
///
/// Returns an error if the file is missing or an I/O operation fails.
pub fn verify(
    path: impl AsRef<Path>,
    opts: &StoreOptions,
    level: VerifyLevel,
) -> Result<VerifyReport> {
    let path = path.as_ref();
    let mut findings = Vec::new();
    let mut counts = VerifyCounts::default();

    // checksums are walked below for Full; opening must not fail on them first
    let open_opts = opts.clone().verify_checksums(false);
    let reader = match open_store(path, &open_opts) {
        Ok(reader) => Some(reader),
        Err(AdminError::Core(FlatAdjError::Corruption(reason))) => {
            push_error(&mut findings, format!("header: {reason}"));
            None
        }
        Err(err) => return Err(err),
    };

    if let Some(reader) = reader {
        counts.vertices = reader.vertex_count();
        counts.elements = reader.element_count();
        if level == VerifyLevel::Full {
            verify_checksums(&reader, opts, &mut findings)?;
            verify_layout(&reader, opts, &mut findings, &mut counts)?;
        }
    }

    let success = !findings
        .iter()
        .any(|finding| finding.severity == VerifySeverity::Error);
    if findings.len() >= MAX_FINDINGS {
        findings.push(VerifyFinding::info(format!(
            "stopped reporting after {MAX_FINDINGS} findings"
        )));
    }
    info!(
        store_path = %path.display(),
        level = ?level,
        success,
        findings = findings.len(),
        "admin.verify.completed"
    );
    Ok(VerifyReport {
        level,
        success,
        findings,
        counts,
    })
}

fn verify_checksums(
    reader: &StoreReader,
    opts: &StoreOptions,
    findings: &mut Vec<VerifyFinding>,
) -> Result<()> {
    let header = reader.header();
    let (data_crc, lookup_crc) = reader.section_checksums(opts.buffer_len())?;
    if data_crc != header.data_crc32 {
        push_error(
            findings,
            format!(
                "data section checksum mismatch: stored {:#010x}, computed {data_crc:#010x}",
                header.data_crc32
            ),
        );
    }
    if lookup_crc != header.lookup_crc32 {
        push_error(
            findings,
            format!(
                "lookup section checksum mismatch: stored {:#010x}, computed {lookup_crc:#010x}",
                header.lookup_crc32
            ),
        );
    }
    Ok(())
}

fn verify_layout(
    reader: &StoreReader,
    opts: &StoreOptions,
    findings: &mut Vec<VerifyFinding>,
    counts: &mut VerifyCounts,
) -> Result<()> {
    // Separator positions, in order. Record i is well formed exactly when its separator
    // is the i-th one and sits at span.end - 1.
    let mut separators: Vec<u64> = Vec::new();
    reader.scan_data(opts.buffer_len(), |offset, bytes| {
        let base = offset / le::ELEMENT_LEN as u64;
        for (i, value) in le::decode_elements(bytes)?.into_iter().enumerate() {
            if value == SEPARATOR {
                separators.push(base + i as u64);
            }
        }
        Ok(())
    })?;
    counts.separators_found = separators.len() as u64;
    if counts.separators_found != counts.vertices {
        push_error(
            findings,
            format!(
                "flat array holds {} separators for {} records",
                counts.separators_found, counts.vertices
            ),
        );
    }

    let mut chain = ChainCheck::default();
    let mut issues = Vec::new();
    let mut id = 0u64;
    reader.scan_lookup(opts.buffer_len(), |_, bytes| {
        for entry in bytes.chunks_exact(SPAN_LEN) {
            match Span::decode(entry) {
                Ok(span) => {
                    chain.observe(id, span, &mut issues);
                    let expected = u64::from(span.end).checked_sub(1);
                    let found = separators.get(id as usize).copied();
                    if expected.is_some() && found != expected {
                        issues.push(match found {
                            Some(at) => format!(
                                "record {id} should end with a separator at {}, found one at {at}",
                                span.end - 1
                            ),
                            None => format!("record {id} has no separator"),
                        });
                    }
                }
                Err(err) => issues.push(format!("record {id}: {err}")),
            }
            counts.spans_checked += 1;
            id += 1;
        }
        Ok(())
    })?;
    chain.finish(counts.elements, &mut issues);
    for issue in issues {
        push_error(findings, issue);
    }
    Ok(())
}

fn push_error(findings: &mut Vec<VerifyFinding>, message: impl Into<String>) {
    if findings.len() < MAX_FINDINGS {
        findings.push(VerifyFinding::error(message.into()));
    }
}
