#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use flatadj::admin::{verify, AdminError, VerifyLevel, VerifySeverity};
use flatadj::primitives::bytes::le;
use flatadj::storage::{write_store, StoreHeader, StoreOptions, StoreReader, HEADER_LEN};
use flatadj::types::checksum::region_crc32;
use flatadj::types::{Element, FlatAdjError};
use tempfile::TempDir;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn path_graph(dir: &TempDir) -> flatadj::Result<PathBuf> {
    let path = dir.path().join("path.fadj");
    write_store(
        &path,
        [vec![1], vec![0, 2], vec![1]],
        StoreOptions::default().fsync(false),
    )?;
    Ok(path)
}

/// Replaces the flat array and rewrites the header so that every checksum matches again.
fn rewrite_data(path: &Path, data: &[Element]) -> TestResult {
    let mut bytes = fs::read(path)?;
    let mut header = StoreHeader::decode(&bytes[..HEADER_LEN])?;
    assert_eq!(header.element_count, data.len() as u64);

    let mut encoded = Vec::new();
    le::encode_elements(data, &mut encoded);
    let start = header.data_offset as usize;
    bytes[start..start + encoded.len()].copy_from_slice(&encoded);
    header.data_crc32 = region_crc32(&encoded);
    bytes[..HEADER_LEN].copy_from_slice(&header.encode());
    fs::write(path, bytes)?;
    Ok(())
}

fn error_messages(report: &flatadj::admin::VerifyReport) -> Vec<&str> {
    report
        .findings
        .iter()
        .filter(|f| f.severity == VerifySeverity::Error)
        .map(|f| f.message.as_str())
        .collect()
}

#[test]
fn healthy_store_passes_full_verify() -> TestResult {
    let dir = TempDir::new()?;
    let path = path_graph(&dir)?;
    let report = verify(&path, &StoreOptions::default(), VerifyLevel::Full)?;
    assert!(report.success, "{:?}", report.findings);
    assert!(report.findings.is_empty());
    assert_eq!(report.counts.vertices, 3);
    assert_eq!(report.counts.elements, 7);
    assert_eq!(report.counts.spans_checked, 3);
    assert_eq!(report.counts.separators_found, 3);
    Ok(())
}

#[test]
fn truncated_store_refuses_to_open() -> TestResult {
    let dir = TempDir::new()?;
    let path = path_graph(&dir)?;
    let len = fs::metadata(&path)?.len();
    fs::OpenOptions::new()
        .write(true)
        .open(&path)?
        .set_len(len - 4)?;

    let err = StoreReader::open(&path, &StoreOptions::default()).expect_err("short file");
    assert!(matches!(err, FlatAdjError::Corruption(_)), "{err}");

    let report = verify(&path, &StoreOptions::default(), VerifyLevel::Fast)?;
    assert!(!report.success);
    assert!(error_messages(&report)[0].starts_with("header:"));
    Ok(())
}

#[test]
fn file_shorter_than_header_is_corruption() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("stub.fadj");
    fs::write(&path, b"FLATADJ")?;
    assert!(matches!(
        StoreReader::open(&path, &StoreOptions::default()),
        Err(FlatAdjError::Corruption(_))
    ));
    Ok(())
}

#[test]
fn bad_magic_and_version_are_reported() -> TestResult {
    let dir = TempDir::new()?;
    let path = path_graph(&dir)?;
    let pristine = fs::read(&path)?;

    let mut bytes = pristine.clone();
    bytes[..4].copy_from_slice(b"JUNK");
    fs::write(&path, &bytes)?;
    let report = verify(&path, &StoreOptions::default(), VerifyLevel::Fast)?;
    assert!(!report.success);
    assert!(error_messages(&report)[0].contains("magic"));

    let mut bytes = pristine;
    bytes[8] = 9;
    fs::write(&path, &bytes)?;
    let err = StoreReader::open(&path, &StoreOptions::default()).expect_err("future version");
    assert!(err.to_string().contains("version"), "{err}");
    Ok(())
}

#[test]
fn flipped_data_bit_fails_checksums_only_when_asked() -> TestResult {
    let dir = TempDir::new()?;
    let path = path_graph(&dir)?;
    let mut bytes = fs::read(&path)?;
    // low byte of element 3, the `2` in record 1
    bytes[HEADER_LEN + 3 * 4] ^= 0x04;
    fs::write(&path, &bytes)?;

    let reader = StoreReader::open(&path, &StoreOptions::default())?;
    assert_eq!(reader.read_one(1)?, vec![0, 6]);
    assert!(StoreReader::open(&path, &StoreOptions::default().verify_checksums(true)).is_err());

    let fast = verify(&path, &StoreOptions::default(), VerifyLevel::Fast)?;
    assert!(fast.success);
    let full = verify(&path, &StoreOptions::default(), VerifyLevel::Full)?;
    assert!(!full.success);
    let errors = error_messages(&full);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("data section checksum"));
    Ok(())
}

#[test]
fn flipped_lookup_bit_is_caught_by_full_verify() -> TestResult {
    let dir = TempDir::new()?;
    let path = path_graph(&dir)?;
    let mut bytes = fs::read(&path)?;
    let lookup_start = HEADER_LEN + 7 * 4;
    // start of span 1: 2 -> 3
    bytes[lookup_start + 8] ^= 0x01;
    fs::write(&path, &bytes)?;

    let full = verify(&path, &StoreOptions::default(), VerifyLevel::Full)?;
    assert!(!full.success);
    let errors = error_messages(&full);
    assert!(errors.iter().any(|m| m.contains("lookup section checksum")));
    assert!(errors.len() > 1, "chain break should be reported too: {errors:?}");
    Ok(())
}

#[test]
fn misplaced_separator_is_a_layout_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = path_graph(&dir)?;
    rewrite_data(&path, &[1, 0, -1, 2, -1, 1, -1])?;

    let full = verify(&path, &StoreOptions::default(), VerifyLevel::Full)?;
    assert!(!full.success);
    let errors = error_messages(&full);
    assert!(errors.iter().all(|m| !m.contains("checksum")), "{errors:?}");
    assert!(
        errors.iter().any(|m| m.contains("record 0")),
        "{errors:?}"
    );

    let reader = StoreReader::open(&path, &StoreOptions::default())?;
    assert!(matches!(reader.load(), Err(FlatAdjError::Corruption(_))));
    Ok(())
}

#[test]
fn signed_elements_verify_clean() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("signed.fadj");
    write_store(&path, [vec![-5, 3]], StoreOptions::default().fsync(false))?;

    let full = verify(&path, &StoreOptions::default(), VerifyLevel::Full)?;
    assert!(full.success, "{:?}", full.findings);
    assert_eq!(full.counts.separators_found, 1);
    let reader = StoreReader::open(&path, &StoreOptions::default())?;
    assert_eq!(reader.read_one(0)?, vec![-5, 3]);
    Ok(())
}

#[test]
fn rewritten_negative_element_keeps_layout_valid() -> TestResult {
    let dir = TempDir::new()?;
    let path = path_graph(&dir)?;
    rewrite_data(&path, &[1, -1, -7, 2, -1, 1, -1])?;

    let full = verify(&path, &StoreOptions::default(), VerifyLevel::Full)?;
    assert!(full.success, "{:?}", error_messages(&full));
    let reader = StoreReader::open(&path, &StoreOptions::default())?;
    assert_eq!(reader.read_one(1)?, vec![-7, 2]);
    Ok(())
}

#[test]
fn missing_store_is_an_error_not_a_report() {
    let dir = TempDir::new().expect("tempdir");
    let err = verify(
        dir.path().join("absent.fadj"),
        &StoreOptions::default(),
        VerifyLevel::Fast,
    )
    .expect_err("no store");
    assert!(matches!(err, AdminError::MissingStore(_)), "{err}");
}
