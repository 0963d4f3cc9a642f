#![allow(missing_docs)]

use std::sync::Arc;

use flatadj::storage::{
    build, write_store, StoreBuilder, StoreOptions, StoreReader, StoreWriter, HEADER_LEN,
};
use flatadj::types::{Element, FlatAdjError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

fn random_records(seed: u64, count: usize, max_degree: usize) -> Vec<Vec<Element>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let degree = rng.gen_range(0..=max_degree);
            let mut record: Vec<Element> = (0..degree)
                .map(|_| rng.gen_range(0..count as Element))
                .collect();
            record.sort_unstable();
            record
        })
        .collect()
}

fn quick() -> StoreOptions {
    StoreOptions::default().fsync(false)
}

#[test]
fn disk_store_matches_in_memory_store() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("random.fadj");
    let records = random_records(7, 2_000, 24);

    let summary = write_store(&path, &records, quick())?;
    let memory = build(&records)?;
    assert_eq!(summary.vertices, records.len() as u64);
    assert_eq!(summary.elements, memory.data().len() as u64);

    let reader = StoreReader::open(&path, &StoreOptions::default().verify_checksums(true))?;
    assert_eq!(reader.load()?, memory);
    assert_eq!(reader.lookup()?, memory.lookup());
    Ok(())
}

#[test]
fn random_ranges_read_back_exactly() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ranges.fadj");
    let records = random_records(11, 750, 16);
    write_store(&path, &records, quick())?;
    let reader = StoreReader::open(&path, &StoreOptions::default())?;

    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for _ in 0..200 {
        let a = rng.gen_range(0..=records.len());
        let b = rng.gen_range(0..=records.len());
        let (start, end) = (a.min(b), a.max(b));
        let got = reader.read_range(start as u64, end as u64)?;
        assert_eq!(got.len(), end - start);
        assert_eq!(got.as_slice(), &records[start..end]);
    }
    for id in [0, records.len() / 2, records.len() - 1] {
        assert_eq!(reader.read_one(id as u64)?, records[id]);
    }
    Ok(())
}

#[test]
fn flat_range_includes_separators() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("flat.fadj");
    write_store(&path, [vec![1], vec![0, 2], vec![1]], quick())?;
    let reader = StoreReader::open(&path, &StoreOptions::default())?;
    assert_eq!(reader.read_range_flat(0, 3)?, vec![1, -1, 0, 2, -1, 1, -1]);
    assert_eq!(reader.read_range_flat(2, 3)?, vec![1, -1]);
    assert!(reader.read_range_flat(1, 1)?.is_empty());
    Ok(())
}

#[test]
fn streaming_writer_matches_builder_record_by_record() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("stream.fadj");
    let records = random_records(3, 64, 6);

    let mut writer = StoreWriter::create(&path, quick())?;
    let mut builder = StoreBuilder::new();
    for record in &records {
        assert_eq!(writer.push_record(record)?, builder.push_record(record)?);
    }
    assert_eq!(writer.element_count(), builder.element_count());
    writer.finish()?;

    let reader = StoreReader::open(&path, &StoreOptions::default())?;
    assert_eq!(reader.load()?, builder.finish());
    Ok(())
}

#[test]
fn range_errors_report_bounds() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("bounds.fadj");
    write_store(&path, [vec![1], vec![0]], quick())?;
    let reader = StoreReader::open(&path, &StoreOptions::default())?;

    assert!(reader.read_range(2, 2)?.is_empty());
    match reader.read_range(1, 3) {
        Err(FlatAdjError::Range { start, end, count }) => {
            assert_eq!((start, end, count), (1, 3, 2));
        }
        other => panic!("expected range error, got {other:?}"),
    }
    assert!(matches!(
        reader.read_one(2),
        Err(FlatAdjError::Range { .. })
    ));
    Ok(())
}

#[test]
fn concurrent_readers_share_one_handle() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("shared.fadj");
    let records = Arc::new(random_records(21, 500, 10));
    write_store(&path, records.iter(), quick())?;
    let reader = Arc::new(StoreReader::open(&path, &StoreOptions::default())?);

    let handles: Vec<_> = (0..4u64)
        .map(|worker| {
            let reader = Arc::clone(&reader);
            let records = Arc::clone(&records);
            std::thread::spawn(move || -> Result<()> {
                let mut start = worker * 25;
                while start < records.len() as u64 {
                    let end = (start + 17).min(records.len() as u64);
                    let got = reader.read_range(start, end)?;
                    assert_eq!(got.as_slice(), &records[start as usize..end as usize]);
                    start += 100;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("reader thread panicked")?;
    }
    Ok(())
}

#[test]
fn file_size_follows_layout() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("size.fadj");
    let records = random_records(5, 40, 5);
    let elements: usize = records.iter().map(|r| r.len() + 1).sum();
    let summary = write_store(&path, &records, quick())?;
    assert_eq!(
        summary.file_bytes,
        (HEADER_LEN + elements * 4 + records.len() * 8) as u64
    );
    assert_eq!(std::fs::metadata(&path)?.len(), summary.file_bytes);
    Ok(())
}
