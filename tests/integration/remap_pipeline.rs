#![allow(missing_docs)]

use std::fs;
use std::io::Cursor;
use std::path::Path;

use flatadj::cli::import_export::{
    run_build, run_convert, run_export, run_remap, BuildConfig, ConvertConfig, ExportConfig,
    RemapConfig,
};
use flatadj::ingest::{write_adjacency, AdjacencyReader, Edge, EdgeReader};
use flatadj::storage::{build, StoreOptions, StoreReader};
use flatadj::types::{DenseId, Element, FlatAdjError, Result, VertexId};
use flatadj::{remap, remap_stream};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

fn quick() -> StoreOptions {
    StoreOptions::default().fsync(false)
}

fn edges_from_text(text: &str) -> Result<flatadj::RemappedGraph> {
    remap_stream(EdgeReader::new(Cursor::new(text)))
}

fn write_edges(path: &Path, lines: &[String]) -> Result<()> {
    fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

#[test]
fn self_loop_becomes_single_record() -> Result<()> {
    let graph = edges_from_text("5 5 0\n")?;
    assert_eq!(graph.table().dense(VertexId(5)), Some(DenseId(0)));

    let records: Vec<Vec<Element>> = graph.records().collect();
    assert_eq!(records, vec![vec![0]]);

    let store = build(&records)?;
    assert_eq!(store.data(), &[0, -1]);
    let spans: Vec<(u32, u32)> = store.lookup().iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(spans, vec![(0, 2)]);
    assert_eq!(store.vertex_count(), 1);
    Ok(())
}

#[test]
fn path_graph_flattens_with_separators() -> Result<()> {
    let graph = edges_from_text("1 2 0\n2 3 0\n")?;
    let records: Vec<Vec<Element>> = graph.records().collect();
    assert_eq!(records, vec![vec![1], vec![0, 2], vec![1]]);

    let store = build(&records)?;
    assert_eq!(store.data(), &[1, -1, 0, 2, -1, 1, -1]);
    let spans: Vec<(u32, u32)> = store.lookup().iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(spans, vec![(0, 2), (2, 5), (5, 7)]);
    assert_eq!(store.read_range(0, 3)?, records);
    assert_eq!(store.read_range(1, 2)?, vec![store.read_one(1)?]);
    Ok(())
}

#[test]
fn sparse_ids_are_compacted_in_ascending_order() -> Result<()> {
    let graph = remap([Edge::new(900, -4), Edge::new(17, 900), Edge::new(17, 17)])?;
    let table: Vec<(i64, u32)> = graph.table().iter().map(|(v, d)| (v.0, d.0)).collect();
    assert_eq!(table, vec![(-4, 0), (17, 1), (900, 2)]);
    assert_eq!(graph.neighbors(DenseId(1)), Some(&[DenseId(1), DenseId(2)][..]));
    assert_eq!(graph.table().original(DenseId(2)), Some(VertexId(900)));
    assert_eq!(graph.table().dense(VertexId(18)), None);
    Ok(())
}

#[test]
fn shuffled_input_yields_identical_output() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut lines: Vec<String> = (0..400)
        .map(|_| {
            let from: i64 = rng.gen_range(-50..5_000);
            let to: i64 = rng.gen_range(-50..5_000);
            format!("{from} {to} {}", rng.gen_range(0..10))
        })
        .collect();

    let baseline = edges_from_text(&lines.join("\n"))?;
    for _ in 0..5 {
        lines.shuffle(&mut rng);
        assert_eq!(edges_from_text(&lines.join("\n"))?, baseline);
    }
    Ok(())
}

#[test]
fn neighbor_relation_is_symmetric() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let edges: Vec<Edge> = (0..300)
        .map(|_| Edge::new(rng.gen_range(0..120), rng.gen_range(0..120)))
        .collect();
    let graph = remap(edges)?;

    for (id, neighbors) in graph.iter() {
        assert!(neighbors.windows(2).all(|w| w[0] <= w[1]), "unsorted {id}");
        for n in neighbors {
            let back = graph.neighbors(*n).expect("neighbor has a record");
            assert!(back.contains(&id), "{n} does not list {id}");
        }
    }
    Ok(())
}

#[test]
fn single_edge_vertex_gets_one_neighbor() -> Result<()> {
    let graph = edges_from_text("10 20\n20 30\n")?;
    let dense = graph.table().dense(VertexId(10)).expect("10 survives");
    assert_eq!(graph.neighbors(dense).map(<[DenseId]>::len), Some(1));
    assert_eq!(graph.len(), 3);
    Ok(())
}

#[test]
fn empty_input_builds_empty_store() -> Result<()> {
    let graph = edges_from_text("")?;
    assert!(graph.is_empty());
    let store = build(graph.records())?;
    assert!(store.is_empty());
    assert!(store.read_range(0, 0)?.is_empty());
    assert!(matches!(
        store.read_range(0, 1),
        Err(FlatAdjError::Range { .. })
    ));
    Ok(())
}

#[test]
fn blank_edge_line_aborts_remap() {
    match edges_from_text("1 2 0\n\n2 3 0\n") {
        Err(FlatAdjError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn parse_error_names_the_line() {
    match edges_from_text("1 2\n3 4\nfive 6\n") {
        Err(FlatAdjError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn adjacency_text_round_trips_through_reader() -> Result<()> {
    let graph = edges_from_text("3 1\n1 2\n2 3\n7 7\n")?;
    let mut text = Vec::new();
    write_adjacency(&graph, &mut text)?;
    let parsed: Vec<Vec<Element>> =
        AdjacencyReader::new(Cursor::new(text)).collect::<Result<_>>()?;
    assert_eq!(parsed, graph.records().collect::<Vec<_>>());
    Ok(())
}

#[test]
fn remap_then_build_matches_convert() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let edges = dir.path().join("edges.txt");
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let lines: Vec<String> = (0..250)
        .map(|_| format!("{} {} 0", rng.gen_range(0..400), rng.gen_range(0..400)))
        .collect();
    write_edges(&edges, &lines)?;

    let adjacency = dir.path().join("adj.txt");
    let table = dir.path().join("table.txt");
    let remapped = run_remap(&RemapConfig {
        edges: edges.clone(),
        out: adjacency.clone(),
        table_out: Some(table.clone()),
    })?;
    assert_eq!(remapped.edges_read, 250);

    let two_step = dir.path().join("two_step.fadj");
    let built = run_build(
        &BuildConfig {
            adjacency: adjacency.clone(),
            store: two_step.clone(),
        },
        &quick(),
    )?;
    assert_eq!(built.vertices, remapped.vertices);

    let one_step = dir.path().join("one_step.fadj");
    let converted = run_convert(
        &ConvertConfig {
            edges,
            store: one_step.clone(),
            adjacency_out: None,
            table_out: None,
        },
        &quick(),
    )?;
    assert_eq!(converted.build.data_crc32, built.data_crc32);
    assert_eq!(fs::read(&one_step)?, fs::read(&two_step)?);

    let table_lines = fs::read_to_string(&table)?;
    assert_eq!(table_lines.lines().count() as u64, remapped.vertices);
    for (expected, line) in table_lines.lines().enumerate() {
        let dense: usize = line.split_whitespace().next().unwrap_or("").parse()?;
        assert_eq!(dense, expected);
    }

    let exported = dir.path().join("exported.txt");
    let summary = run_export(
        &ExportConfig {
            store: one_step.clone(),
            out: exported.clone(),
            start: None,
            end: None,
        },
        &quick(),
    )?;
    assert_eq!(summary.records_exported, remapped.vertices);
    assert_eq!(fs::read_to_string(&exported)?, fs::read_to_string(&adjacency)?);

    let reader = StoreReader::open(&one_step, &StoreOptions::default())?;
    assert_eq!(reader.vertex_count(), remapped.vertices);
    Ok(())
}

#[test]
fn failed_remap_leaves_no_output() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let edges = dir.path().join("bad.txt");
    write_edges(&edges, &["1 2".to_string(), "2 x".to_string()])?;
    let out = dir.path().join("adj.txt");
    let err = run_remap(&RemapConfig {
        edges,
        out: out.clone(),
        table_out: None,
    })
    .expect_err("bad edge line");
    assert!(err.to_string().contains("line 2"), "{err}");
    assert!(!out.exists());
    Ok(())
}
