#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const EDGES: &str = "1 2 0\n2 3 0\n40 40 1\n3 1 0\n";

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = dir.path().join("cli.toml");
        fs::write(&config, "").expect("write empty config");
        fs::write(dir.path().join("edges.txt"), EDGES).expect("write edges");
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn store(&self) -> PathBuf {
        self.path("graph.fadj")
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("flatadj");
        cmd.env_remove("RUST_LOG")
            .env("FLATADJ_CONFIG", &self.config)
            .arg("--no-fsync");
        cmd
    }

    fn convert(&self) {
        self.cmd()
            .arg("convert")
            .arg(self.path("edges.txt"))
            .arg("--store")
            .arg(self.store())
            .assert()
            .success();
    }
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("valid json")
}

fn stdout_text(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("utf-8 stdout")
}

#[test]
fn convert_emits_json_summary() {
    let ws = Workspace::new();
    let json = json_stdout(
        ws.cmd()
            .args(["--format", "json", "convert"])
            .arg(ws.path("edges.txt"))
            .arg("--store")
            .arg(ws.store())
            .arg("--table")
            .arg(ws.path("table.txt")),
    );
    assert_eq!(json["remap"]["edges_read"], 4);
    assert_eq!(json["remap"]["vertices"], 4);
    assert_eq!(json["build"]["vertices"], 4);
    assert!(ws.store().exists());
    assert_eq!(
        fs::read_to_string(ws.path("table.txt")).expect("table"),
        "0 1\n1 2\n2 3\n3 40\n"
    );
}

#[test]
fn help_lists_every_subcommand() {
    let ws = Workspace::new();
    let text = stdout_text(ws.cmd().arg("--help"));
    for name in [
        "remap", "build", "convert", "read", "stats", "verify", "export", "compare",
    ] {
        assert!(text.contains(name), "missing {name} in:\n{text}");
    }
}

#[test]
fn read_prints_adjacency_lines() {
    let ws = Workspace::new();
    ws.convert();
    let text = stdout_text(
        ws.cmd()
            .args(["read", "--start", "1", "--end", "4", "--store"])
            .arg(ws.store()),
    );
    assert_eq!(text, "1 0 2\n2 0 1\n3 3\n");

    let json = json_stdout(
        ws.cmd()
            .args(["--format", "json", "read", "--store"])
            .arg(ws.store()),
    );
    assert_eq!(json["end"], 4);
    assert_eq!(json["records"][0], serde_json::json!([1, 2]));
}

#[test]
fn read_out_of_range_fails() {
    let ws = Workspace::new();
    ws.convert();
    let output = ws
        .cmd()
        .args(["read", "--start", "2", "--end", "9", "--store"])
        .arg(ws.store())
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("outside store of 4 records"), "{stderr}");
}

#[test]
fn stats_reports_degrees() {
    let ws = Workspace::new();
    ws.convert();
    let json = json_stdout(
        ws.cmd()
            .args(["--format", "json", "stats", "--store"])
            .arg(ws.store()),
    );
    assert_eq!(json["store"]["vertices"], 4);
    assert_eq!(json["store"]["neighbor_entries"], 7);
    assert_eq!(json["degrees"]["min"], 1);
    assert_eq!(json["degrees"]["max"], 2);
    assert!(json["filesystem"]["size_bytes"].is_number());
}

#[test]
fn verify_full_succeeds_then_fails_on_corruption() {
    let ws = Workspace::new();
    ws.convert();
    let json = json_stdout(
        ws.cmd()
            .args(["--format", "json", "verify", "--level", "full", "--store"])
            .arg(ws.store()),
    );
    assert_eq!(json["success"], true);
    assert_eq!(json["level"], "full");

    let mut bytes = fs::read(ws.store()).expect("read store");
    let last = bytes.len() - 1;
    bytes[last] ^= 0x10;
    fs::write(ws.store(), bytes).expect("write store");

    let output = ws
        .cmd()
        .args(["--format", "json", "verify", "--level", "full", "--store"])
        .arg(ws.store())
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["success"], false);
    assert!(json["findings"]
        .as_array()
        .is_some_and(|findings| !findings.is_empty()));
}

#[test]
fn remap_build_export_round_trip() {
    let ws = Workspace::new();
    let adjacency = ws.path("adj.txt");
    ws.cmd()
        .arg("remap")
        .arg(ws.path("edges.txt"))
        .arg("--out")
        .arg(&adjacency)
        .assert()
        .success();
    ws.cmd()
        .arg("build")
        .arg(&adjacency)
        .arg("--store")
        .arg(ws.store())
        .assert()
        .success();

    let exported = ws.path("exported.txt");
    let json = json_stdout(
        ws.cmd()
            .args(["--format", "json", "export", "--out"])
            .arg(&exported)
            .arg("--store")
            .arg(ws.store()),
    );
    assert_eq!(json["records_exported"], 4);
    assert_eq!(read(&exported), read(&adjacency));
}

#[test]
fn compare_counts_both_sides() {
    let ws = Workspace::new();
    let adjacency = ws.path("adj.txt");
    ws.cmd()
        .arg("convert")
        .arg(ws.path("edges.txt"))
        .arg("--adjacency")
        .arg(&adjacency)
        .arg("--store")
        .arg(ws.store())
        .assert()
        .success();

    let json = json_stdout(
        ws.cmd()
            .args(["--format", "json", "compare", "--start", "1", "--end", "3"])
            .arg(&adjacency)
            .arg("--store")
            .arg(ws.store()),
    );
    assert_eq!(json["text_lines"], 2);
    assert_eq!(json["store_records"], 2);
}

#[test]
fn store_path_comes_from_config() {
    let ws = Workspace::new();
    ws.convert();
    fs::write(
        &ws.config,
        format!("[store]\ndefault = {:?}\nfsync = false\n", ws.store()),
    )
    .expect("write config");
    let text = stdout_text(ws.cmd().args(["read", "--end", "1"]));
    assert_eq!(text, "0 1 2\n");
}

#[test]
fn missing_store_argument_is_reported() {
    let ws = Workspace::new();
    let output = ws
        .cmd()
        .arg("stats")
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("no store given"));
}

#[test]
fn unknown_config_key_is_rejected() {
    let ws = Workspace::new();
    fs::write(&ws.config, "[store]\nbogus = 1\n").expect("write config");
    ws.cmd()
        .arg("stats")
        .arg("--store")
        .arg(ws.store())
        .assert()
        .failure();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read text output")
}
