//! Binary entry point for the flatadj command-line tool.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use flatadj::{
    admin::{stats, verify, StatsReport, VerifyLevel, VerifyReport},
    cli::import_export::{
        run_build, run_convert, run_export, run_remap, BuildConfig, CliError, ConvertConfig,
        ExportConfig, RemapConfig,
    },
    compare::{compare_range, CompareReport},
    ingest::write_record_line,
    init_logging,
    storage::{BuildSummary, StoreOptions, StoreReader},
};
use serde::Serialize;
use tracing::debug;

use config::CliConfig;
use ui::{format_duration, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "flatadj",
    version,
    about = "Remap sparse edge lists and serve dense adjacency ranges from a flat store",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "FLATADJ_CONFIG",
        help = "CLI config file (defaults to <config dir>/flatadj/cli.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter directive, e.g. info or flatadj=debug (defaults to RUST_LOG)"
    )]
    log_level: Option<String>,

    #[arg(long, global = true, value_enum, help = "Color theme for text output")]
    theme: Option<ThemeArg>,

    #[arg(long, global = true, help = "Plain output without icons or spinners")]
    quiet: bool,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct StoreArgs {
    #[arg(
        long,
        global = true,
        value_name = "STORE",
        help = "Store file (defaults to [store].default in the CLI config)"
    )]
    store: Option<PathBuf>,

    #[arg(long, global = true, help = "Skip fsync when finishing a build")]
    no_fsync: bool,
}

#[derive(Args, Debug)]
struct RangeArgs {
    #[arg(long, default_value_t = 0, help = "First record (inclusive)")]
    start: u64,

    #[arg(long, help = "End record (exclusive); defaults to the record count")]
    end: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Remap an edge list into dense adjacency-list text")]
    Remap {
        #[arg(value_name = "EDGES")]
        edges: PathBuf,

        #[arg(long, value_name = "FILE", help = "Adjacency-list output")]
        out: PathBuf,

        #[arg(long, value_name = "FILE", help = "Also write the dense/original ID table")]
        table: Option<PathBuf>,
    },

    #[command(about = "Build a store from adjacency-list text")]
    Build {
        #[arg(value_name = "ADJACENCY")]
        adjacency: PathBuf,
    },

    #[command(about = "Remap an edge list and build a store in one step")]
    Convert {
        #[arg(value_name = "EDGES")]
        edges: PathBuf,

        #[arg(long, value_name = "FILE", help = "Also write adjacency-list text")]
        adjacency: Option<PathBuf>,

        #[arg(long, value_name = "FILE", help = "Also write the dense/original ID table")]
        table: Option<PathBuf>,
    },

    #[command(about = "Print a range of records")]
    Read {
        #[command(flatten)]
        range: RangeArgs,
    },

    #[command(about = "Print store statistics")]
    Stats,

    #[command(about = "Verify store structure and checksums")]
    Verify {
        #[arg(long, value_enum, help = "Verification level (default fast)")]
        level: Option<VerifyLevelArg>,
    },

    #[command(about = "Export records as adjacency-list text")]
    Export {
        #[arg(long, value_name = "FILE", help = "Adjacency-list output")]
        out: PathBuf,

        #[command(flatten)]
        range: RangeArgs,
    },

    #[command(about = "Time a text line scan against a store range read")]
    Compare {
        #[arg(value_name = "TEXT")]
        text: PathBuf,

        #[arg(long, default_value_t = 0, help = "First record (inclusive)")]
        start: u64,

        #[arg(long, help = "End record (exclusive)")]
        end: u64,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum VerifyLevelArg {
    Fast,
    Full,
}

impl From<VerifyLevelArg> for VerifyLevel {
    fn from(level: VerifyLevelArg) -> Self {
        match level {
            VerifyLevelArg::Fast => VerifyLevel::Fast,
            VerifyLevelArg::Full => VerifyLevel::Full,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ThemeArg {
    Auto,
    Light,
    Dark,
    Plain,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Plain => Theme::Plain,
        }
    }
}

#[derive(Serialize)]
struct ReadOutput {
    start: u64,
    end: u64,
    records: Vec<Vec<i32>>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;
    let config = CliConfig::load(cli.config.clone())?;
    debug!(config_path = ?config.path(), "cli.config.loaded");

    let theme = cli
        .theme
        .or(config.theme()?)
        .map(Theme::from)
        .unwrap_or(Theme::Auto);
    let ui = Ui::new(theme, cli.quiet || cli.format == OutputFormat::Json);
    let opts = store_options(&cli.store, &config);

    match cli.command {
        Command::Remap { edges, out, table } => {
            let task = ui.task(format!("remapping {}", edges.display()));
            let summary = run_remap(&RemapConfig {
                edges,
                out: out.clone(),
                table_out: table,
            })?;
            let elapsed = task.finish();
            emit(cli.format, &summary, || {
                ui.success(&format!(
                    "Remapped {} edges into {} vertices ({}) -> {}",
                    summary.edges_read,
                    summary.vertices,
                    format_duration(elapsed),
                    out.display()
                ));
            })?;
        }
        Command::Build { adjacency } => {
            let store = resolve_store(&cli.store, &config)?;
            let task = ui.task(format!("building {}", store.display()));
            let summary = run_build(&BuildConfig { adjacency, store }, &opts)?;
            task.finish();
            emit(cli.format, &summary, || print_build_text(&ui, &summary))?;
        }
        Command::Convert {
            edges,
            adjacency,
            table,
        } => {
            let store = resolve_store(&cli.store, &config)?;
            let task = ui.task(format!("converting {}", edges.display()));
            let summary = run_convert(
                &ConvertConfig {
                    edges,
                    store,
                    adjacency_out: adjacency,
                    table_out: table,
                },
                &opts,
            )?;
            task.finish();
            emit(cli.format, &summary, || {
                ui.info(&format!(
                    "Remapped {} edges into {} vertices",
                    summary.remap.edges_read, summary.remap.vertices
                ));
                print_build_text(&ui, &summary.build);
            })?;
        }
        Command::Read { range } => {
            let store = resolve_store(&cli.store, &config)?;
            let reader = StoreReader::open(&store, &opts)?;
            let end = range.end.unwrap_or_else(|| reader.vertex_count());
            let records = reader.read_range(range.start, end)?;
            match cli.format {
                OutputFormat::Json => {
                    let output = ReadOutput {
                        start: range.start,
                        end,
                        records,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    let mut out = BufWriter::new(std::io::stdout().lock());
                    for (offset, record) in records.iter().enumerate() {
                        write_record_line(&mut out, range.start + offset as u64, record)?;
                    }
                    out.flush()?;
                }
            }
        }
        Command::Stats => {
            let store = resolve_store(&cli.store, &config)?;
            let report = stats(&store, &opts)?;
            emit(cli.format, &report, || print_stats_text(&ui, &report))?;
        }
        Command::Verify { level } => {
            let store = resolve_store(&cli.store, &config)?;
            let level = level
                .or(config.verify_level()?)
                .unwrap_or(VerifyLevelArg::Fast);
            let report = verify(&store, &opts, level.into())?;
            emit(cli.format, &report, || print_verify_text(&ui, &report))?;
            if !report.success {
                std::process::exit(2);
            }
        }
        Command::Export { out, range } => {
            let store = resolve_store(&cli.store, &config)?;
            let summary = run_export(
                &ExportConfig {
                    store,
                    out: out.clone(),
                    start: Some(range.start),
                    end: range.end,
                },
                &opts,
            )?;
            emit(cli.format, &summary, || {
                ui.success(&format!(
                    "Exported records {}..{} ({} lines) -> {}",
                    summary.start,
                    summary.end,
                    summary.records_exported,
                    out.display()
                ));
            })?;
        }
        Command::Compare { text, start, end } => {
            let store = resolve_store(&cli.store, &config)?;
            let report = compare_range(&text, &store, start, end)?;
            emit(cli.format, &report, || print_compare_text(&ui, &report))?;
        }
    }

    Ok(())
}

fn store_options(args: &StoreArgs, config: &CliConfig) -> StoreOptions {
    let fsync = !args.no_fsync && config.fsync().unwrap_or(true);
    StoreOptions::default().fsync(fsync)
}

fn resolve_store(args: &StoreArgs, config: &CliConfig) -> Result<PathBuf, CliError> {
    args.store
        .clone()
        .or_else(|| config.default_store_path().cloned())
        .ok_or_else(|| {
            CliError::Message(
                "no store given; pass --store or set [store].default in the CLI config".into(),
            )
        })
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_build_text(ui: &Ui, summary: &BuildSummary) {
    ui.success(&format!("Store written to {}", summary.path.display()));
    ui.section(
        "Store",
        [
            ("vertices", summary.vertices.to_string()),
            ("elements", summary.elements.to_string()),
            ("file bytes", summary.file_bytes.to_string()),
            ("data crc32", format!("{:#010x}", summary.data_crc32)),
            ("lookup crc32", format!("{:#010x}", summary.lookup_crc32)),
            ("duration", format!("{:.2} ms", summary.duration_ms)),
        ],
    );
}

fn print_stats_text(ui: &Ui, report: &StatsReport) {
    ui.section(
        "Store",
        [
            ("format", report.store.format_version.clone()),
            ("vertices", report.store.vertices.to_string()),
            ("elements", report.store.elements.to_string()),
            ("neighbor entries", report.store.neighbor_entries.to_string()),
        ],
    );
    ui.spacer();
    ui.section(
        "Degrees",
        [
            ("min", report.degrees.min.to_string()),
            ("max", report.degrees.max.to_string()),
            ("mean", format!("{:.3}", report.degrees.mean)),
            ("empty records", report.degrees.empty_records.to_string()),
        ],
    );
    ui.spacer();
    ui.section(
        "Filesystem",
        [
            ("path", report.filesystem.store_path.clone()),
            ("size bytes", report.filesystem.size_bytes.to_string()),
            ("data bytes", report.filesystem.data_bytes.to_string()),
            ("lookup bytes", report.filesystem.lookup_bytes.to_string()),
        ],
    );
}

fn print_verify_text(ui: &Ui, report: &VerifyReport) {
    let level = match report.level {
        VerifyLevel::Fast => "fast",
        VerifyLevel::Full => "full",
    };
    if report.success {
        ui.success(&format!("Verify ({level}) passed"));
    } else {
        ui.warn(&format!("Verify ({level}) failed"));
    }
    ui.section(
        "Counts",
        [
            ("vertices", report.counts.vertices),
            ("elements", report.counts.elements),
            ("spans checked", report.counts.spans_checked),
            ("separators", report.counts.separators_found),
        ],
    );
    ui.list(
        "Findings",
        report
            .findings
            .iter()
            .map(|finding| format!("{:?}: {}", finding.severity, finding.message)),
    );
}

fn print_compare_text(ui: &Ui, report: &CompareReport) {
    let speedup = report
        .speedup()
        .map(|factor| format!("{factor:.1}x"))
        .unwrap_or_else(|| "n/a".to_string());
    ui.section(
        &format!("Records {}..{}", report.start, report.end),
        [
            ("text lines", report.text_lines.to_string()),
            ("store records", report.store_records.to_string()),
            ("text scan", format!("{:.3} ms", report.text_ms)),
            ("store read", format!("{:.3} ms", report.store_ms)),
            ("speedup", speedup),
        ],
    );
}
