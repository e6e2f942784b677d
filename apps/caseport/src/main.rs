use anyhow::{Context, Result};
use caseport_config::{CaseportConfig, load_config};
use caseport_engine::{ExportOptions, Exporter, ItemFailure, run_batched};
use caseport_ingest_json::JsonDumpClient;
use caseport_logging::LogLevel;
use caseport_merge::merge_export_dirs;
use caseport_output_layout::ExportPaths;
use caseport_ports::SourceClient;
use caseport_render_json::{FileSink, write_json};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "caseport")]
#[command(about = "Export test-management projects into canonical JSON.", long_about = None)]
struct Cli {
    /// Configuration file (YAML, or JSON by extension).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one or more source dumps. Several sources run as batches and are merged.
    Export {
        /// Source dump (JSON). Repeat for batched mode.
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,
        /// Output directory. Overrides the configured one.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge already written batch exports into one.
    Merge {
        /// Batch export directory. Repeat once per batch.
        #[arg(long = "batch", required = true)]
        batches: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CaseportConfig::default(),
    };
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = LogLevel::Debug;
    }
    caseport_logging::init(&logging);

    match cli.cmd {
        Command::Export { sources, out } => {
            let out = out.unwrap_or_else(|| config.output_dir.clone());
            export(&sources, &out, &config.export_options())
        }
        Command::Merge { batches, out } => {
            let report = merge_export_dirs(&batches, &out, config.option_merge)?;
            println!("wrote:");
            println!("- {}", ExportPaths::new(&out).main_json().display());
            println!(
                "merged {} batches ({} documents rewritten, {} files copied, {} skipped)",
                report.batches,
                report.documents_rewritten,
                report.files_copied,
                report.skipped.len()
            );
            for skipped in &report.skipped {
                println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
            }
            Ok(())
        }
    }
}

fn export(sources: &[PathBuf], out: &Path, options: &ExportOptions) -> Result<()> {
    let paths = ExportPaths::new(out);
    let failures: Vec<ItemFailure> = if let [source] = sources {
        let client = JsonDumpClient::open(source)?;
        let sink = FileSink::create(out)?;
        let summary = Exporter::new(&client, &sink, options.clone())
            .run()
            .with_context(|| format!("export {source:?}"))?;
        println!(
            "exported {} test cases and {} shared steps from {:?}",
            summary.test_cases, summary.shared_steps, summary.project_name
        );
        summary.failures
    } else {
        let shards = sources
            .iter()
            .map(|source| {
                JsonDumpClient::open(source).map(|c| Box::new(c) as Box<dyn SourceClient>)
            })
            .collect::<Result<Vec<_>>>()?;
        let summary = run_batched(&shards, out, options)?;
        for (dir, batch) in summary.batch_dirs.iter().zip(&summary.batches) {
            info!(batch = %dir.display(), test_cases = batch.test_cases, "batch written");
        }
        println!(
            "exported {} batches; merged {} documents",
            summary.batches.len(),
            summary.merge.documents_rewritten
        );
        summary.failures().cloned().collect()
    };

    println!("wrote:");
    println!("- {}", paths.main_json().display());
    if !failures.is_empty() {
        write_json(&paths.failures_json(), &failures)?;
        println!("- {} ({} items failed)", paths.failures_json().display(), failures.len());
    }
    Ok(())
}
