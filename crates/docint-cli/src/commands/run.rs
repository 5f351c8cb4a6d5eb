//! Run command - full extraction over the configured inputs.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use docint_core::models::config::VectorizerBackend;
use docint_core::{build_vectorizer, FinalReport, RunCoordinator, RunEvent};

use super::load_config;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Credit-bureau report directory
    #[arg(long)]
    bureau_dir: Option<PathBuf>,

    /// GST filing directory
    #[arg(long)]
    gst_dir: Option<PathBuf>,

    /// Parameter catalog (CSV)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Vectorizer backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Print the report to stdout as well
    #[arg(long)]
    print: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Backend {
    /// ONNX sentence encoder
    Onnx,
    /// Feature hashing, no model files
    Hash,
}

impl From<Backend> for VectorizerBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Onnx => VectorizerBackend::Onnx,
            Backend::Hash => VectorizerBackend::Hash,
        }
    }
}

pub async fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = args.bureau_dir {
        config.inputs.bureau_dir = dir;
    }
    if let Some(dir) = args.gst_dir {
        config.inputs.gst_dir = dir;
    }
    if let Some(catalog) = args.catalog {
        config.inputs.catalog_path = catalog;
    }
    if let Some(output) = args.output {
        config.output.path = output;
    }
    if let Some(backend) = args.backend {
        config.vectorizer.backend = backend.into();
    }

    let vectorizer = build_vectorizer(&config.vectorizer)?;
    let output_path = config.output.path.clone();
    let coordinator = RunCoordinator::new(config, vectorizer);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let report = coordinator.run_with(|event| match event {
        RunEvent::Started { total } => pb.set_length(total as u64),
        RunEvent::Document { document, .. } => {
            pb.set_message(document);
            pb.inc(1);
        }
    });
    pb.finish_and_clear();

    let report = report?;
    coordinator.persist(&report)?;

    if args.print {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    print_summary(&report, &output_path, start);

    Ok(())
}

fn print_summary(report: &FinalReport, output_path: &std::path::Path, start: Instant) {
    let found: usize = report
        .bureau_parameters_by_document
        .values()
        .map(|r| r.iter().filter(|(_, result)| result.is_found()).count())
        .sum();
    let total: usize = report
        .bureau_parameters_by_document
        .values()
        .map(|r| r.len())
        .sum();

    eprintln!(
        "{} Processed {} bureau and {} GST documents in {:.2?}",
        style("✓").green(),
        report.bureau_parameters_by_document.len(),
        report.gst_sales.len(),
        start.elapsed()
    );
    eprintln!("  Bureau fields found: {}/{}", found, total);
    eprintln!(
        "  Overall confidence:  {}",
        style(format!("{:.2}", report.overall_confidence_score)).cyan().bold()
    );

    if !report.failed_documents.is_empty() {
        eprintln!(
            "{} {} documents failed:",
            style("⚠").yellow(),
            report.failed_documents.len()
        );
        for failure in &report.failed_documents {
            eprintln!("  {} [{}] {}", failure.document, failure.kind, failure.error);
        }
    }

    if let Some(timestamp) = report.run_timestamp_utc {
        eprintln!("  Finished at {}", timestamp.to_rfc3339());
    }
    eprintln!("  Output written to {}", output_path.display());
}
