use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use hiac_extract::export::Template;
use hiac_extract::models::SourceDocument;
use hiac_extract::services::batch_service::{export_records, BatchError, BatchOutcome};
use hiac_extract::services::{BatchService, Diagnostic};
use hiac_extract::session::{UploadSession, DEFAULT_FILE_NAME};

#[derive(Parser)]
#[command(name = "hiac-extract")]
#[command(about = "Extract HIAC particle-counter reports into iLab / Harmonised DAA Excel templates", long_about = None)]
struct Cli {
    /// HIAC report PDFs, rows are written in this order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory the workbooks are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Name of the iLab workbook (without extension)
    #[arg(long, env = "DEFAULT_FILE_NAME", default_value = DEFAULT_FILE_NAME)]
    file_name: String,

    /// Also write the Harmonised DAA template
    #[arg(long)]
    detail: bool,

    /// Print the extracted records as JSON instead of writing workbooks
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (documents, read_failures) = read_documents(&cli.files);
    let session = UploadSession::default()
        .with_file_name(&cli.file_name)
        .with_documents(documents);

    let service = BatchService::with_pdf_extractor()?;
    let mut outcome = extract_with_progress(&service, session.documents());
    outcome.diagnostics = read_failures
        .into_iter()
        .chain(outcome.diagnostics)
        .collect();

    for diagnostic in &outcome.diagnostics {
        warn!("{}", diagnostic);
    }

    if cli.json {
        if outcome.records.is_empty() {
            return Err(BatchError::NothingToExport.into());
        }
        println!("{}", serde_json::to_string_pretty(&outcome.records)?);
        return Ok(());
    }

    let mut templates = vec![Template::Aggregate];
    if cli.detail {
        templates.push(Template::Detail);
    }

    let export = export_records(outcome, &templates)?;
    fs::create_dir_all(&cli.output_dir)?;

    for (template, workbook) in &export.workbooks {
        let file_name = match template {
            Template::Aggregate => session.aggregate_file_name(),
            Template::Detail => session.detail_file_name().to_string(),
        };
        let path = cli.output_dir.join(file_name);
        fs::write(&path, &workbook.bytes)?;
        info!("Wrote {} template to {}", template, path.display());
        println!("{}", path.display());
    }

    info!(
        "Exported {} records ({} diagnostics)",
        export.records.len(),
        export.diagnostics.len()
    );
    Ok(())
}

/// Read every file up front. Files that cannot be read are reported as
/// skipped with the I/O error and left out of the batch.
fn read_documents(paths: &[PathBuf]) -> (Vec<SourceDocument>, Vec<Diagnostic>) {
    let mut documents = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        match fs::read(path) {
            Ok(bytes) => documents.push(SourceDocument::new(name, bytes)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                failures.push(Diagnostic::DocumentSkipped {
                    document: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    (documents, failures)
}

fn extract_with_progress(service: &BatchService, documents: &[SourceDocument]) -> BatchOutcome {
    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let outcome = service.extract_batch_with(documents, |document| {
        pb.set_message(document.name.clone());
        pb.inc(1);
    });
    pb.finish_with_message("done");

    outcome
}
