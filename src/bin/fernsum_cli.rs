//! Command-line entrypoint: summarize one local file.
//!
//! `.pdf` files go through the PDF extractor, anything else is read as UTF-8 text. The
//! summary goes to stdout; diagnostics and partial-failure notices go to stderr.
use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use fernsum::{
    config, extract, logging,
    pipeline::{Document, SummarizationPipeline, aggregate},
};

#[derive(Parser)]
#[command(name = "fernsum-cli", about = "Summarize a PDF or text file segment by segment")]
struct Cli {
    /// Document to summarize.
    path: PathBuf,
    /// Soft bound on segment length, in characters (defaults to MAX_SEGMENT_LENGTH).
    #[arg(long)]
    max_segment_length: Option<usize>,
    /// Prefix the summary with a heading naming the file.
    #[arg(long)]
    title: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli_tracing();
    let config = config::load().context("failed to load configuration")?;

    let bytes = fs::read(&cli.path).with_context(|| format!("reading {}", cli.path.display()))?;
    let text = extract::extractor_for_path(&cli.path, config.max_upload_bytes)
        .extract(&bytes)
        .with_context(|| format!("extracting text from {}", cli.path.display()))?;

    let name = cli
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let mut document = Document::new(text);
    document.name = name.clone();

    let pipeline =
        SummarizationPipeline::from_config(&config).context("failed to build backend client")?;
    let max_segment_length = cli
        .max_segment_length
        .unwrap_or_else(|| pipeline.default_max_segment_length());

    let result = pipeline
        .run(&document, max_segment_length)
        .await
        .context("summarization failed")?;

    if result.is_partial() {
        eprintln!(
            "{} of {} sections summarized",
            result.succeeded(),
            result.attempted()
        );
        for failure in result.failures() {
            eprintln!("  section {}: {}", failure.index + 1, failure.detail);
        }
    }

    match (cli.title, name) {
        (true, Some(name)) => println!("{}", aggregate::titled(&name, result.summary())),
        _ => println!("{}", result.summary()),
    }
    Ok(())
}
