use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docmeta_core::{Config, ExtractionPipeline, PipelineError, TextExtraction, Upload};
use docmeta_openai::OpenAiGenerator;
use docmeta_pdf_mupdf::MupdfExtractor;

mod output;

use output::ColorMode;

/// docmeta - Extract structured metadata from PDF documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract metadata from a local PDF and print the response JSON
    Extract {
        /// Path to the PDF file
        file_path: PathBuf,

        /// Dry run: extract text and print stats without calling the model
        #[arg(long)]
        dry_run: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Model to use instead of the configured one
        #[arg(long)]
        model: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            file_path,
            dry_run,
            pretty,
            model,
            no_color,
        } => {
            let color = ColorMode(!no_color && std::io::stderr().is_terminal());
            let result = if dry_run {
                dry_run_extract(&file_path, !no_color).await
            } else {
                extract(&file_path, pretty, model).await
            };

            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    let mut stderr = std::io::stderr();
                    // Pipeline errors carry the server's wording; anything else
                    // gets its full context chain.
                    let message = match e.downcast_ref::<PipelineError>() {
                        Some(pipeline_err) => pipeline_err.to_string(),
                        None => format!("{e:#}"),
                    };
                    let _ = output::print_error(&mut stderr, &message, color);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn read_upload(file_path: &Path) -> anyhow::Result<Upload> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());
    let data = std::fs::read(file_path)
        .with_context(|| format!("failed to read {}", file_path.display()))?;

    Ok(Upload::new(file_name, data))
}

fn load_config(model: Option<String>) -> anyhow::Result<Config> {
    let mut config = Config::load().context("invalid configuration")?;
    if let Some(model) = model {
        config.model = model;
    }
    Ok(config)
}

async fn extract(file_path: &Path, pretty: bool, model: Option<String>) -> anyhow::Result<()> {
    let config = load_config(model)?;
    let upload = read_upload(file_path)?;

    let generator = OpenAiGenerator::from_config(&config)?;
    let pipeline = ExtractionPipeline::new(
        Arc::new(MupdfExtractor::new()),
        Arc::new(generator),
        &config,
    );

    let envelope = pipeline.extract(Some(upload)).await?;

    let mut stdout = std::io::stdout().lock();
    output::print_envelope(&mut stdout, &envelope, pretty)?;
    stdout.flush()?;
    Ok(())
}

async fn dry_run_extract(file_path: &Path, allow_color: bool) -> anyhow::Result<()> {
    let config = load_config(None)?;
    let upload = read_upload(file_path)?;

    let stage = TextExtraction::new(Arc::new(MupdfExtractor::new()), &config);
    let (filename, extracted) = stage.run(Some(upload)).await?;

    let color = ColorMode(allow_color && std::io::stdout().is_terminal());
    let mut stdout = std::io::stdout().lock();
    output::print_dry_run(
        &mut stdout,
        &filename,
        &extracted,
        config.max_prompt_chars,
        color,
    )?;
    Ok(())
}
