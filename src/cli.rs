//! CLI parser and command implementations.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use tracing::warn;

use crate::config::{Settings, ENV_GEMINI_KEY, ENV_OCR_INVOKE_URL, ENV_OCR_SECRET};
use crate::llm::GeminiClient;
use crate::locator;
use crate::models::ReceiptRecord;
use crate::ocr::{self, ClovaOcrClient};
use crate::writer;

#[derive(Parser)]
#[command(name = "receiptron")]
#[command(about = "Receipt OCR and LLM-based structured extraction")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the OCR and model pipeline over the receipt image once
    Scan {
        /// Directory scanned for the receipt image
        #[arg(long, default_value = "input")]
        input_dir: PathBuf,

        /// Directory receiving the result JSON
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Gemini model used for interpretation
        #[arg(long, default_value = "gemini-2.5-flash")]
        model: String,
    },

    /// Report credential and directory status without any network call
    Check {
        /// Directory scanned for the receipt image
        #[arg(long, default_value = "input")]
        input_dir: PathBuf,

        /// Directory receiving the result JSON
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            input_dir,
            output_dir,
            model,
        } => {
            let settings = Settings::from_env(input_dir, output_dir, model)?;
            cmd_scan(&settings).await
        }
        Commands::Check {
            input_dir,
            output_dir,
        } => cmd_check(&input_dir, &output_dir),
    }
}

/// Run the full pipeline: locate, recognize, interpret, persist.
async fn cmd_scan(settings: &Settings) -> anyhow::Result<()> {
    let image = locator::find_receipt_image(&settings.input_dir)?.ok_or_else(|| {
        anyhow::anyhow!(
            "no receipt.* image in {} (drop a receipt.jpg or receipt.png there and rerun)",
            settings.input_dir.display()
        )
    })?;
    println!(
        "  {} Found image: {} (format: {})",
        style("✓").green(),
        image.path.display(),
        image.format
    );

    let bytes = std::fs::read(&image.path)
        .with_context(|| format!("failed to read {}", image.path.display()))?;

    let ocr_client = ClovaOcrClient::new(settings);
    let response = ocr_client.recognize(&bytes, &image.format).await?;
    println!("  {} OCR response received", style("✓").green());

    let text = ocr::flatten_text(&response);
    let record = if text.is_empty() {
        warn!("OCR produced no text; skipping the model call");
        println!(
            "  {} No text recognized, writing fallback record",
            style("!").yellow()
        );
        ReceiptRecord::fallback()
    } else {
        let llm_client = GeminiClient::new(settings);
        llm_client.parse_receipt(&text).await
    };

    println!("\n{}", style("Parsed receipt").bold());
    println!("{}", "-".repeat(50));
    print!("{}", writer::render_pretty(&record));
    println!("{}", "-".repeat(50));

    let path = writer::write_result(&settings.output_dir, &image.path, &record)?;
    println!("  {} Saved result to {}", style("✓").green(), path.display());

    Ok(())
}

/// Report credential presence and directory status.
fn cmd_check(input_dir: &Path, output_dir: &Path) -> anyhow::Result<()> {
    println!("\n{}", style("Credential Status").bold());
    println!("{}", "-".repeat(50));
    for name in [ENV_OCR_SECRET, ENV_OCR_INVOKE_URL, ENV_GEMINI_KEY] {
        let set = std::env::var(name)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        let status = if set {
            style("✓ set").green()
        } else {
            style("✗ not set").red()
        };
        println!("  {:<28} {}", name, status);
    }

    println!("\n{}", style("Directories").bold());
    println!("{}", "-".repeat(50));
    if input_dir.exists() {
        match locator::scan_dir(input_dir)? {
            Some(image) => println!(
                "  {} input: {} (format: {})",
                style("✓").green(),
                image.path.display(),
                image.format
            ),
            None => println!(
                "  {} input: no receipt.* image in {}",
                style("✗").red(),
                input_dir.display()
            ),
        }
    } else {
        println!(
            "  {} input: {} does not exist yet (scan will create it)",
            style("!").yellow(),
            input_dir.display()
        );
    }
    if output_dir.exists() {
        println!("  {} output: {}", style("✓").green(), output_dir.display());
    } else {
        println!(
            "  {} output: {} does not exist yet (scan will create it)",
            style("!").yellow(),
            output_dir.display()
        );
    }

    Ok(())
}
