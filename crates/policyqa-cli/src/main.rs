use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use policyqa_core::config_file::{self, ConfigFile};
use policyqa_core::llm::GeminiClient;
use policyqa_core::{
    AnswerSession, ExtractionMethod, ExtractionResult, LlmConfig, OutputFormat, PdfBackend,
};
use policyqa_pdf_lopdf::LopdfBackend;
use policyqa_pdf_mupdf::MupdfBackend;

mod output;
mod repl;

use output::ColorMode;

/// HR Policy Assistant - extract policy PDFs and ask questions about them
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a PDF page by page and save it as JSON or flat text
    Extract {
        /// Path to the PDF to extract
        pdf: PathBuf,

        /// Extraction backend: mupdf or lopdf
        #[arg(long)]
        method: Option<ExtractionMethod>,

        /// Output format: json or txt
        #[arg(long, default_value = "txt")]
        format: OutputFormat,

        /// Output path (default: serialized_pdf.json / serialized_pdf.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not read the document information dictionary
        #[arg(long)]
        no_metadata: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Ask questions about an extracted document
    Ask {
        /// Flat-text document produced by `extract`
        #[arg(long, default_value = "serialized_pdf.txt", conflicts_with = "pdf")]
        document: PathBuf,

        /// Extract this PDF in memory instead of reading a saved document
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Extraction backend used with --pdf
        #[arg(long, requires = "pdf")]
        method: Option<ExtractionMethod>,

        /// Gemini model name
        #[arg(long)]
        model: Option<String>,

        /// Gemini API key
        #[arg(long)]
        api_key: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_file::load_config();

    match cli.command {
        Command::Extract {
            pdf,
            method,
            format,
            output,
            no_metadata,
            no_color,
        } => extract(&config, pdf, method, format, output, no_metadata, no_color),
        Command::Ask {
            document,
            pdf,
            method,
            model,
            api_key,
            no_color,
        } => ask(&config, document, pdf, method, model, api_key, no_color).await,
    }
}

fn backend_for(method: ExtractionMethod) -> Box<dyn PdfBackend> {
    match method {
        ExtractionMethod::Mupdf => Box::new(MupdfBackend::new()),
        ExtractionMethod::Lopdf => Box::new(LopdfBackend::new()),
    }
}

fn run_extraction(
    config: &ConfigFile,
    pdf: &Path,
    method: Option<ExtractionMethod>,
    include_metadata: bool,
) -> ExtractionResult {
    // CLI flag > config file > default
    let method = method
        .or_else(|| config.extraction_method())
        .unwrap_or(ExtractionMethod::Mupdf);
    let include_metadata = include_metadata && config.include_metadata().unwrap_or(true);
    let backend = backend_for(method);
    policyqa_core::extract(pdf, backend.as_ref(), include_metadata)
}

#[allow(clippy::too_many_arguments)]
fn extract(
    config: &ConfigFile,
    pdf: PathBuf,
    method: Option<ExtractionMethod>,
    format: OutputFormat,
    output: Option<PathBuf>,
    no_metadata: bool,
    no_color: bool,
) -> anyhow::Result<()> {
    let color = ColorMode(!no_color);
    let output_path = output
        .unwrap_or_else(|| PathBuf::from(format!("serialized_pdf.{}", format.extension())));

    let result = run_extraction(config, &pdf, method, !no_metadata);
    policyqa_core::save(&result, &output_path, format)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if let Some(error) = &result.error {
        anyhow::bail!("{}", error);
    }

    let mut stdout = std::io::stdout();
    output::print_extraction_summary(&mut stdout, &result, &output_path, color)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn ask(
    config: &ConfigFile,
    document: PathBuf,
    pdf: Option<PathBuf>,
    method: Option<ExtractionMethod>,
    model: Option<String>,
    api_key: Option<String>,
    no_color: bool,
) -> anyhow::Result<()> {
    let color = ColorMode(!no_color);

    // Fail on a missing key before any document work or request.
    let llm_config = LlmConfig::resolve(api_key, model, config);
    let client = GeminiClient::new(&llm_config)?;
    tracing::info!(model = client.model(), "using Gemini model");

    let mut session = match pdf {
        Some(pdf) => {
            let result = run_extraction(config, &pdf, method, false);
            if let Some(error) = &result.error {
                anyhow::bail!("{}", error);
            }
            AnswerSession::new(policyqa_core::render_flat_text(&result), client)
        }
        None => AnswerSession::from_file(&document, client)?,
    };

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    repl::run(&mut session, stdin.lock(), &mut stdout, color).await
}
