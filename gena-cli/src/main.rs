//! gena — interactive multi-mode assistant.

mod mode;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gena_gemini::{Gemini, GeminiGenerator, Model};
use gena_rag::{GeminiEmbeddingProvider, RagConfig, RagPipeline, VectorIndex};
use gena_tools::{ArxivClient, MedicalDataset};

use crate::repl::Repl;

#[derive(Debug, Parser)]
#[command(name = "gena", version, about = "Multi-mode chat assistant with a local knowledge base")]
struct Args {
    /// Path of the knowledge base index file.
    #[arg(long, default_value = "knowledge_base.json")]
    kb_path: PathBuf,

    /// CSV file of medical Q&A pairs, enables the medical mode.
    #[arg(long)]
    medical_data: Option<PathBuf>,

    /// Generation model name.
    #[arg(long, default_value = "gemini-2.5-flash")]
    model: String,

    /// Deadline for upstream API calls, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gena={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let api_key = std::env::var("GEMINI_API_KEY")
        .context("GEMINI_API_KEY environment variable is not set")?;
    let deadline = Duration::from_secs(args.timeout_secs);

    let client = Gemini::new(&api_key, Model::from(args.model.clone()))
        .context("failed to create the generation client")?
        .with_deadline(deadline);
    let generator = GeminiGenerator::new(client);

    let embedder = GeminiEmbeddingProvider::new(&api_key)
        .context("failed to create the embedding client")?;
    let index = Arc::new(VectorIndex::open(&args.kb_path)?);
    let pipeline = RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(Arc::new(embedder))
        .index(index)
        .build()?;

    let medical = match &args.medical_data {
        Some(path) => Some(
            MedicalDataset::load(path)
                .with_context(|| format!("failed to load medical data from '{}'", path.display()))?,
        ),
        None => None,
    };
    let arxiv = ArxivClient::new()?;

    Repl::new(pipeline, generator, arxiv, medical, args.kb_path)
        .run()
        .await
}
