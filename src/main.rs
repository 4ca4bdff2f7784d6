use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docent_core::bootstrap::{
    create_provider, create_store, extractor_for, health_check, resolve_config_path,
    store_health_check,
};
use docent_core::{Config, Docent, Outcome};

#[derive(Parser, Debug)]
#[command(
    name = "docent",
    version,
    about = "Ingest documents into a hybrid search index and answer questions from them"
)]
struct Cli {
    /// Path to the TOML config file (falls back to DOCENT_CONFIG, then docent.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a chunk index
    CreateIndex { name: String },
    /// Extract, chunk, embed and index a PDF (or .txt/.md) file
    Ingest { name: String, file: PathBuf },
    /// Answer from retrieved context without relevance routing
    Ask {
        name: String,
        query: String,
        /// Sampling temperature (defaults to retrieval.temperature)
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Answer through the topic-gated router
    Agent {
        name: String,
        query: String,
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Print the topic catalogue
    Topics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let provider = create_provider(&config)?;
    health_check(&provider).await;
    let store = create_store(&config);
    store_health_check(&store, &config.store.url).await?;
    let store = Arc::new(store);
    let docent = Docent::new(provider, store, &config);

    let outcome = match cli.command {
        Command::CreateIndex { name } => docent.create_collection(&name).await,
        Command::Ingest { name, file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            docent
                .with_extractor(extractor_for(&file, config.ingest.max_document_bytes))
                .ingest_document(&name, bytes)
                .await
        }
        Command::Ask {
            name,
            query,
            temperature,
        } => docent.answer(&name, &query, temperature).await,
        Command::Agent {
            name,
            query,
            temperature,
        } => docent.agent_answer(&name, &query, temperature).await,
        Command::Topics => {
            let topics = docent.topics().await?;
            println!("{}", serde_json::to_string_pretty(&topics)?);
            return Ok(());
        }
    };

    report(&outcome)
}

fn report(outcome: &Outcome) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
