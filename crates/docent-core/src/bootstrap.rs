//! Startup wiring from [`Config`] to concrete collaborators.

use std::path::{Path, PathBuf};

use anyhow::Context;
use docent_llm::any::AnyProvider;
use docent_llm::ollama::OllamaProvider;
use docent_llm::openai::OpenAiProvider;
use docent_store::ElasticStore;

use crate::config::{Config, ProviderKind};
use crate::extractor::{PdfExtractor, PlainTextExtractor, TextExtractor};

/// Priority: `--config` flag > `DOCENT_CONFIG` env > `docent.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli {
        return path;
    }
    if let Ok(path) = std::env::var("DOCENT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("docent.toml")
}

/// # Errors
///
/// Returns an error if the selected provider is missing its config section
/// or API key.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    match config.llm.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.base_url,
            config.llm.model.clone(),
            config.llm.embedding_model.clone(),
        ))),
        ProviderKind::OpenAi => {
            let openai_cfg = config
                .llm
                .openai
                .as_ref()
                .context("llm.openai config section required for OpenAI provider")?;
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .context("DOCENT_OPENAI_API_KEY not set")?
                .expose()
                .to_owned();
            let mut provider = OpenAiProvider::new(
                api_key,
                openai_cfg.base_url.clone(),
                openai_cfg.model.clone(),
                openai_cfg.max_tokens,
                openai_cfg.embedding_model.clone(),
            );
            if let Some(dims) = openai_cfg.embedding_dimensions {
                provider = provider.with_embedding_dimensions(dims);
            }
            Ok(AnyProvider::OpenAi(provider))
        }
    }
}

pub async fn health_check(provider: &AnyProvider) {
    if let AnyProvider::Ollama(ollama) = provider {
        match ollama.health_check().await {
            Ok(()) => tracing::info!("ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        }
    }
}

/// Fail fast when the document store does not answer.
///
/// # Errors
///
/// Returns an error naming the configured URL if the ping fails.
pub async fn store_health_check(store: &ElasticStore, url: &str) -> anyhow::Result<()> {
    store
        .ping()
        .await
        .with_context(|| format!("cannot connect to document store at {url}"))?;
    tracing::info!(url, "document store reachable");
    Ok(())
}

#[must_use]
pub fn create_store(config: &Config) -> ElasticStore {
    let store = ElasticStore::new(config.store.url.clone());
    match &config.secrets.store_api_key {
        Some(key) => store.with_api_key(key.expose()),
        None => store,
    }
}

/// Pick an extractor from the file extension. Anything that is not plain
/// text goes through the PDF extractor, which rejects non-PDF bytes.
#[must_use]
pub fn extractor_for(path: &Path, max_bytes: usize) -> Box<dyn TextExtractor> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("md"));
    if is_text {
        Box::new(PlainTextExtractor { max_bytes })
    } else {
        Box::new(PdfExtractor { max_bytes })
    }
}
