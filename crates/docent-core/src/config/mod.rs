mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting values fail [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.embedding.dimensions == 0 {
            bail!("embedding.dimensions must be greater than 0");
        }
        if self.ingest.chunk_size == 0 {
            bail!("ingest.chunk_size must be greater than 0");
        }
        if self.ingest.concurrency == 0 {
            bail!("ingest.concurrency must be greater than 0");
        }
        if self.retrieval.size == 0 {
            bail!("retrieval.size must be greater than 0");
        }
        if self.store.topics_limit == 0 {
            bail!("store.topics_limit must be greater than 0");
        }
        if self.store.topics_index.trim().is_empty() {
            bail!("store.topics_index must not be empty");
        }
        if !(0.0..=2.0).contains(&self.retrieval.temperature) {
            bail!(
                "retrieval.temperature must be within 0.0..=2.0, got {}",
                self.retrieval.temperature
            );
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            tracing::warn!(
                chunk_size = self.ingest.chunk_size,
                chunk_overlap = self.ingest.chunk_overlap,
                "chunk_overlap will be clamped below chunk_size"
            );
        }
        Ok(())
    }
}
