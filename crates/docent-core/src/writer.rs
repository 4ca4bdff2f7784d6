use std::sync::Arc;

use docent_store::types::CONTENT_VECTOR_FIELD;
use docent_store::{
    BulkItemFailure, ChunkRecord, DocumentStore, IndexMapping, StoreError, TopicEntry,
};

use crate::error::{DocentError, Result};

/// Outcome of one bulk commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub attempted: usize,
    pub indexed: usize,
    pub failures: Vec<BulkItemFailure>,
}

impl CommitReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sole write path into the chunk indices and the topic catalogue.
pub struct IndexWriter<S: ?Sized> {
    store: Arc<S>,
    dimensions: usize,
    topics_index: String,
}

impl<S: DocumentStore + ?Sized> IndexWriter<S> {
    pub fn new(store: Arc<S>, dimensions: usize, topics_index: impl Into<String>) -> Self {
        Self {
            store,
            dimensions,
            topics_index: topics_index.into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    pub async fn index_exists(&self, name: &str) -> Result<bool> {
        Ok(self.store.index_exists(name).await?)
    }

    /// Compare the vector dimension mapped on `index` with the configured one.
    /// An index without a dense-vector mapping is accepted.
    ///
    /// # Errors
    ///
    /// [`DocentError::EmbeddingDimensionMismatch`] when the mapping disagrees,
    /// [`DocentError::IndexNotFound`] if `index` does not exist.
    pub async fn check_dimensions(&self, index: &str) -> Result<()> {
        match self.store.vector_dims(index, CONTENT_VECTOR_FIELD).await? {
            Some(mapped) if mapped != self.dimensions => {
                tracing::error!(
                    index,
                    mapped,
                    configured = self.dimensions,
                    "index vector mapping does not match embedding dimension"
                );
                Err(DocentError::EmbeddingDimensionMismatch {
                    expected: mapped,
                    actual: self.dimensions,
                })
            }
            Some(_) => Ok(()),
            None => {
                tracing::debug!(index, "index has no dense-vector mapping");
                Ok(())
            }
        }
    }

    /// Create a chunk index. Never overwrites an existing one.
    ///
    /// # Errors
    ///
    /// [`DocentError::IndexAlreadyExists`] if `name` exists (including when
    /// another writer created it concurrently), otherwise store failures.
    pub async fn create_index(&self, name: &str) -> Result<()> {
        if self.store.index_exists(name).await? {
            return Err(DocentError::IndexAlreadyExists(name.to_owned()));
        }
        self.store
            .create_index(name, &IndexMapping::chunks(self.dimensions))
            .await?;
        tracing::info!(index = name, dims = self.dimensions, "chunk index created");
        Ok(())
    }

    /// Write `records` to `index` in a single bulk attempt.
    ///
    /// An empty batch returns an empty report without contacting the store.
    /// Item rejections are reported, not raised; writes that succeeded stay.
    ///
    /// # Errors
    ///
    /// [`DocentError::IndexNotFound`] if `index` does not exist, or any
    /// request-level store failure.
    pub async fn commit(&self, index: &str, records: &[ChunkRecord]) -> Result<CommitReport> {
        if records.is_empty() {
            return Ok(CommitReport::default());
        }
        if !self.store.index_exists(index).await? {
            return Err(DocentError::IndexNotFound(index.to_owned()));
        }

        let documents = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;
        let bulk = self.store.bulk_write(index, documents).await?;

        for failure in &bulk.failures {
            tracing::warn!(
                index,
                position = failure.position,
                status = failure.status,
                reason = %failure.reason,
                "chunk write rejected"
            );
        }
        let report = CommitReport {
            attempted: bulk.attempted,
            indexed: bulk.indexed(),
            failures: bulk.failures,
        };
        tracing::info!(
            index,
            attempted = report.attempted,
            indexed = report.indexed,
            "committed chunks"
        );
        Ok(report)
    }

    /// Append one catalogue entry with `headings` joined by `", "`.
    ///
    /// # Errors
    ///
    /// Returns store failures from creating the topics index or writing the
    /// entry.
    pub async fn record_topics(&self, headings: &[String]) -> Result<()> {
        if headings.is_empty() {
            tracing::debug!("no headings to record");
            return Ok(());
        }
        let index = self.topics_index.as_str();
        if !self.store.index_exists(index).await? {
            match self.store.create_index(index, &IndexMapping::topics()).await {
                Ok(()) | Err(StoreError::IndexAlreadyExists(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        let entry = TopicEntry {
            topics: headings.join(", "),
        };
        let document = serde_json::to_value(&entry).map_err(StoreError::from)?;
        let id = self.store.index_document(index, document).await?;
        tracing::debug!(index, %id, topics = headings.len(), "recorded topics");
        Ok(())
    }
}
