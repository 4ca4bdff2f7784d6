use std::sync::Arc;

use docent_store::types::{CONTENT_FIELD, HEADING_FIELD, SUMMARY_FIELD};
use docent_store::{DocumentStore, Hit, SearchRequest};
use serde_json::Value;

use crate::error::Result;

pub const UNNAMED_HIT: &str = "No Heading";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub size: usize,
    pub text_weight: f32,
    pub vector_weight: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            size: 10,
            text_weight: 1.0,
            vector_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub score: f32,
    pub heading: String,
    pub content: String,
    pub summary: String,
}

impl From<Hit> for RetrievedChunk {
    fn from(hit: Hit) -> Self {
        let text = |field: &str| {
            hit.source
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        Self {
            heading: text(HEADING_FIELD).unwrap_or_else(|| UNNAMED_HIT.into()),
            content: text(CONTENT_FIELD).unwrap_or_default(),
            summary: text(SUMMARY_FIELD).unwrap_or_default(),
            id: hit.id,
            score: hit.score,
        }
    }
}

/// Render hits as `Document Name: ...\nContent: ...` blocks joined by `\n`.
/// Hits whose trimmed content is empty are skipped.
#[must_use]
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .filter_map(|chunk| {
            let content = chunk.content.trim();
            (!content.is_empty())
                .then(|| format!("Document Name: {}\nContent: {content}", chunk.heading))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lexically gated search with an additive summary-vector term.
pub struct HybridRetriever<S: ?Sized> {
    store: Arc<S>,
    params: SearchParams,
}

impl<S: DocumentStore + ?Sized> HybridRetriever<S> {
    pub fn new(store: Arc<S>, params: SearchParams) -> Self {
        Self { store, params }
    }

    /// Search with the configured size and weights.
    ///
    /// # Errors
    ///
    /// [`crate::DocentError::IndexNotFound`] for a missing index, otherwise
    /// store failures.
    pub async fn search(
        &self,
        index: &str,
        query: &str,
        query_vector: Vec<f32>,
    ) -> Result<Vec<RetrievedChunk>> {
        let request = SearchRequest::hybrid(
            query,
            query_vector,
            self.params.size,
            self.params.text_weight,
            self.params.vector_weight,
        );
        let hits = self.store.search(index, &request).await?;
        tracing::debug!(
            index,
            total = hits.total,
            returned = hits.hits.len(),
            "hybrid search"
        );
        Ok(hits.hits.into_iter().map(RetrievedChunk::from).collect())
    }
}
