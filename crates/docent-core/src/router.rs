//! Topic-gated routing between retrieval and a generic reply.

use std::future::Future;
use std::sync::Arc;

use docent_llm::{GenerationOptions, LlmProvider, Message, PromptTemplate};
use docent_store::types::TOPICS_FIELD;
use docent_store::{DocumentStore, SearchRequest};
use serde_json::Value;

use crate::error::{DocentError, Result};
use crate::prompts;

pub const DEFAULT_TOPICS_LIMIT: usize = 10_000;

/// Decides whether a query relates to anything that has been ingested.
pub trait RelevanceClassifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the underlying decision procedure fails.
    fn should_retrieve(
        &self,
        query: &str,
        topics: &[String],
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// `true` only for a reply that is exactly "yes" after trimming, ignoring case.
#[must_use]
pub fn parse_verdict(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case("yes")
}

/// Asks the language model for a strict yes/no verdict.
#[derive(Debug, Clone)]
pub struct LlmRelevanceClassifier<P> {
    provider: P,
    template: PromptTemplate,
}

impl<P: LlmProvider> LlmRelevanceClassifier<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            template: PromptTemplate::new(prompts::RELEVANCE),
        }
    }
}

impl<P: LlmProvider> RelevanceClassifier for LlmRelevanceClassifier<P> {
    async fn should_retrieve(&self, query: &str, topics: &[String]) -> Result<bool> {
        if topics.iter().all(|t| t.trim().is_empty()) {
            tracing::debug!("topic catalogue is empty, skipping relevance check");
            return Ok(false);
        }
        let topic_list = topics.join(", ");
        let prompt = self
            .template
            .render(&[("query", query), ("topics", &topic_list)]);
        let reply = self
            .provider
            .chat(&[Message::user(prompt)], GenerationOptions::default())
            .await?;
        let verdict = parse_verdict(&reply);
        tracing::debug!(reply = reply.trim(), verdict, "relevance verdict");
        Ok(verdict)
    }
}

/// Read side of the topics index.
pub struct TopicCatalogue<S: ?Sized> {
    store: Arc<S>,
    index: String,
    limit: usize,
}

impl<S: DocumentStore + ?Sized> TopicCatalogue<S> {
    pub fn new(store: Arc<S>, index: impl Into<String>, limit: usize) -> Self {
        Self {
            store,
            index: index.into(),
            limit,
        }
    }

    /// All catalogue entries in store order, up to the configured limit. A
    /// missing topics index reads as an empty catalogue.
    ///
    /// # Errors
    ///
    /// Returns store failures other than a missing index.
    pub async fn load(&self) -> Result<Vec<String>> {
        Ok(self.page().await?.entries)
    }

    /// Like [`TopicCatalogue::load`], also reporting how many entries the
    /// index holds beyond the limit.
    ///
    /// # Errors
    ///
    /// Returns store failures other than a missing index.
    pub async fn page(&self) -> Result<CataloguePage> {
        let request = SearchRequest::match_all(self.limit);
        let hits = match self.store.search(&self.index, &request).await {
            Ok(hits) => hits,
            Err(e) => match DocentError::from(e) {
                DocentError::IndexNotFound(_) => return Ok(CataloguePage::default()),
                other => return Err(other),
            },
        };
        let page = CataloguePage {
            truncated: hits.total > hits.hits.len() as u64,
            total: hits.total,
            entries: hits
                .hits
                .into_iter()
                .filter_map(|hit| match hit.source.get(TOPICS_FIELD) {
                    Some(Value::String(topics)) => Some(topics.clone()),
                    _ => None,
                })
                .collect(),
        };
        if page.truncated {
            tracing::warn!(
                total = page.total,
                limit = self.limit,
                "topic catalogue truncated"
            );
        }
        Ok(page)
    }
}

/// Catalogue entries read in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CataloguePage {
    pub entries: Vec<String>,
    /// Entries in the index, including those past the limit.
    pub total: u64,
    pub truncated: bool,
}
