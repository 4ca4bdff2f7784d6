//! Caller-facing operations wired from the pipeline components.

use std::sync::Arc;
use std::time::Instant;

use docent_llm::LlmProvider;
use docent_store::{ChunkRecord, DocumentStore};
use futures::{StreamExt, TryStreamExt, stream};

use crate::agent::AgentState;
use crate::answer::AnswerSynthesizer;
use crate::chunker::{SplitterConfig, TextSplitter};
use crate::config::Config;
use crate::embedder::Embedder;
use crate::error::{DocentError, Result};
use crate::extractor::{PdfExtractor, TextExtractor};
use crate::metadata::{MetadataCounts, MetadataSource, MetadataSynthesizer};
use crate::outcome::Outcome;
use crate::retriever::{HybridRetriever, SearchParams, build_context};
use crate::router::{LlmRelevanceClassifier, RelevanceClassifier, TopicCatalogue};
use crate::writer::{CommitReport, IndexWriter};

pub const INGEST_SUCCESS_MESSAGE: &str = "PDF processed and indexed successfully.";

/// Per-document ingestion summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks: usize,
    pub commit: CommitReport,
    pub metadata: MetadataCounts,
}

pub struct Docent<P, S: ?Sized, C = LlmRelevanceClassifier<P>> {
    extractor: Box<dyn TextExtractor>,
    splitter: TextSplitter,
    metadata: MetadataSynthesizer<P>,
    embedder: Embedder<P>,
    writer: IndexWriter<S>,
    retriever: HybridRetriever<S>,
    catalogue: TopicCatalogue<S>,
    classifier: C,
    answerer: AnswerSynthesizer<P>,
    concurrency: usize,
    temperature: f32,
}

impl<P, S> Docent<P, S>
where
    P: LlmProvider + Clone,
    S: DocumentStore + ?Sized,
{
    /// Build every component from `config`, sharing `provider` and `store`.
    /// Documents are read with [`PdfExtractor`] unless replaced.
    pub fn new(provider: P, store: Arc<S>, config: &Config) -> Self {
        let dims = config.embedding.dimensions;
        Self {
            extractor: Box::new(PdfExtractor {
                max_bytes: config.ingest.max_document_bytes,
            }),
            splitter: TextSplitter::new(SplitterConfig {
                chunk_size: config.ingest.chunk_size,
                chunk_overlap: config.ingest.chunk_overlap,
            }),
            metadata: MetadataSynthesizer::new(provider.clone()),
            embedder: Embedder::new(provider.clone(), dims),
            writer: IndexWriter::new(Arc::clone(&store), dims, config.store.topics_index.clone()),
            retriever: HybridRetriever::new(
                Arc::clone(&store),
                SearchParams {
                    size: config.retrieval.size,
                    text_weight: config.retrieval.text_weight,
                    vector_weight: config.retrieval.vector_weight,
                },
            ),
            catalogue: TopicCatalogue::new(
                store,
                config.store.topics_index.clone(),
                config.store.topics_limit,
            ),
            classifier: LlmRelevanceClassifier::new(provider.clone()),
            answerer: AnswerSynthesizer::new(provider),
            concurrency: config.ingest.concurrency.max(1),
            temperature: config.retrieval.temperature,
        }
    }
}

impl<P, S: ?Sized, C> Docent<P, S, C> {
    /// Replace the relevance gate.
    pub fn with_classifier<C2: RelevanceClassifier>(self, classifier: C2) -> Docent<P, S, C2> {
        Docent {
            extractor: self.extractor,
            splitter: self.splitter,
            metadata: self.metadata,
            embedder: self.embedder,
            writer: self.writer,
            retriever: self.retriever,
            catalogue: self.catalogue,
            classifier,
            answerer: self.answerer,
            concurrency: self.concurrency,
            temperature: self.temperature,
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }
}

impl<P, S, C> Docent<P, S, C>
where
    P: LlmProvider,
    S: DocumentStore + ?Sized,
    C: RelevanceClassifier,
{
    /// Create a chunk index. An existing index is reported as a failure and
    /// left untouched.
    pub async fn create_collection(&self, name: &str) -> Outcome {
        match self.writer.create_index(name).await {
            Ok(()) => Outcome::success(format!("Index {name} created successfully.")),
            Err(DocentError::IndexAlreadyExists(_)) => {
                tracing::info!(index = name, "index already exists");
                Outcome::failure(format!("Index {name} already exists."))
            }
            Err(e) => {
                tracing::error!(index = name, "index creation failed: {e}");
                Outcome::failure(format!("Error creating index: {e}"))
            }
        }
    }

    /// Extract, chunk, describe, embed and commit one document, then append
    /// its headings to the topic catalogue.
    ///
    /// The topic entry is written after the bulk attempt even when some
    /// chunk writes were rejected.
    ///
    /// # Errors
    ///
    /// [`DocentError::IndexNotFound`] or
    /// [`DocentError::EmbeddingDimensionMismatch`] before any model call when
    /// `index` is missing or mapped for another vector size; extraction,
    /// model and embedding failures abort the document with nothing written;
    /// [`DocentError::StoreWrite`] when the bulk commit rejected items.
    pub async fn ingest(&self, index: &str, bytes: Vec<u8>) -> Result<IngestReport> {
        let started = Instant::now();
        if !self.writer.index_exists(index).await? {
            return Err(DocentError::IndexNotFound(index.to_owned()));
        }
        self.writer.check_dimensions(index).await?;

        let text = self.extractor.extract(bytes).await?;
        let chunks: Vec<String> = self
            .splitter
            .split(&text)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();
        tracing::info!(index, chunks = chunks.len(), "document split");

        let processed: Vec<(ChunkRecord, MetadataSource)> = stream::iter(chunks)
            .map(|chunk| self.process_chunk(chunk))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut metadata = MetadataCounts::default();
        let mut records = Vec::with_capacity(processed.len());
        for (record, source) in processed {
            match source {
                MetadataSource::Strict => metadata.strict += 1,
                MetadataSource::Lenient => metadata.lenient += 1,
                MetadataSource::Fallback => metadata.fallback += 1,
            }
            records.push(record);
        }
        let headings: Vec<String> = records.iter().map(|r| r.heading.clone()).collect();

        let commit = self.writer.commit(index, &records).await?;
        self.writer.record_topics(&headings).await?;

        if !commit.is_complete() {
            return Err(DocentError::StoreWrite {
                attempted: commit.attempted,
                failures: commit.failures,
            });
        }
        tracing::info!(
            index,
            indexed = commit.indexed,
            lenient = metadata.lenient,
            fallback = metadata.fallback,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "document ingested"
        );
        Ok(IngestReport {
            chunks: records.len(),
            commit,
            metadata,
        })
    }

    async fn process_chunk(&self, content: String) -> Result<(ChunkRecord, MetadataSource)> {
        let meta = self.metadata.synthesize(&content).await?;
        let content_vector = self.embedder.embed(&content).await?;
        let summary_vector = self.embedder.embed(&meta.summary).await?;
        let record = ChunkRecord {
            heading: meta.heading,
            content,
            summary: meta.summary,
            content_vector,
            summary_vector,
        };
        Ok((record, meta.source))
    }

    /// [`Docent::ingest`] reported as an [`Outcome`].
    pub async fn ingest_document(&self, index: &str, bytes: Vec<u8>) -> Outcome {
        match self.ingest(index, bytes).await {
            Ok(_) => Outcome::success(INGEST_SUCCESS_MESSAGE),
            Err(e) => {
                tracing::error!(index, "ingestion failed: {e}");
                Outcome::failure(e.to_string())
            }
        }
    }

    /// Retrieve from `index` and answer, without relevance routing.
    pub async fn answer(&self, index: &str, query: &str, temperature: Option<f32>) -> Outcome {
        let temperature = temperature.unwrap_or(self.temperature);
        match self.retrieve_context(index, query).await {
            Ok(context) => self.answerer.answer(query, &context, temperature).await,
            Err(e) => {
                tracing::error!(index, "retrieval failed: {e}");
                Outcome::failure(e.to_string())
            }
        }
    }

    /// Answer through the routed flow described by [`AgentState`].
    pub async fn agent_answer(
        &self,
        index: &str,
        query: &str,
        temperature: Option<f32>,
    ) -> Outcome {
        let temperature = temperature.unwrap_or(self.temperature);
        match self.run_agent(index, query, temperature).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(index, "agent answer failed: {e}");
                Outcome::failure(e.to_string())
            }
        }
    }

    async fn run_agent(&self, index: &str, query: &str, temperature: f32) -> Result<Outcome> {
        let mut state = AgentState::Start;
        let mut relevant = false;
        let mut context = String::new();
        let mut outcome = None;

        while !state.is_terminal() {
            match state {
                AgentState::Start | AgentState::Done => {}
                AgentState::CheckRelevance => {
                    let topics = self.catalogue.load().await?;
                    relevant = self.classifier.should_retrieve(query, &topics).await?;
                }
                AgentState::Retrieve => {
                    context = self.retrieve_context(index, query).await?;
                }
                AgentState::SynthesizeFromContext => {
                    outcome = Some(self.answerer.answer(query, &context, temperature).await);
                }
                AgentState::GenericReply => {
                    outcome = Some(self.answerer.respond(query).await);
                }
            }
            let next = state.next(relevant);
            tracing::debug!(from = ?state, to = ?next, "agent transition");
            state = next;
        }

        Ok(outcome.unwrap_or_else(|| Outcome::failure("agent finished without a reply")))
    }

    async fn retrieve_context(&self, index: &str, query: &str) -> Result<String> {
        let vector = self.embedder.embed(query).await?;
        let hits = self.retriever.search(index, query, vector).await?;
        tracing::info!(index, hits = hits.len(), "retrieved context");
        Ok(build_context(&hits))
    }

    /// Current topic catalogue, as read by the router.
    ///
    /// # Errors
    ///
    /// Returns store failures other than a missing topics index.
    pub async fn topics(&self) -> Result<Vec<String>> {
        self.catalogue.load().await
    }

    /// Lifetime metadata parse counts across all ingestions.
    #[must_use]
    pub fn metadata_stats(&self) -> MetadataCounts {
        self.metadata.stats().snapshot()
    }
}
