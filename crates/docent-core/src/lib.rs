//! Document ingestion, hybrid retrieval, relevance routing and answer
//! synthesis over a pluggable document store and language model.

pub mod agent;
pub mod answer;
pub mod bootstrap;
pub mod chunker;
pub mod config;
pub mod embedder;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod outcome;
pub mod prompts;
pub mod retriever;
pub mod router;
pub mod service;
pub mod writer;

pub use config::Config;
pub use error::{DocentError, Result};
pub use outcome::{Outcome, Status};
pub use router::{LlmRelevanceClassifier, RelevanceClassifier};
pub use service::{Docent, IngestReport};
