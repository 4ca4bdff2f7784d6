//! Document store abstraction for chunk records and the topic catalogue.
//!
//! [`DocumentStore`] is the black-box boundary the pipeline writes to and
//! searches. [`ElasticStore`] speaks the Elasticsearch REST API;
//! [`InMemoryDocumentStore`] evaluates the same [`SearchRequest`] descriptor
//! locally for tests and offline runs.

pub mod elastic;
pub mod error;
pub mod in_memory;
mod lexical;
pub mod query;
pub mod store;
pub mod types;

pub use elastic::ElasticStore;
pub use error::StoreError;
pub use in_memory::InMemoryDocumentStore;
pub use query::{Query, ScoreScript, SearchRequest};
pub use store::{BoxFuture, DocumentStore};
pub use types::{
    BulkItemFailure, BulkReport, ChunkRecord, FieldType, Hit, IndexMapping, SearchHits,
    TopicEntry,
};
