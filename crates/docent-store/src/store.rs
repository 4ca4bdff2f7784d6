use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::StoreError;
use crate::query::SearchRequest;
use crate::types::{BulkReport, IndexMapping, SearchHits};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait DocumentStore: Send + Sync {
    fn index_exists(&self, index: &str) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Dimension of the dense-vector `field` in the mapping of `index`, or
    /// `None` when the field is not mapped as a dense vector.
    fn vector_dims(
        &self,
        index: &str,
        field: &str,
    ) -> BoxFuture<'_, Result<Option<usize>, StoreError>>;

    /// Create `index` with `mapping`. An existing index is reported as
    /// [`StoreError::IndexAlreadyExists`] and left untouched.
    fn create_index(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Write all documents in one attempt. Item-level rejections are returned
    /// in the report rather than as an error.
    fn bulk_write(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> BoxFuture<'_, Result<BulkReport, StoreError>>;

    fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> BoxFuture<'_, Result<SearchHits, StoreError>>;

    /// Index a single document and return its generated id.
    fn index_document(
        &self,
        index: &str,
        document: Value,
    ) -> BoxFuture<'_, Result<String, StoreError>>;
}
