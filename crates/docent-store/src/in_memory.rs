use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::error::StoreError;
use crate::lexical::{FieldStats, bm25, tokenize};
use crate::query::{Query, ScoreScript, SearchRequest};
use crate::store::{BoxFuture, DocumentStore};
use crate::types::{BulkItemFailure, BulkReport, FieldType, Hit, IndexMapping, SearchHits};

struct StoredDocument {
    id: String,
    source: Value,
}

struct InMemoryIndex {
    mapping: IndexMapping,
    docs: Vec<StoredDocument>,
}

impl InMemoryIndex {
    fn new(mapping: IndexMapping) -> Self {
        Self {
            mapping,
            docs: Vec::new(),
        }
    }

    /// Checks a document against the dense-vector fields of the mapping.
    fn validate(&self, document: &Value) -> Result<(), String> {
        let Some(obj) = document.as_object() else {
            return Err("mapper_parsing_exception: document must be a JSON object".into());
        };
        for (field, ty) in &self.mapping.fields {
            let FieldType::DenseVector { dims } = ty else {
                continue;
            };
            let Some(value) = obj.get(field) else {
                continue;
            };
            let Some(values) = value.as_array() else {
                return Err(format!(
                    "mapper_parsing_exception: field [{field}] must be an array of numbers"
                ));
            };
            if values.len() != *dims {
                return Err(format!(
                    "mapper_parsing_exception: the [dims] property of field [{field}] \
                     is {dims} but the vector has {} dimensions",
                    values.len()
                ));
            }
            if values.iter().any(|v| !v.is_number()) {
                return Err(format!(
                    "mapper_parsing_exception: field [{field}] must be an array of numbers"
                ));
            }
        }
        Ok(())
    }
}

/// Process-local [`DocumentStore`] that evaluates [`SearchRequest`]s with
/// BM25 for `multi_match` and exact cosine similarity for script scores.
pub struct InMemoryDocumentStore {
    indices: RwLock<HashMap<String, InMemoryIndex>>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indices: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents in `index`, or `None` if it does not exist.
    #[must_use]
    pub fn document_count(&self, index: &str) -> Option<usize> {
        self.indices
            .read()
            .ok()
            .and_then(|indices| indices.get(index).map(|i| i.docs.len()))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .finish_non_exhaustive()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("in-memory store lock poisoned: {e}"))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[expect(clippy::cast_possible_truncation)]
fn vector_field(source: &Value, field: &str) -> Option<Vec<f32>> {
    source
        .get(field)?
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn collect_text_fields<'q>(query: &'q Query, out: &mut Vec<&'q str>) {
    match query {
        Query::MatchAll => {}
        Query::MultiMatch { fields, .. } => out.extend(fields.iter().map(String::as_str)),
        Query::ScriptScore { query, .. } => collect_text_fields(query, out),
        Query::Bool { must, should } => {
            for q in must.iter().chain(should) {
                collect_text_fields(q, out);
            }
        }
    }
}

fn field_stats(query: &Query, docs: &[StoredDocument]) -> HashMap<String, FieldStats> {
    let mut fields = Vec::new();
    collect_text_fields(query, &mut fields);
    fields
        .into_iter()
        .map(|field| {
            let texts = docs
                .iter()
                .filter_map(|d| d.source.get(field).and_then(Value::as_str));
            (field.to_owned(), FieldStats::collect(texts))
        })
        .collect()
}

/// Score of `source` under `query`, or `None` when it does not match.
fn evaluate(
    query: &Query,
    source: &Value,
    stats: &HashMap<String, FieldStats>,
) -> Result<Option<f32>, StoreError> {
    match query {
        Query::MatchAll => Ok(Some(1.0)),
        Query::MultiMatch {
            query,
            fields,
            boost,
        } => {
            let terms = tokenize(query);
            let best = fields
                .iter()
                .filter_map(|field| {
                    let text = source.get(field).and_then(Value::as_str)?;
                    let field_stats = stats.get(field)?;
                    Some(bm25(&terms, text, field_stats))
                })
                .fold(0.0_f32, f32::max);
            Ok((best > 0.0).then_some(best * boost))
        }
        Query::ScriptScore {
            query,
            script,
            boost,
        } => {
            if evaluate(query, source, stats)?.is_none() {
                return Ok(None);
            }
            let ScoreScript::CosineSimilarityPlusOne {
                field,
                query_vector,
            } = script;
            let Some(doc_vector) = vector_field(source, field) else {
                return Err(StoreError::Query(format!(
                    "document has no value for vector field [{field}]"
                )));
            };
            if doc_vector.len() != query_vector.len() {
                return Err(StoreError::Query(format!(
                    "query vector has {} dimensions but field [{field}] has {}",
                    query_vector.len(),
                    doc_vector.len()
                )));
            }
            Ok(Some((cosine_similarity(query_vector, &doc_vector) + 1.0) * boost))
        }
        Query::Bool { must, should } => {
            let mut score = 0.0;
            for clause in must {
                match evaluate(clause, source, stats)? {
                    Some(s) => score += s,
                    None => return Ok(None),
                }
            }
            let mut any_should = false;
            for clause in should {
                if let Some(s) = evaluate(clause, source, stats)? {
                    score += s;
                    any_should = true;
                }
            }
            if must.is_empty() && !should.is_empty() && !any_should {
                return Ok(None);
            }
            Ok(Some(score))
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn index_exists(&self, index: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let index = index.to_owned();
        Box::pin(async move {
            let indices = self.indices.read().map_err(lock_error)?;
            Ok(indices.contains_key(&index))
        })
    }

    fn vector_dims(
        &self,
        index: &str,
        field: &str,
    ) -> BoxFuture<'_, Result<Option<usize>, StoreError>> {
        let index = index.to_owned();
        let field = field.to_owned();
        Box::pin(async move {
            let indices = self.indices.read().map_err(lock_error)?;
            let target = indices
                .get(&index)
                .ok_or_else(|| StoreError::IndexNotFound(index.clone()))?;
            Ok(target.mapping.vector_dims(&field))
        })
    }

    fn create_index(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let index = index.to_owned();
        let mapping = mapping.clone();
        Box::pin(async move {
            let mut indices = self.indices.write().map_err(lock_error)?;
            if indices.contains_key(&index) {
                return Err(StoreError::IndexAlreadyExists(index));
            }
            tracing::debug!(%index, "creating in-memory index");
            indices.insert(index, InMemoryIndex::new(mapping));
            Ok(())
        })
    }

    fn bulk_write(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> BoxFuture<'_, Result<BulkReport, StoreError>> {
        let index = index.to_owned();
        Box::pin(async move {
            let mut indices = self.indices.write().map_err(lock_error)?;
            let target = indices
                .entry(index)
                .or_insert_with(|| InMemoryIndex::new(IndexMapping::dynamic()));

            let mut report = BulkReport {
                attempted: documents.len(),
                failures: Vec::new(),
            };
            for (position, source) in documents.into_iter().enumerate() {
                if let Err(reason) = target.validate(&source) {
                    report.failures.push(BulkItemFailure {
                        position,
                        status: 400,
                        reason,
                    });
                    continue;
                }
                target.docs.push(StoredDocument {
                    id: uuid::Uuid::new_v4().to_string(),
                    source,
                });
            }
            Ok(report)
        })
    }

    fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> BoxFuture<'_, Result<SearchHits, StoreError>> {
        let index = index.to_owned();
        let request = request.clone();
        Box::pin(async move {
            let indices = self.indices.read().map_err(lock_error)?;
            let target = indices
                .get(&index)
                .ok_or_else(|| StoreError::IndexNotFound(index.clone()))?;

            let stats = field_stats(&request.query, &target.docs);
            let mut hits = Vec::new();
            for doc in &target.docs {
                if let Some(score) = evaluate(&request.query, &doc.source, &stats)? {
                    hits.push(Hit {
                        id: doc.id.clone(),
                        score,
                        source: doc.source.clone(),
                    });
                }
            }

            // Stable sort keeps insertion order among equal scores.
            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let total = hits.len() as u64;
            hits.truncate(request.size);
            Ok(SearchHits { total, hits })
        })
    }

    fn index_document(
        &self,
        index: &str,
        document: Value,
    ) -> BoxFuture<'_, Result<String, StoreError>> {
        let index = index.to_owned();
        Box::pin(async move {
            let mut indices = self.indices.write().map_err(lock_error)?;
            let target = indices
                .entry(index)
                .or_insert_with(|| InMemoryIndex::new(IndexMapping::dynamic()));
            target.validate(&document).map_err(|reason| StoreError::Status {
                status: 400,
                reason,
            })?;
            let id = uuid::Uuid::new_v4().to_string();
            target.docs.push(StoredDocument {
                id: id.clone(),
                source: document,
            });
            Ok(id)
        })
    }
}
