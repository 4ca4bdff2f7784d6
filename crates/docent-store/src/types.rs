use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const HEADING_FIELD: &str = "heading";
pub const CONTENT_FIELD: &str = "content";
pub const SUMMARY_FIELD: &str = "summary";
pub const CONTENT_VECTOR_FIELD: &str = "contentVector";
pub const SUMMARY_VECTOR_FIELD: &str = "summaryVector";
pub const TOPICS_FIELD: &str = "topics";

/// One indexed chunk as stored in the chunk index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub heading: String,
    pub content: String,
    pub summary: String,
    pub content_vector: Vec<f32>,
    pub summary_vector: Vec<f32>,
}

/// A document in the topics index: every heading of one ingestion run joined
/// with `", "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub topics: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    DenseVector { dims: usize },
}

/// Index settings plus explicit field mappings. Fields not listed are mapped
/// dynamically by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMapping {
    pub shards: u32,
    pub replicas: u32,
    pub fields: Vec<(String, FieldType)>,
}

impl IndexMapping {
    /// Chunk index: three text fields and two dense vectors of `dims` entries.
    #[must_use]
    pub fn chunks(dims: usize) -> Self {
        Self {
            shards: 1,
            replicas: 0,
            fields: vec![
                (HEADING_FIELD.into(), FieldType::Text),
                (CONTENT_FIELD.into(), FieldType::Text),
                (SUMMARY_FIELD.into(), FieldType::Text),
                (CONTENT_VECTOR_FIELD.into(), FieldType::DenseVector { dims }),
                (SUMMARY_VECTOR_FIELD.into(), FieldType::DenseVector { dims }),
            ],
        }
    }

    #[must_use]
    pub fn topics() -> Self {
        Self {
            shards: 1,
            replicas: 0,
            fields: vec![(TOPICS_FIELD.into(), FieldType::Text)],
        }
    }

    /// No explicit fields; matches what a backend creates on first write.
    #[must_use]
    pub fn dynamic() -> Self {
        Self {
            shards: 1,
            replicas: 0,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn vector_dims(&self, field: &str) -> Option<usize> {
        self.fields.iter().find_map(|(name, ty)| match ty {
            FieldType::DenseVector { dims } if name == field => Some(*dims),
            _ => None,
        })
    }

    /// Elasticsearch index-creation body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, ty)| {
                let def = match ty {
                    FieldType::Text => json!({ "type": "text" }),
                    FieldType::DenseVector { dims } => {
                        json!({ "type": "dense_vector", "dims": dims })
                    }
                };
                (name.clone(), def)
            })
            .collect();

        json!({
            "settings": {
                "number_of_shards": self.shards,
                "number_of_replicas": self.replicas,
            },
            "mappings": { "properties": properties },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: f32,
    pub source: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<Hit>,
}

/// Per-item rejection from a bulk write. `position` is the item's zero-based
/// offset in the submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    pub position: usize,
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub attempted: usize,
    pub failures: Vec<BulkItemFailure>,
}

impl BulkReport {
    #[must_use]
    pub fn indexed(&self) -> usize {
        self.attempted.saturating_sub(self.failures.len())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
