//! Typed search descriptor rendered to Elasticsearch query DSL.

use serde_json::{Value, json};

use crate::types::{CONTENT_FIELD, HEADING_FIELD, SUMMARY_VECTOR_FIELD};

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreScript {
    /// `cosineSimilarity(query_vector, field) + 1.0`, always non-negative.
    CosineSimilarityPlusOne {
        field: String,
        query_vector: Vec<f32>,
    },
}

impl ScoreScript {
    #[must_use]
    pub fn source(&self) -> String {
        match self {
            Self::CosineSimilarityPlusOne { field, .. } => {
                format!("cosineSimilarity(params.query_vector, '{field}') + 1.0")
            }
        }
    }

    fn to_dsl(&self) -> Value {
        match self {
            Self::CosineSimilarityPlusOne { query_vector, .. } => json!({
                "source": self.source(),
                "params": { "query_vector": query_vector },
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    MultiMatch {
        query: String,
        fields: Vec<String>,
        boost: f32,
    },
    ScriptScore {
        query: Box<Query>,
        script: ScoreScript,
        boost: f32,
    },
    /// Every `must` clause has to match; matching `should` clauses only add
    /// to the score.
    Bool { must: Vec<Query>, should: Vec<Query> },
}

impl Query {
    #[must_use]
    pub fn to_dsl(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::MultiMatch {
                query,
                fields,
                boost,
            } => json!({
                "multi_match": { "query": query, "fields": fields, "boost": boost }
            }),
            Self::ScriptScore {
                query,
                script,
                boost,
            } => json!({
                "script_score": {
                    "query": query.to_dsl(),
                    "script": script.to_dsl(),
                    "boost": boost,
                }
            }),
            Self::Bool { must, should } => json!({
                "bool": {
                    "must": must.iter().map(Query::to_dsl).collect::<Vec<_>>(),
                    "should": should.iter().map(Query::to_dsl).collect::<Vec<_>>(),
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub size: usize,
    pub query: Query,
}

impl SearchRequest {
    /// Lexical `multi_match` over heading and content gates eligibility; the
    /// summary-vector cosine term is added on top.
    #[must_use]
    pub fn hybrid(
        text: &str,
        query_vector: Vec<f32>,
        size: usize,
        text_weight: f32,
        vector_weight: f32,
    ) -> Self {
        Self {
            size,
            query: Query::Bool {
                must: vec![Query::MultiMatch {
                    query: text.to_owned(),
                    fields: vec![HEADING_FIELD.into(), CONTENT_FIELD.into()],
                    boost: text_weight,
                }],
                should: vec![Query::ScriptScore {
                    query: Box::new(Query::MatchAll),
                    script: ScoreScript::CosineSimilarityPlusOne {
                        field: SUMMARY_VECTOR_FIELD.into(),
                        query_vector,
                    },
                    boost: vector_weight,
                }],
            },
        }
    }

    #[must_use]
    pub fn match_all(size: usize) -> Self {
        Self {
            size,
            query: Query::MatchAll,
        }
    }

    #[must_use]
    pub fn to_dsl(&self) -> Value {
        json!({ "size": self.size, "query": self.query.to_dsl() })
    }
}
