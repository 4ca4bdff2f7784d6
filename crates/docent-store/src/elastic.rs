use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::query::SearchRequest;
use crate::store::{BoxFuture, DocumentStore};
use crate::types::{BulkItemFailure, BulkReport, Hit, IndexMapping, SearchHits};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// [`DocumentStore`] backed by the Elasticsearch REST API.
#[derive(Clone)]
pub struct ElasticStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl fmt::Debug for ElasticStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticStore")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured {
        #[serde(rename = "type")]
        kind: String,
        reason: Option<String>,
    },
    Plain(String),
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<BulkItem>,
}

#[derive(Deserialize)]
struct BulkItem {
    index: Option<BulkItemResult>,
    create: Option<BulkItemResult>,
}

#[derive(Deserialize)]
struct BulkItemResult {
    status: u16,
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchResponseHits,
}

#[derive(Deserialize)]
struct SearchResponseHits {
    total: Option<Total>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Total {
    Object { value: u64 },
    Count(u64),
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: Value,
}

#[derive(Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
}

impl ErrorDetail {
    fn kind(&self) -> &str {
        match self {
            Self::Structured { kind, .. } => kind,
            Self::Plain(_) => "",
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Structured {
                kind,
                reason: Some(reason),
            } => format!("{kind}: {reason}"),
            Self::Structured { kind, reason: None } => kind.clone(),
            Self::Plain(msg) => msg.clone(),
        }
    }
}

impl ElasticStore {
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialised.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("docent/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url,
            api_key: None,
        }
    }

    /// Authenticate with an Elasticsearch API key (`Authorization: ApiKey ...`).
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Check the cluster answers its root endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster is unreachable or answers with a
    /// non-success status.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let response = self.request(reqwest::Method::GET, "").send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response, "").await)
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{path}", self.base_url));
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("ApiKey {key}")),
            None => builder,
        }
    }

    /// Map a non-success response to the matching [`StoreError`].
    async fn status_error(response: reqwest::Response, index: &str) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error);

        match detail.as_ref().map_or("", ErrorDetail::kind) {
            "index_not_found_exception" => return StoreError::IndexNotFound(index.to_owned()),
            "resource_already_exists_exception" => {
                return StoreError::IndexAlreadyExists(index.to_owned());
            }
            _ => {}
        }
        let reason = detail.map_or(body, |d| d.describe());
        tracing::error!(status, index, %reason, "elasticsearch request failed");
        StoreError::Status { status, reason }
    }

    fn bulk_body(documents: &[Value]) -> Result<String, StoreError> {
        let mut body = String::new();
        for doc in documents {
            body.push_str("{\"index\":{}}\n");
            body.push_str(&serde_json::to_string(doc)?);
            body.push('\n');
        }
        Ok(body)
    }
}

/// Reads `<index>.mappings.properties.<field>.dims` from a `_mapping` reply.
/// The reply is keyed by the concrete index name, which differs from the
/// requested one when `index` is an alias.
fn mapped_dims(mapping: &Value, field: &str) -> Option<usize> {
    let field = mapping
        .as_object()?
        .values()
        .next()?
        .pointer(&format!("/mappings/properties/{field}"))?;
    if field.get("type").and_then(Value::as_str) != Some("dense_vector") {
        return None;
    }
    field
        .get("dims")
        .and_then(Value::as_u64)
        .and_then(|d| usize::try_from(d).ok())
}

fn bulk_report(attempted: usize, response: BulkResponse) -> BulkReport {
    let failures = response
        .items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let result = item.index.or(item.create)?;
            let error = result.error?;
            Some(BulkItemFailure {
                position,
                status: result.status,
                reason: error.describe(),
            })
        })
        .collect();
    BulkReport {
        attempted,
        failures,
    }
}

impl DocumentStore for ElasticStore {
    fn index_exists(&self, index: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let index = index.to_owned();
        Box::pin(async move {
            let response = self.request(reqwest::Method::HEAD, &index).send().await?;
            match response.status().as_u16() {
                200 => Ok(true),
                404 => Ok(false),
                status => Err(StoreError::Status {
                    status,
                    reason: format!("unexpected status checking index '{index}'"),
                }),
            }
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
            let response = self
                .request(reqwest::Method::GET, &format!("{index}/_mapping"))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::status_error(response, &index).await);
            }
            let mapping: Value = serde_json::from_str(&response.text().await?)?;
            Ok(mapped_dims(&mapping, &field))
        })
    }

    fn create_index(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let index = index.to_owned();
        let body = mapping.to_json();
        Box::pin(async move {
            let response = self
                .request(reqwest::Method::PUT, &index)
                .json(&body)
                .send()
                .await?;
            if response.status().is_success() {
                tracing::info!(%index, "created index");
                Ok(())
            } else {
                Err(Self::status_error(response, &index).await)
            }
        })
    }

    fn bulk_write(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> BoxFuture<'_, Result<BulkReport, StoreError>> {
        let index = index.to_owned();
        Box::pin(async move {
            let attempted = documents.len();
            if attempted == 0 {
                return Ok(BulkReport::default());
            }
            let body = Self::bulk_body(&documents)?;
            let response = self
                .request(reqwest::Method::POST, &format!("{index}/_bulk"))
                .header("Content-Type", "application/x-ndjson")
                .body(body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::status_error(response, &index).await);
            }
            let parsed: BulkResponse = serde_json::from_str(&response.text().await?)?;
            let report = bulk_report(attempted, parsed);
            tracing::debug!(
                %index,
                attempted,
                failed = report.failures.len(),
                "bulk write finished"
            );
            Ok(report)
        })
    }

    fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> BoxFuture<'_, Result<SearchHits, StoreError>> {
        let index = index.to_owned();
        let body = request.to_dsl();
        Box::pin(async move {
            let response = self
                .request(reqwest::Method::POST, &format!("{index}/_search"))
                .json(&body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::status_error(response, &index).await);
            }
            let parsed: SearchResponse = serde_json::from_str(&response.text().await?)?;
            let hits: Vec<Hit> = parsed
                .hits
                .hits
                .into_iter()
                .map(|h| Hit {
                    id: h.id,
                    score: h.score.unwrap_or(0.0),
                    source: h.source,
                })
                .collect();
            let total = match parsed.hits.total {
                Some(Total::Object { value } | Total::Count(value)) => value,
                None => hits.len() as u64,
            };
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
            let response = self
                .request(reqwest::Method::POST, &format!("{index}/_doc"))
                .json(&document)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::status_error(response, &index).await);
            }
            let parsed: IndexResponse = serde_json::from_str(&response.text().await?)?;
            Ok(parsed.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn index_exists_maps_head_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/present"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/absent"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        assert!(store.index_exists("present").await.unwrap());
        assert!(!store.index_exists("absent").await.unwrap());
    }

    #[tokio::test]
    async fn create_index_sends_mapping_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/docs"))
            .and(header("Authorization", "ApiKey secret"))
            .and(body_json(IndexMapping::chunks(4).to_json()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;

        let store = ElasticStore::new(format!("{}/", server.uri())).with_api_key("secret");
        store
            .create_index("docs", &IndexMapping::chunks(4))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ping_checks_cluster_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cluster_name": "docker-cluster",
                "version": { "number": "8.13.0" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        ElasticStore::new(server.uri()).ping().await.unwrap();
    }

    #[tokio::test]
    async fn ping_failure_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "type": "security_exception",
                    "reason": "missing authentication credentials"
                },
                "status": 401
            })))
            .mount(&server)
            .await;

        let err = ElasticStore::new(server.uri()).ping().await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn vector_dims_reads_mapping_of_concrete_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/_mapping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs-000001": {
                    "mappings": {
                        "properties": {
                            "heading": { "type": "text" },
                            "contentVector": { "type": "dense_vector", "dims": 768 }
                        }
                    }
                }
            })))
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        assert_eq!(
            store.vector_dims("docs", "contentVector").await.unwrap(),
            Some(768)
        );
        assert_eq!(store.vector_dims("docs", "heading").await.unwrap(), None);
        assert_eq!(store.vector_dims("docs", "summaryVector").await.unwrap(), None);
    }

    #[tokio::test]
    async fn vector_dims_on_missing_index_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone/_mapping"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "type": "index_not_found_exception",
                    "reason": "no such index [gone]"
                },
                "status": 404
            })))
            .mount(&server)
            .await;

        let err = ElasticStore::new(server.uri())
            .vector_dims("gone", "contentVector")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IndexNotFound(ref i) if i == "gone"));
    }

    #[tokio::test]
    async fn create_index_conflict_is_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/docs"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "type": "resource_already_exists_exception",
                    "reason": "index [docs/abc] already exists"
                },
                "status": 400
            })))
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        let err = store
            .create_index("docs", &IndexMapping::chunks(4))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IndexAlreadyExists(ref i) if i == "docs"));
    }

    #[tokio::test]
    async fn bulk_write_sends_ndjson_and_reports_item_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/docs/_bulk"))
            .and(header("Content-Type", "application/x-ndjson"))
            .and(body_string(
                "{\"index\":{}}\n{\"heading\":\"a\"}\n{\"index\":{}}\n{\"heading\":\"b\"}\n",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "took": 3,
                "errors": true,
                "items": [
                    { "index": { "_id": "1", "status": 201 } },
                    { "index": {
                        "_id": "2",
                        "status": 400,
                        "error": {
                            "type": "mapper_parsing_exception",
                            "reason": "wrong dims"
                        }
                    } }
                ]
            })))
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        let report = store
            .bulk_write("docs", vec![json!({"heading": "a"}), json!({"heading": "b"})])
            .await
            .unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.indexed(), 1);
        assert_eq!(
            report.failures,
            vec![BulkItemFailure {
                position: 1,
                status: 400,
                reason: "mapper_parsing_exception: wrong dims".into(),
            }]
        );
    }

    #[tokio::test]
    async fn search_posts_dsl_and_parses_hits() {
        let server = MockServer::start().await;
        let request = SearchRequest::hybrid("newton", vec![1.0, 0.0], 10, 1.0, 1.0);
        Mock::given(method("POST"))
            .and(path("/docs/_search"))
            .and(body_json(request.to_dsl()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {
                    "total": { "value": 1, "relation": "eq" },
                    "max_score": 2.5,
                    "hits": [{
                        "_index": "docs",
                        "_id": "abc",
                        "_score": 2.5,
                        "_source": { "heading": "Newton's Laws", "content": "F = ma" }
                    }]
                }
            })))
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        let hits = store.search("docs", &request).await.unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.hits[0].id, "abc");
        assert!((hits.hits[0].score - 2.5).abs() < f32::EPSILON);
        assert_eq!(hits.hits[0].source["heading"], "Newton's Laws");
    }

    #[tokio::test]
    async fn search_missing_index_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gone/_search"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "type": "index_not_found_exception",
                    "reason": "no such index [gone]"
                },
                "status": 404
            })))
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        let err = store
            .search("gone", &SearchRequest::match_all(10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IndexNotFound(ref i) if i == "gone"));
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/docs/_doc"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        let err = store
            .index_document("docs", json!({"topics": "a"}))
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::Status { status: 503, ref reason } if reason == "unavailable")
        );
    }

    #[tokio::test]
    async fn index_document_returns_generated_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/topics_v1/_doc"))
            .and(body_json(json!({"topics": "Optics, Gravity"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"_id": "xyz", "result": "created"})),
            )
            .mount(&server)
            .await;

        let store = ElasticStore::new(server.uri());
        let id = store
            .index_document("topics_v1", json!({"topics": "Optics, Gravity"}))
            .await
            .unwrap();
        assert_eq!(id, "xyz");
    }

    #[test]
    fn debug_redacts_api_key() {
        let store = ElasticStore::new("http://localhost:9200").with_api_key("secret");
        let dbg = format!("{store:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
