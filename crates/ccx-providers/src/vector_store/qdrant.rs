//! Qdrant vector store provider
//!
//! REST client for Qdrant. Collections are created with a named dense vector
//! ("dense", cosine) and, when hybrid is enabled, a named sparse slot
//! ("sparse"). Hybrid queries use the Query API with two prefetch branches
//! and server-side RRF fusion. Point ids are UUIDs derived from the chunk id
//! prefix; the full chunk id rides in the payload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use ccx_domain::ports::{PointFilter, ScoredPoint, VectorPoint, VectorStoreProvider};
use ccx_domain::value_objects::{ChunkPayload, Embedding, SparseVector};
use ccx_domain::{Error, Result};

/// Candidate multiplier when a path prefix is filtered client-side
const PATH_PREFIX_OVERFETCH: usize = 8;

/// Qdrant REST client
pub struct QdrantVectorStore {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    http_client: Client,
}

impl QdrantVectorStore {
    /// Create a client for a Qdrant server
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            http_client,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http_client
            .request(method, format!("{}{path}", self.base_url))
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("{context}: transport failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .unwrap_or_else(|_| json!({ "status": "unreadable body" }));
        if !status.is_success() {
            return Err(Error::vector_db(format!(
                "{context}: qdrant returned {status}: {body}"
            )));
        }
        Ok(body)
    }

    fn build_filter(filter: &PointFilter) -> Value {
        let mut must = vec![json!({
            "key": "dataset_id",
            "match": { "any": &filter.dataset_ids }
        })];
        if let Some(language) = &filter.language {
            must.push(json!({ "key": "language", "match": { "value": language } }));
        }
        if let Some(repo) = &filter.repo {
            must.push(json!({ "key": "repo", "match": { "value": repo } }));
        }
        json!({ "must": must })
    }

    fn parse_points(body: &Value, filter: &PointFilter) -> Result<Vec<ScoredPoint>> {
        let points = body["result"]["points"]
            .as_array()
            .ok_or_else(|| Error::vector_db("qdrant query response missing result.points"))?;

        let mut out = Vec::with_capacity(points.len());
        for point in points {
            let payload = &point["payload"];
            let parsed = ChunkPayload {
                project_id: str_field(payload, "project_id"),
                dataset_id: str_field(payload, "dataset_id"),
                source_path: str_field(payload, "source_path"),
                language: str_field(payload, "language"),
                symbol_name: opt_str_field(payload, "symbol_name"),
                repo: opt_str_field(payload, "repo"),
            };
            // Path-prefix restriction is applied here; Qdrant has no native
            // prefix predicate on plain payload fields. The query fetched an
            // over-sized candidate set so this cut still leaves `limit` hits
            // available.
            if let Some(prefix) = &filter.path_prefix {
                if !parsed.source_path.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            out.push(ScoredPoint {
                id: str_field(payload, "chunk_id"),
                score: point["score"].as_f64().unwrap_or(0.0),
                content: str_field(payload, "content"),
                payload: parsed,
            });
        }
        Ok(out)
    }

    /// Server-side fetch size: over-fetch when a path prefix must be applied
    /// client-side, so the prefix cut does not starve the result set
    fn fetch_limit(filter: &PointFilter, limit: usize) -> usize {
        if filter.path_prefix.is_some() {
            limit.saturating_mul(PATH_PREFIX_OVERFETCH)
        } else {
            limit
        }
    }

    async fn run_query(
        &self,
        collection: &str,
        body: Value,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let response = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/collections/{collection}/points/query"),
                )
                .json(&body),
                "query",
            )
            .await?;
        let mut points = Self::parse_points(&response, filter)?;
        points.truncate(limit);
        Ok(points)
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
}

fn opt_str_field(value: &Value, key: &str) -> Option<String> {
    value[key].as_str().map(str::to_string)
}

/// Derive a deterministic UUID-shaped point id from a chunk id
fn point_id(chunk_id: &str) -> String {
    let hex: String = chunk_id
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .chain(std::iter::repeat('0'))
        .take(32)
        .collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[async_trait]
impl VectorStoreProvider for QdrantVectorStore {
    fn provider_name(&self) -> &str {
        "qdrant"
    }

    fn hybrid_supported(&self) -> bool {
        true
    }

    async fn ensure_collection(&self, name: &str, dimensions: usize, hybrid: bool) -> Result<()> {
        if self.collection_exists(name).await? {
            return Ok(());
        }

        let mut body = json!({
            "vectors": { "dense": { "size": dimensions, "distance": "Cosine" } }
        });
        if hybrid {
            body["sparse_vectors"] = json!({ "sparse": {} });
        }
        self.send(
            self.request(reqwest::Method::PUT, &format!("/collections/{name}"))
                .json(&body),
            "create collection",
        )
        .await
        .map(|_| ())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .request(reqwest::Method::GET, &format!("/collections/{name}"))
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("collection check transport failed: {e}")))?;
        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            other => Err(Error::vector_db(format!(
                "collection check returned status {other}"
            ))),
        }
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.send(
            self.request(reqwest::Method::DELETE, &format!("/collections/{name}")),
            "drop collection",
        )
        .await
        .map(|_| ())
    }

    async fn upsert_points(&self, collection: &str, points: &[VectorPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let payload_points: Vec<Value> = points
            .iter()
            .map(|point| {
                let mut vector = json!({ "dense": &point.dense.vector });
                if let Some(sparse) = &point.sparse {
                    vector["sparse"] = json!({
                        "indices": &sparse.indices,
                        "values": &sparse.values
                    });
                }
                json!({
                    "id": point_id(&point.id),
                    "vector": vector,
                    "payload": {
                        "chunk_id": &point.id,
                        "project_id": &point.payload.project_id,
                        "dataset_id": &point.payload.dataset_id,
                        "source_path": &point.payload.source_path,
                        "language": &point.payload.language,
                        "symbol_name": &point.payload.symbol_name,
                        "repo": &point.payload.repo,
                        "content": &point.content,
                    }
                })
            })
            .collect();

        self.send(
            self.request(
                reqwest::Method::PUT,
                &format!("/collections/{collection}/points?wait=true"),
            )
            .json(&json!({ "points": payload_points })),
            "upsert points",
        )
        .await
        .map(|_| ())
    }

    async fn count_points(&self, collection: &str, dataset_id: Option<&str>) -> Result<u64> {
        if !self.collection_exists(collection).await? {
            return Ok(0);
        }
        let mut body = json!({ "exact": true });
        if let Some(dataset_id) = dataset_id {
            body["filter"] = json!({
                "must": [{ "key": "dataset_id", "match": { "value": dataset_id } }]
            });
        }
        let response = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/collections/{collection}/points/count"),
                )
                .json(&body),
                "count points",
            )
            .await?;
        Ok(response["result"]["count"].as_u64().unwrap_or(0))
    }

    async fn query_dense(
        &self,
        collection: &str,
        query: &Embedding,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let fetch = Self::fetch_limit(filter, limit);
        let body = json!({
            "query": &query.vector,
            "using": "dense",
            "filter": Self::build_filter(filter),
            "limit": fetch,
            "with_payload": true,
        });
        self.run_query(collection, body, filter, limit).await
    }

    async fn query_sparse(
        &self,
        collection: &str,
        query: &SparseVector,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let fetch = Self::fetch_limit(filter, limit);
        let body = json!({
            "query": { "indices": &query.indices, "values": &query.values },
            "using": "sparse",
            "filter": Self::build_filter(filter),
            "limit": fetch,
            "with_payload": true,
        });
        self.run_query(collection, body, filter, limit).await
    }

    async fn query_hybrid(
        &self,
        collection: &str,
        dense: &Embedding,
        sparse: &SparseVector,
        filter: &PointFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let fetch = Self::fetch_limit(filter, limit);
        let qdrant_filter = Self::build_filter(filter);
        let body = json!({
            "prefetch": [
                {
                    "query": &dense.vector,
                    "using": "dense",
                    "filter": qdrant_filter.clone(),
                    "limit": fetch,
                },
                {
                    "query": { "indices": &sparse.indices, "values": &sparse.values },
                    "using": "sparse",
                    "filter": qdrant_filter,
                    "limit": fetch,
                }
            ],
            "query": { "fusion": "rrf" },
            "limit": fetch,
            "with_payload": true,
        });
        self.run_query(collection, body, filter, limit).await
    }

    async fn health(&self) -> Result<()> {
        self.send(
            self.request(reqwest::Method::GET, "/collections"),
            "health",
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_uuid_shaped_and_deterministic() {
        let chunk_id = "a3f9c1d2e5b6a7b8c9d0e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6";
        let a = point_id(chunk_id);
        let b = point_id(chunk_id);
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a.matches('-').count(), 4);
    }

    #[test]
    fn path_prefix_queries_over_fetch_candidates() {
        let plain = PointFilter::datasets(vec!["ds-1".to_string()]);
        assert_eq!(QdrantVectorStore::fetch_limit(&plain, 10), 10);

        let prefixed = PointFilter {
            dataset_ids: vec!["ds-1".to_string()],
            language: None,
            path_prefix: Some("src/".to_string()),
            repo: None,
        };
        assert_eq!(
            QdrantVectorStore::fetch_limit(&prefixed, 10),
            10 * PATH_PREFIX_OVERFETCH
        );
    }

    #[test]
    fn filter_includes_dataset_isolation() {
        let filter = PointFilter {
            dataset_ids: vec!["ds-1".into(), "ds-2".into()],
            language: Some("rust".into()),
            path_prefix: None,
            repo: None,
        };
        let built = QdrantVectorStore::build_filter(&filter);
        let must = built["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["key"], "dataset_id");
        assert_eq!(must[0]["match"]["any"].as_array().unwrap().len(), 2);
    }
}
