//! Execution of composite queries against the document-search backend.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub total: u64,
    /// Product uuids in relevance order.
    pub ids: Vec<String>,
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("search backend is not configured")]
    NotConfigured,
    #[error("search backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected search backend response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// `body` is a complete `_search` request body.
    async fn execute(&self, body: &Value) -> Result<SearchHits, BackendError>;
}

/// Elasticsearch-compatible `_search` endpoint.
pub struct ElasticBackend {
    client: reqwest::Client,
    search_url: String,
}

impl ElasticBackend {
    pub fn new(base_url: &str, index: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let search_url = format!("{}/{}/_search", base_url.trim_end_matches('/'), index);
        Ok(Self { client, search_url })
    }
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    async fn execute(&self, body: &Value) -> Result<SearchHits, BackendError> {
        let resp = self.client.post(&self.search_url).json(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status { status: status.as_u16(), body });
        }
        let json: Value = resp.json().await?;
        parse_hits(&json)
    }
}

/// Used when no backend URL is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackend;

#[async_trait]
impl SearchBackend for DisabledBackend {
    async fn execute(&self, _body: &Value) -> Result<SearchHits, BackendError> {
        Err(BackendError::NotConfigured)
    }
}

/// Reads `hits.total` (object with `value`, or a plain number) and the `_id` of every hit.
pub fn parse_hits(json: &Value) -> Result<SearchHits, BackendError> {
    let hits = json.get("hits").ok_or_else(|| BackendError::Malformed("missing `hits`".into()))?;
    let total = match hits.get("total") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(obj @ Value::Object(_)) => obj.get("value").and_then(Value::as_u64),
        _ => None,
    };
    let list = hits
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::Malformed("missing `hits.hits`".into()))?;
    let ids: Vec<String> = list
        .iter()
        .filter_map(|hit| hit.get("_id").and_then(Value::as_str).map(str::to_string))
        .collect();
    Ok(SearchHits { total: total.unwrap_or(ids.len() as u64), ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_both_total_shapes() {
        let modern = json!({"hits": {"total": {"value": 12, "relation": "eq"}, "hits": [{"_id": "a"}, {"_id": "b"}]}});
        assert_eq!(parse_hits(&modern).unwrap(), SearchHits { total: 12, ids: vec!["a".into(), "b".into()] });
        let legacy = json!({"hits": {"total": 3, "hits": [{"_id": "a"}]}});
        assert_eq!(parse_hits(&legacy).unwrap().total, 3);
    }

    #[test]
    fn rejects_missing_hits() {
        assert!(matches!(parse_hits(&json!({"took": 1})), Err(BackendError::Malformed(_))));
    }
}
