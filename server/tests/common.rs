// Shared by the integration test binaries; not every helper is used by each.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_core::config::SearchConfig;
use catalog_core::persist::CatalogStore;
use catalog_server::backend::{BackendError, SearchBackend, SearchHits};
use catalog_server::{router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TOKEN: &str = "secret";

/// Answers each request with the next scripted result and keeps the bodies.
#[derive(Default)]
pub struct ScriptedBackend {
    pub answers: Mutex<Vec<SearchHits>>,
    pub requests: Mutex<Vec<Value>>,
}

impl ScriptedBackend {
    pub fn new(answers: Vec<SearchHits>) -> Arc<Self> {
        Arc::new(Self { answers: Mutex::new(answers), requests: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn execute(&self, body: &Value) -> Result<SearchHits, BackendError> {
        self.requests.lock().unwrap().push(body.clone());
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            Ok(SearchHits::default())
        } else {
            Ok(answers.remove(0))
        }
    }
}

pub fn app_with(store: CatalogStore, config: SearchConfig, backend: Arc<dyn SearchBackend>) -> Router {
    router(AppState::new(store, config, backend, Some(TOKEN.to_string())))
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri).header("X-ADMIN-TOKEN", TOKEN);
    let body = match body {
        Some(json) => {
            req = req.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}
