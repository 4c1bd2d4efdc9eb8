use anyhow::Result;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use catalog_core::composer::RuleSetComposer;
use catalog_core::config::SearchConfig;
use catalog_core::persist::CatalogStore;
use catalog_core::rules::RuleRegistry;
use catalog_core::sink::{FragmentSink, RingSink, TracingSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod backend;
pub mod error;
pub mod extract;
pub mod products;
pub mod requests;
pub mod search;

use backend::{DisabledBackend, ElasticBackend, SearchBackend};
use error::ApiError;

/// Fragments kept for `GET /search/debug`.
const RECENT_FRAGMENTS: usize = 256;

pub struct AppOptions {
    pub db_path: PathBuf,
    pub search_config: Option<PathBuf>,
    pub es_url: Option<String>,
    pub es_index: String,
    pub es_timeout: Duration,
    pub admin_token: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CatalogStore>,
    pub config: Arc<SearchConfig>,
    pub registry: Arc<RuleRegistry>,
    pub composer: Arc<RuleSetComposer>,
    pub recent: Arc<RingSink>,
    pub backend: Arc<dyn SearchBackend>,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Fragments go both to the trace log and to the in-memory ring.
    pub fn new(
        store: CatalogStore,
        config: SearchConfig,
        backend: Arc<dyn SearchBackend>,
        admin_token: Option<String>,
    ) -> Self {
        let recent = Arc::new(RingSink::new(RECENT_FRAGMENTS));
        let sinks: Vec<Arc<dyn FragmentSink>> = vec![Arc::new(TracingSink::default()), recent.clone()];
        let composer = config.composer(Arc::new(sinks));
        Self {
            store: Arc::new(store),
            registry: Arc::new(config.registry()),
            config: Arc::new(config),
            composer: Arc::new(composer),
            recent,
            backend,
            admin_token,
        }
    }
}

pub fn build_app(options: AppOptions) -> Result<Router> {
    let store = CatalogStore::open(&options.db_path)?;
    let config = SearchConfig::load(options.search_config.as_deref())?;
    let backend: Arc<dyn SearchBackend> = match &options.es_url {
        Some(url) => Arc::new(ElasticBackend::new(url, &options.es_index, options.es_timeout)?),
        None => {
            tracing::warn!("no search backend configured, /search will answer 503");
            Arc::new(DisabledBackend)
        }
    };
    tracing::info!(rules = ?config.rules, mode = ?config.mode, "search configuration loaded");
    let state = AppState::new(store, config, backend, options.admin_token);
    Ok(router(state).layer(cors_from_env()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/products", get(products::index).post(products::store))
        .route(
            "/products/:uuid",
            get(products::show).put(products::update).patch(products::update).delete(products::destroy),
        )
        .route("/categories/:uuid/hierarchy", get(products::category_hierarchy))
        .route("/search", get(search::search))
        .route("/search/explain", post(search::explain))
        .route("/search/debug", get(search::debug))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_from_env() -> CorsLayer {
    match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    }
}

pub(crate) fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}
