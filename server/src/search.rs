use crate::backend::SearchHits;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::products::ProductResource;
use crate::{authorize, AppState};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use catalog_core::boost::BoostTable;
use catalog_core::category::build_chain;
use catalog_core::composer::ComposeMode;
use catalog_core::query::CompositeQuery;
use catalog_core::rules::{NormalizedQuery, SearchRule};
use catalog_core::Product;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

const MAX_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    /// Comma-separated rule names; the configured set when absent.
    pub rules: Option<String>,
    pub mode: Option<ComposeMode>,
    #[serde(default)]
    pub from: usize,
    pub size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub normalized: String,
    pub mode: ComposeMode,
    /// Rule whose query produced the results (cascade mode only).
    pub rule: Option<String>,
    pub total_hits: u64,
    pub took_ms: u128,
    pub results: Vec<ProductResource>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    #[serde(default)]
    pub q: String,
    pub rules: Option<Vec<String>>,
    pub mode: Option<ComposeMode>,
    pub boosts: Option<BoostTable>,
}

/// One executable query: the rule it came from, if it came from one.
struct Candidate {
    rule: Option<String>,
    query: CompositeQuery,
}

fn candidates(
    state: &AppState,
    query: &NormalizedQuery,
    rules: &[Arc<dyn SearchRule>],
    boosts: &BoostTable,
    mode: ComposeMode,
) -> Vec<Candidate> {
    match mode {
        ComposeMode::Cascade if !rules.is_empty() => state
            .composer
            .cascade_normalized(query, rules, boosts)
            .into_iter()
            .map(|rq| Candidate { rule: Some(rq.rule), query: rq.query })
            .collect(),
        _ => vec![Candidate { rule: None, query: state.composer.compose_normalized(query, rules, boosts) }],
    }
}

fn resolve_rules<S: AsRef<str>>(state: &AppState, names: Option<&[S]>) -> Result<Vec<Arc<dyn SearchRule>>, ApiError> {
    Ok(match names {
        Some(names) => state.registry.resolve(names)?,
        None => state.registry.resolve(&state.config.rules)?,
    })
}

fn split_rules(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|s| s.split(',').map(str::trim).filter(|n| !n.is_empty()).map(str::to_string).collect())
}

pub async fn search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let names = split_rules(params.rules.as_deref());
    let rules = resolve_rules(&state, names.as_deref())?;
    let mode = params.mode.unwrap_or(state.config.mode);
    let size = params.size.unwrap_or(state.config.page_size).clamp(1, MAX_SIZE);
    let query = NormalizedQuery::new(&params.q);

    let mut winner = None;
    let mut hits = SearchHits::default();
    for candidate in candidates(&state, &query, &rules, &state.config.boosts, mode) {
        let body = candidate.query.to_search_body(params.from, size);
        let found = state.backend.execute(&body).await?;
        let has_hits = found.total > 0;
        hits = found;
        if has_hits {
            winner = candidate.rule;
            break;
        }
    }

    let products = state.store.products_by_uuids(&hits.ids)?;
    let results = products.into_iter().map(|product| with_breadcrumbs(&state, product)).collect();
    let elapsed = start.elapsed();
    tracing::info!(query = %query, total_hits = hits.total, rule = ?winner, "search");
    Ok(Json(SearchResponse {
        query: params.q,
        normalized: query.as_str().to_string(),
        mode,
        rule: winner,
        total_hits: hits.total,
        took_ms: elapsed.as_millis(),
        results,
    }))
}

// A broken hierarchy drops the breadcrumbs, not the hit.
fn with_breadcrumbs(state: &AppState, product: Product) -> ProductResource {
    let mut resource = ProductResource::bare(product);
    let Some(uuid) = resource.product.category_uuid.clone() else {
        return resource;
    };
    let chain = state
        .store
        .get_category(&uuid)
        .and_then(|found| match found {
            Some(category) => build_chain(state.store.as_ref(), category, Vec::new()).map(Some),
            None => Ok(None),
        });
    match chain {
        Ok(chain) => resource.category_hierarchy = chain,
        Err(err) => tracing::error!(category = %uuid, error = %err, "category breadcrumbs unavailable"),
    }
    resource
}

pub async fn explain(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ExplainRequest>,
) -> Result<Json<Value>, ApiError> {
    let rules = resolve_rules(&state, req.rules.as_deref())?;
    let mode = req.mode.unwrap_or(state.config.mode);
    let boosts = match &req.boosts {
        Some(extra) => {
            extra.validate()?;
            state.config.boosts.overlay(extra)
        }
        None => state.config.boosts.clone(),
    };
    let query = NormalizedQuery::new(&req.q);
    let queries: Vec<Value> = candidates(&state, &query, &rules, &boosts, mode)
        .into_iter()
        .map(|c| json!({ "rule": c.rule, "query": c.query }))
        .collect();
    Ok(Json(json!({ "query": req.q, "normalized": query.as_str(), "mode": mode, "queries": queries })))
}

pub async fn debug(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(json!({ "dropped": state.recent.dropped(), "records": state.recent.recent() })))
}
