use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::requests::{validate_store, validate_update, ProductInput};
use crate::{authorize, AppState};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use catalog_core::category::build_chain;
use catalog_core::listing::{ListParams, Page};
use catalog_core::persist::CatalogStore;
use catalog_core::{Brand, Category, Product};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Product as rendered by the API, with the requested relations.
#[derive(Debug, Serialize)]
pub struct ProductResource {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Root-to-leaf breadcrumbs of `category`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_hierarchy: Option<Vec<Category>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analogs: Option<Vec<Product>>,
}

impl ProductResource {
    pub fn bare(product: Product) -> Self {
        Self { product, brand: None, category: None, category_hierarchy: None, analogs: None }
    }

    /// `filterValues` and `productGroup` are carried by the uuid fields of
    /// the product itself.
    pub fn with_includes(store: &CatalogStore, product: Product, includes: &[String]) -> Result<Self, ApiError> {
        let mut resource = Self::bare(product);
        for include in includes {
            match include.as_str() {
                "brand" => {
                    if let Some(uuid) = resource.product.brand_uuid.as_deref() {
                        resource.brand = store.get_brand(uuid)?;
                    }
                }
                "category" => {
                    if let Some(category) = category_of(store, &resource.product)? {
                        resource.category_hierarchy = Some(build_chain(store, category.clone(), Vec::new())?);
                        resource.category = Some(category);
                    }
                }
                "analogs" => {
                    resource.analogs = Some(store.products_by_uuids(&resource.product.analog_uuids)?);
                }
                _ => {}
            }
        }
        Ok(resource)
    }
}

fn category_of(store: &CatalogStore, product: &Product) -> Result<Option<Category>, ApiError> {
    match product.category_uuid.as_deref() {
        Some(uuid) => Ok(store.get_category(uuid)?),
        None => Ok(None),
    }
}

pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
) -> Result<Json<Page<ProductResource>>, ApiError> {
    let params = ListParams::from_query(&params)?;
    let page = state.store.list_products(&params)?;
    let mut data = Vec::with_capacity(page.data.len());
    for product in page.data {
        data.push(ProductResource::with_includes(&state.store, product, &params.includes)?);
    }
    Ok(Json(Page { data, meta: page.meta }))
}

pub async fn store(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(inputs): ApiJson<Vec<ProductInput>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&state, &headers)?;
    let batch = validate_store(inputs).map_err(ApiError::Validation)?;
    let created = state.store.insert_products(batch)?;
    let data: Vec<ProductResource> = created.into_iter().map(ProductResource::bare).collect();
    Ok((StatusCode::CREATED, Json(json!({ "data": data }))))
}

pub async fn show(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let params = ListParams::from_query(&params)?;
    let product = state.store.get_product(&uuid)?.ok_or(ApiError::NotFound)?;
    let resource = ProductResource::with_includes(&state.store, product, &params.includes)?;
    Ok(Json(json!({ "data": resource })))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uuid): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    if state.store.get_product(&uuid)?.is_none() {
        return Err(ApiError::NotFound);
    }
    let patch = validate_update(input).map_err(ApiError::Validation)?;
    let updated = state.store.update_product(&uuid, patch)?;
    Ok(Json(json!({ "data": ProductResource::bare(updated) })))
}

pub async fn destroy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(uuid): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    if state.store.delete_product(&uuid)? {
        tracing::info!(%uuid, "product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

pub async fn category_hierarchy(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let category = state.store.get_category(&uuid)?.ok_or(ApiError::NotFound)?;
    let chain = build_chain(state.store.as_ref(), category, Vec::new())?;
    Ok(Json(json!({ "data": chain })))
}
