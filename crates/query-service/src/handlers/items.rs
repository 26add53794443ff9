use crate::handlers::{clamp_page, clamp_page_size, finish};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use cache::{keys, Cache};
use common::{AppError, InventoryItem, StockStatus};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<InventoryItem>,
    pub page: u32,
    pub page_size: u32,
}

/// `GET /items`, spec §6. Read-through: a cache hit returns the cached
/// page verbatim; a miss reads the reader pool and backfills the cache.
pub async fn list_items(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let page = clamp_page(query.page);
    let page_size = clamp_page_size(query.page_size, state.config.default_page_size);
    finish(list_items_inner(&state, page, page_size).await)
}

async fn list_items_inner(state: &AppState, page: u32, page_size: u32) -> Result<ListResponse, AppError> {
    let key = keys::list_key(page, page_size);
    if let Some(cached) = cache_get(&state.cache, &key).await {
        if let Ok(items) = serde_json::from_str(&cached) {
            return Ok(ListResponse { items, page, page_size });
        }
    }

    let items = state.store.list_items(page, page_size).await?;
    cache_set(&state.cache, &key, &items, state.cache_ttl).await;
    Ok(ListResponse { items, page, page_size })
}

/// `GET /items/{id}`, spec §6.
pub async fn get_item(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    finish(get_item_inner(&state, id).await)
}

async fn get_item_inner(state: &AppState, id: Uuid) -> Result<InventoryItem, AppError> {
    let key = keys::item_id_key(id);
    if let Some(cached) = cache_get(&state.cache, &key).await {
        if let Ok(item) = serde_json::from_str(&cached) {
            return Ok(item);
        }
    }

    let item = state.store.find_by_id(id).await?.ok_or_else(|| AppError::NotFound(id.to_string()))?;
    cache_set(&state.cache, &key, &item, state.cache_ttl).await;
    Ok(item)
}

/// `GET /items/sku/{sku}`, spec §6.
pub async fn get_item_by_sku(State(state): State<AppState>, Path(sku): Path<String>) -> Response {
    finish(get_item_by_sku_inner(&state, sku).await)
}

async fn get_item_by_sku_inner(state: &AppState, sku: String) -> Result<InventoryItem, AppError> {
    let key = keys::item_sku_key(&sku);
    if let Some(cached) = cache_get(&state.cache, &key).await {
        if let Ok(item) = serde_json::from_str(&cached) {
            return Ok(item);
        }
    }

    let item = state.store.find_by_sku(&sku).await?.ok_or_else(|| AppError::NotFound(sku.clone()))?;
    cache_set(&state.cache, &key, &item, state.cache_ttl).await;
    Ok(item)
}

/// `GET /items/{id}/stock`, spec §6.
pub async fn get_stock(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    finish(get_stock_inner(&state, id).await)
}

async fn get_stock_inner(state: &AppState, id: Uuid) -> Result<StockStatus, AppError> {
    let key = keys::stock_key(id);
    if let Some(cached) = cache_get(&state.cache, &key).await {
        if let Ok(status) = serde_json::from_str(&cached) {
            return Ok(status);
        }
    }

    let status = state.store.stock_status(id).await?.ok_or_else(|| AppError::NotFound(id.to_string()))?;
    cache_set(&state.cache, &key, &status, state.stock_ttl).await;
    Ok(status)
}

async fn cache_get(cache: &impl Cache, key: &str) -> Option<String> {
    match cache.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, key, "cache read failed, falling back to the store");
            None
        }
    }
}

async fn cache_set<T: Serialize>(cache: &impl Cache, key: &str, value: &T, ttl: std::time::Duration) {
    let Ok(json) = serde_json::to_string(value) else { return };
    if let Err(e) = cache.set(key, json, ttl).await {
        warn!(error = %e, key, "cache write failed, continuing without it");
    }
}
