use crate::handlers::{finish, replay};
use crate::state::AppState;
use aggregate::InventoryAggregate;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use common::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateItemResponse {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub status: &'static str,
}

/// `POST /items`, spec §6. Publish failure surfaces as a 503 per spec
/// §4.6's rationale ("treat publish failure as a transient outage...so
/// the caller can retry with the same request id") rather than rolling
/// back anything — there is nothing in the store to roll back yet.
pub async fn create_item(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<CreateItemRequest>) -> Response {
    if let Some(cached) = replay(&state, &headers) {
        return cached;
    }
    let result = create_item_inner(&state, body).await;
    finish(&state, &headers, result)
}

async fn create_item_inner(state: &AppState, body: CreateItemRequest) -> Result<(StatusCode, CreateItemResponse), AppError> {
    let aggregate = InventoryAggregate::new_unloaded();
    let (item_id, event) = aggregate.create(body.sku, body.name, body.description, body.quantity)?;
    state.producer.publish(event.clone(), None, &state.cancel).await?;
    Ok((
        StatusCode::CREATED,
        CreateItemResponse {
            item_id,
            sku: event.sku,
            name: event.name,
            description: event.description,
            quantity: event.quantity,
            status: "accepted",
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateItemResponse {
    pub item_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: &'static str,
}

/// `PUT /items/{id}`, spec §6.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<UpdateItemRequest>,
) -> Response {
    if let Some(cached) = replay(&state, &headers) {
        return cached;
    }
    let result = update_item_inner(&state, id, body).await;
    finish(&state, &headers, result)
}

async fn update_item_inner(state: &AppState, id: Uuid, body: UpdateItemRequest) -> Result<(StatusCode, UpdateItemResponse), AppError> {
    let aggregate = InventoryAggregate::load(&state.store, id).await?;
    let event = aggregate.update(body.name, body.description)?;
    state.producer.publish(event.clone(), None, &state.cancel).await?;
    Ok((
        StatusCode::OK,
        UpdateItemResponse {
            item_id: event.item_id,
            name: event.name,
            description: event.description,
            status: "accepted",
        },
    ))
}

#[derive(Debug, Serialize)]
pub struct DeleteItemResponse {
    pub item_id: Uuid,
    pub sku: String,
    pub status: &'static str,
}

/// `DELETE /items/{id}`, spec §6.
pub async fn delete_item(State(state): State<AppState>, Path(id): Path<Uuid>, headers: HeaderMap) -> Response {
    if let Some(cached) = replay(&state, &headers) {
        return cached;
    }
    let result = delete_item_inner(&state, id).await;
    finish(&state, &headers, result)
}

async fn delete_item_inner(state: &AppState, id: Uuid) -> Result<(StatusCode, DeleteItemResponse), AppError> {
    let aggregate = InventoryAggregate::load(&state.store, id).await?;
    let event = aggregate.delete()?;
    state.producer.publish(event.clone(), None, &state.cancel).await?;
    Ok((
        StatusCode::OK,
        DeleteItemResponse {
            item_id: event.item_id,
            sku: event.sku,
            status: "accepted",
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub adjustment: i64,
}

#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    pub item_id: Uuid,
    pub sku: String,
    pub adjustment: i64,
    pub new_quantity: i64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StockCommandResponse {
    pub item_id: Uuid,
    pub sku: String,
    pub total_quantity: i64,
    pub reserved_total: i64,
    pub available_quantity: i64,
    pub status: &'static str,
}

/// `POST /items/{id}/adjust`, spec §6.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<AdjustRequest>,
) -> Response {
    if let Some(cached) = replay(&state, &headers) {
        return cached;
    }
    let result = adjust_stock_inner(&state, id, body).await;
    finish(&state, &headers, result)
}

async fn adjust_stock_inner(state: &AppState, id: Uuid, body: AdjustRequest) -> Result<(StatusCode, AdjustResponse), AppError> {
    let aggregate = InventoryAggregate::load(&state.store, id).await?;
    let event = aggregate.adjust(body.adjustment)?;
    state.producer.publish(event.clone(), None, &state.cancel).await?;
    Ok((
        StatusCode::OK,
        AdjustResponse {
            item_id: event.item_id,
            sku: event.sku,
            adjustment: event.adjustment,
            new_quantity: event.new_quantity,
            status: "accepted",
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub quantity: i64,
}

/// `POST /items/{id}/reserve`, spec §6.
pub async fn reserve_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ReserveRequest>,
) -> Response {
    if let Some(cached) = replay(&state, &headers) {
        return cached;
    }
    let result = reserve_stock_inner(&state, id, body).await;
    finish(&state, &headers, result)
}

async fn reserve_stock_inner(state: &AppState, id: Uuid, body: ReserveRequest) -> Result<(StatusCode, StockCommandResponse), AppError> {
    let aggregate = InventoryAggregate::load(&state.store, id).await?;
    let event = aggregate.reserve(body.quantity)?;
    state.producer.publish(event.clone(), None, &state.cancel).await?;
    Ok((
        StatusCode::OK,
        StockCommandResponse {
            item_id: event.item_id,
            sku: event.sku,
            total_quantity: event.total_quantity,
            reserved_total: event.reserved_total,
            available_quantity: event.available_quantity,
            status: "accepted",
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub quantity: i64,
}

/// `POST /items/{id}/release`, spec §6.
pub async fn release_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ReleaseRequest>,
) -> Response {
    if let Some(cached) = replay(&state, &headers) {
        return cached;
    }
    let result = release_stock_inner(&state, id, body).await;
    finish(&state, &headers, result)
}

async fn release_stock_inner(state: &AppState, id: Uuid, body: ReleaseRequest) -> Result<(StatusCode, StockCommandResponse), AppError> {
    let aggregate = InventoryAggregate::load(&state.store, id).await?;
    let event = aggregate.release(body.quantity)?;
    state.producer.publish(event.clone(), None, &state.cancel).await?;
    Ok((
        StatusCode::OK,
        StockCommandResponse {
            item_id: event.item_id,
            sku: event.sku,
            total_quantity: event.total_quantity,
            reserved_total: event.reserved_total,
            available_quantity: event.available_quantity,
            status: "accepted",
        },
    ))
}
