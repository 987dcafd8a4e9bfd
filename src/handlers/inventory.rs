use crate::handlers::common::{success_response, validate_input, PaginationParams};
use crate::{
    entities::inventory,
    errors::ApiError,
    services::{alerts::StockAlert, inventory::InventoryChanges},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/alerts/low-stock", get(low_stock_alerts))
        .route("/:product_id", get(get_inventory).put(update_inventory))
}

/// List inventory rows
#[utoipa::path(
    get,
    path = "/inventory",
    params(PaginationParams),
    responses(
        (status = 200, description = "Inventory listed", body = Vec<inventory::Model>)
    ),
    tag = "Inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .inventory
        .list_inventory(pagination.page(&state.config))
        .await?;
    Ok(success_response(rows))
}

/// Get the inventory row of a product
#[utoipa::path(
    get,
    path = "/inventory/{product_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Inventory retrieved", body = inventory::Model),
        (status = 404, description = "No inventory for product", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state.services.inventory.get_inventory(product_id).await?;
    Ok(success_response(row))
}

/// Set quantity or stock thresholds of a product
#[utoipa::path(
    put,
    path = "/inventory/{product_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID")
    ),
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Inventory updated", body = inventory::Model),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "No inventory for product", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let row = state
        .services
        .inventory
        .update_inventory(
            product_id,
            InventoryChanges {
                quantity: payload.quantity,
                min_stock_level: payload.min_stock_level,
                max_stock_level: payload.max_stock_level,
            },
        )
        .await?;
    Ok(success_response(row))
}

/// Products at or below their minimum stock level
#[utoipa::path(
    get,
    path = "/inventory/alerts/low-stock",
    responses(
        (status = 200, description = "Current low-stock alerts", body = Vec<StockAlert>)
    ),
    tag = "Inventory"
)]
pub async fn low_stock_alerts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let alerts = state.services.alerts.low_stock_alerts().await?;
    Ok(success_response(alerts))
}

/// Inventory fields that can be set directly. Unknown fields are rejected.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateInventoryRequest {
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
    #[validate(range(min = 0))]
    pub max_stock_level: Option<i32>,
}
