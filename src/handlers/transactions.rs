use crate::handlers::common::{
    created_response, normalize_optional_string, normalize_string, success_response,
    validate_input, PaginationParams,
};
use crate::{
    entities::stock_transaction,
    errors::ApiError,
    services::ledger::{parse_transaction_type, RecordTransaction},
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

pub fn transactions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/product/:product_id", get(list_product_transactions))
        .route("/user/:user_name", get(list_user_transactions))
}

/// Record a stock transaction and apply it to inventory
#[utoipa::path(
    post,
    path = "/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = stock_transaction::Model),
        (status = 400, description = "Invalid type or quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or inventory not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Transactions"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = CreateTransactionRequest {
        user_name: normalize_string(payload.user_name),
        notes: normalize_optional_string(payload.notes),
        ..payload
    };
    validate_input(&payload)?;

    let command = RecordTransaction {
        product_id: payload.product_id,
        transaction_type: parse_transaction_type(&payload.transaction_type)?,
        quantity: payload.quantity,
        user_name: payload.user_name,
        notes: payload.notes,
    };

    let record = state.services.ledger.record_transaction(command).await?;
    Ok(created_response(record))
}

/// List transactions, newest first
#[utoipa::path(
    get,
    path = "/transactions",
    params(PaginationParams),
    responses(
        (status = 200, description = "Transactions listed", body = Vec<stock_transaction::Model>)
    ),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .services
        .ledger
        .list_transactions(pagination.page(&state.config))
        .await?;
    Ok(success_response(records))
}

/// List a product's transactions, newest first
#[utoipa::path(
    get,
    path = "/transactions/product/{product_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Transactions listed", body = Vec<stock_transaction::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Transactions"
)]
pub async fn list_product_transactions(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .services
        .ledger
        .list_for_product(product_id, pagination.page(&state.config))
        .await?;
    Ok(success_response(records))
}

/// List transactions entered by a user, newest first
#[utoipa::path(
    get,
    path = "/transactions/user/{user_name}",
    params(
        ("user_name" = String, Path, description = "User name as recorded on the transaction"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Transactions listed", body = Vec<stock_transaction::Model>)
    ),
    tag = "Transactions"
)]
pub async fn list_user_transactions(
    State(state): State<AppState>,
    Path(user_name): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .services
        .ledger
        .list_for_user(&user_name, pagination.page(&state.config))
        .await?;
    Ok(success_response(records))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "product_id": 1,
    "transaction_type": "sale",
    "quantity": 20,
    "user_name": "warehouse-a",
    "notes": "order 1182"
}))]
pub struct CreateTransactionRequest {
    pub product_id: i32,
    /// One of `purchase`, `sale` or `adjustment`
    pub transaction_type: String,
    /// Units moved; for an adjustment, the new quantity on hand
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 100))]
    pub user_name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}
