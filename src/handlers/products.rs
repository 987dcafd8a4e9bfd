use crate::handlers::common::{
    created_response, deserialize_some, no_content_response, normalize_optional_string,
    normalize_string, success_response, validate_input, PaginationParams,
};
use crate::{
    errors::ApiError,
    services::products::{NewProduct, ProductChanges, ProductWithInventory},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/category/:category", get(list_products_by_category))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Create a product together with its inventory row
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductWithInventory),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.normalized();
    validate_input(&payload)?;

    let CreateProductRequest {
        name,
        description,
        category,
        price,
        initial_quantity,
    } = payload;

    let created = state
        .services
        .products
        .create_product(NewProduct {
            name,
            description,
            category,
            price,
            initial_quantity,
        })
        .await?;

    Ok(created_response(created))
}

/// List products with their inventory
#[utoipa::path(
    get,
    path = "/products",
    params(PaginationParams),
    responses(
        (status = 200, description = "Products listed", body = Vec<ProductWithInventory>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .list_products(pagination.page(&state.config))
        .await?;
    Ok(success_response(products))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product retrieved", body = ProductWithInventory),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.get_product(id).await?;
    Ok(success_response(product))
}

/// List products in a category
#[utoipa::path(
    get,
    path = "/products/category/{category}",
    params(
        ("category" = String, Path, description = "Exact category name"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Products listed", body = Vec<ProductWithInventory>)
    ),
    tag = "Products"
)]
pub async fn list_products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .list_by_category(&category, pagination.page(&state.config))
        .await?;
    Ok(success_response(products))
}

/// Search products by name or description
#[utoipa::path(
    get,
    path = "/products/search",
    params(ProductSearchQuery),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductWithInventory>),
        (status = 400, description = "Missing query", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(search): Query<ProductSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let search = ProductSearchQuery {
        query: normalize_string(search.query),
        ..search
    };
    validate_input(&search)?;

    let pagination = PaginationParams {
        skip: search.skip,
        limit: search.limit,
    };
    let products = state
        .services
        .products
        .search_products(&search.query, pagination.page(&state.config))
        .await?;
    Ok(success_response(products))
}

/// Update the allow-listed fields of a product
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductWithInventory),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.normalized();
    validate_input(&payload)?;

    let changes = ProductChanges {
        name: payload.name,
        description: payload.description,
        category: payload.category,
        price: payload.price,
    };

    let updated = state
        .services
        .products
        .update_product(id, changes)
        .await?;
    Ok(success_response(updated))
}

/// Delete a product with its inventory and transaction history
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.products.delete_product(id).await?;
    Ok(no_content_response())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Ergonomic Keyboard",
    "description": "Split layout, brown switches",
    "category": "peripherals",
    "price": 89.5,
    "initial_quantity": 40
}))]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    /// Unit price, must be greater than zero
    pub price: f64,
    /// Starting quantity on hand
    #[serde(default)]
    #[validate(range(min = 0))]
    pub initial_quantity: i32,
}

impl CreateProductRequest {
    /// Trims text fields so blank values fail length validation.
    fn normalized(self) -> Self {
        Self {
            name: normalize_string(self.name),
            description: normalize_optional_string(self.description),
            category: normalize_string(self.category),
            ..self
        }
    }
}

/// Product fields that can be changed. Unknown fields are rejected.
/// `"description": null` or `""` removes the description.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// Length is checked by the product service
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub price: Option<f64>,
}

impl UpdateProductRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.map(normalize_string),
            description: self.description.map(normalize_optional_string),
            category: self.category.map(normalize_string),
            ..self
        }
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductSearchQuery {
    /// Text to look for in product names and descriptions
    #[validate(length(min = 1, max = 200))]
    pub query: String,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_request_rejects_unlisted_fields() {
        let err = serde_json::from_value::<UpdateProductRequest>(json!({
            "name": "Renamed",
            "id": 99
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn create_request_validates_lengths() {
        let request: CreateProductRequest = serde_json::from_value(json!({
            "name": "",
            "category": "x".repeat(101),
            "price": 1.0
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("category"));
        assert_eq!(request.initial_quantity, 0);
    }

    #[test]
    fn blank_text_fails_validation_after_trimming() {
        let request: CreateProductRequest = serde_json::from_value(json!({
            "name": "   ",
            "category": "\t",
            "price": 1.0
        }))
        .unwrap();
        let errors = request.normalized().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("category"));
    }

    #[test]
    fn blank_or_null_description_clears_it() {
        let blank: UpdateProductRequest =
            serde_json::from_value(json!({ "description": "  " })).unwrap();
        assert_eq!(blank.normalized().description, Some(None));

        let null: UpdateProductRequest =
            serde_json::from_value(json!({ "description": null })).unwrap();
        assert_eq!(null.normalized().description, Some(None));

        let absent: UpdateProductRequest = serde_json::from_value(json!({ "price": 2.0 })).unwrap();
        assert_eq!(absent.normalized().description, None);
    }
}
