use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    entities::{inventory, product, stock_transaction},
    errors::ErrorResponse,
    handlers::{inventory as inventory_handlers, products, transactions},
    health,
    services::{
        alerts::{AlertType, StockAlert},
        products::ProductWithInventory,
    },
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory Ledger API",
        version = "0.1.0",
        description = r#"
Products, their stock levels and the transaction ledger that moves stock.

- `purchase` adds to the quantity on hand
- `sale` subtracts and fails with 422 when stock is short
- `adjustment` replaces the quantity on hand with the given value

Inventory update and transaction record are committed atomically.
        "#
    ),
    tags(
        (name = "Products", description = "Product catalog"),
        (name = "Inventory", description = "Stock levels and low-stock alerts"),
        (name = "Transactions", description = "Stock transaction ledger"),
        (name = "Health", description = "Service health")
    ),
    paths(
        products::create_product,
        products::list_products,
        products::get_product,
        products::list_products_by_category,
        products::search_products,
        products::update_product,
        products::delete_product,
        inventory_handlers::list_inventory,
        inventory_handlers::get_inventory,
        inventory_handlers::update_inventory,
        inventory_handlers::low_stock_alerts,
        transactions::create_transaction,
        transactions::list_transactions,
        transactions::list_product_transactions,
        transactions::list_user_transactions,
        health::health_check,
        health::version_info,
    ),
    components(schemas(
        product::Model,
        inventory::Model,
        stock_transaction::Model,
        stock_transaction::TransactionType,
        ProductWithInventory,
        StockAlert,
        AlertType,
        products::CreateProductRequest,
        products::UpdateProductRequest,
        inventory_handlers::UpdateInventoryRequest,
        transactions::CreateTransactionRequest,
        health::HealthReport,
        health::HealthStatus,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
