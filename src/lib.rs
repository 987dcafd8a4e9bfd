//! Inventory Ledger
//!
//! HTTP service for a product catalog, per-product stock levels and the
//! transaction ledger that moves stock. Purchases, sales and adjustments are
//! applied to inventory atomically with their transaction record.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;

use crate::{config::AppConfig, services::AppServices};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub services: AppServices,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        Self {
            services: AppServices::new(db.clone()),
            db,
            config,
            started_at: Utc::now(),
        }
    }
}

/// Resource routes, without middleware or state
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", handlers::products::products_routes())
        .nest("/inventory", handlers::inventory::inventory_routes())
        .nest("/transactions", handlers::transactions::transactions_routes())
        .nest("/health", health::health_routes())
}

async fn api_status() -> impl IntoResponse {
    Json(json!({
        "message": "Inventory Ledger API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Complete application router with request ids, tracing and timeouts.
/// CORS is left to the binary since it depends on deployment.
pub fn app_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(api_status))
        .merge(api_routes());

    if state.config.enable_docs {
        router = router.merge(openapi::swagger_ui());
    }

    router
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
