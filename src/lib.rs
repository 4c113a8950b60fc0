//! Stockroom API Library
//!
//! Inventory backend for a small parts shop: products, categories, a stock
//! movement log and out-of-stock/restock tracking.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod filters;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod stock_rules;
pub mod telemetry;

use axum::{extract::State, middleware, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wires the services around an open pool and event channel
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services =
            handlers::AppServices::new(db.clone(), event_sender.clone(), config.stock_write_order);
        Self {
            db,
            config,
            event_sender,
            services,
            started_at: Utc::now(),
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: telemetry::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/products", handlers::products::products_routes())
        .nest("/categories", handlers::categories::categories_routes())
        .merge(handlers::ledger::ledger_routes())
}

/// Full application router: API, Swagger UI, request ids and HTTP tracing.
///
/// CORS and compression are added by the binary since they depend on the
/// deployment configuration.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
        .layer(telemetry::configure_http_tracing())
        .layer(middleware::from_fn(telemetry::request_id_middleware))
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "stockroom-api",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "stock_write_order": state.config.stock_write_order.to_string(),
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let uptime = (Utc::now() - state.started_at).num_seconds().max(0);
    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "uptime_seconds": uptime,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

pub mod prelude {
    pub use crate::config::{AppConfig, StockWriteOrder};
    pub use crate::db::DbPool;
    pub use crate::errors::{ApiError, ServiceError};
    pub use crate::events::{Event, EventSender};
    pub use crate::filters::ProductFilter;
    pub use crate::services::{
        CategoryService, InventorySummary, LedgerService, ProductInput, ProductService,
        QuantityChangeOutcome, StockService,
    };
    pub use crate::stock_rules::{evaluate, QuantityChangePlan, RestockAction};
    pub use crate::{ApiResponse, AppState};
}
