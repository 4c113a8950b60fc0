#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use stockroom_api::{
    config::{AppConfig, StockWriteOrder},
    db,
    events::{self, EventSender},
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness for spinning up the application against a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_write_order(StockWriteOrder::LogsFirst).await
    }

    pub async fn with_write_order(write_order: StockWriteOrder) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for test database");
        let db_path = db_dir.path().join("stockroom_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.stock_write_order = write_order;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = stockroom_api::build_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Creates a product through the API and returns its `data` payload.
    pub async fn create_product(&self, reference: &str, category: &str, quantity: i32) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/v1/products",
                Some(json!({
                    "name": format!("Part {}", reference),
                    "description": format!("Test part {}", reference),
                    "reference": reference,
                    "category": category,
                    "buying_price": "10.00",
                    "quantity": quantity,
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "create product {}", reference);
        response_json(response).await["data"].clone()
    }

    pub async fn set_quantity(&self, product_id: &str, quantity: i32) -> Value {
        let response = self
            .request(
                Method::PUT,
                &format!("/api/v1/products/{}/quantity", product_id),
                Some(json!({ "quantity": quantity })),
            )
            .await;
        assert_eq!(response.status(), 200, "set quantity {}", quantity);
        response_json(response).await["data"].clone()
    }

    pub async fn stock_movements(&self, product_id: &str) -> Vec<Value> {
        let response = self
            .request(
                Method::GET,
                &format!("/api/v1/stock-movements?product_id={}", product_id),
                None,
            )
            .await;
        assert_eq!(response.status(), 200);
        data_array(response).await
    }

    pub async fn restock_logs(&self, product_id: &str) -> Vec<Value> {
        let response = self
            .request(
                Method::GET,
                &format!("/api/v1/restock-logs?product_id={}", product_id),
                None,
            )
            .await;
        assert_eq!(response.status(), 200);
        data_array(response).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn data_array(response: Response) -> Vec<Value> {
    response_json(response).await["data"]
        .as_array()
        .cloned()
        .expect("data array")
}
