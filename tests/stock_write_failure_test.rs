mod common;

use std::str::FromStr;

use axum::http::Method;
use sea_orm::ConnectionTrait;
use stockroom_api::{config::StockWriteOrder, errors::ServiceError};
use uuid::Uuid;

use common::{response_json, TestApp};

/// Makes every insert into `restock_logs` fail while leaving the table readable.
async fn reject_restock_log_inserts(app: &TestApp) {
    app.state
        .db
        .execute_unprepared(
            "CREATE TRIGGER reject_restock_logs BEFORE INSERT ON restock_logs \
             BEGIN SELECT RAISE(ABORT, 'restock log writes disabled'); END;",
        )
        .await
        .expect("create trigger");
}

/// Runs a 5 -> 0 edit whose restock bookkeeping fails and returns the product id.
async fn failing_out_of_stock_edit(app: &TestApp) -> String {
    let product = app.create_product("OF-100", "Filters", 5).await;
    let id = product["id"].as_str().expect("product id").to_string();
    reject_restock_log_inserts(app).await;

    let result = app
        .state
        .services
        .products
        .set_quantity(Uuid::from_str(&id).expect("uuid"), 0)
        .await;
    assert!(matches!(result, Err(ServiceError::DatabaseError(_))));

    id
}

async fn stored_quantity(app: &TestApp, id: &str) -> i64 {
    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", id), None)
        .await;
    assert_eq!(response.status(), 200);
    response_json(response).await["data"]["quantity"]
        .as_i64()
        .expect("quantity")
}

#[tokio::test]
async fn logs_first_failure_keeps_movement_but_not_the_new_quantity() {
    let app = TestApp::with_write_order(StockWriteOrder::LogsFirst).await;
    let id = failing_out_of_stock_edit(&app).await;

    let movements = app.stock_movements(&id).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["previous_quantity"], 5);
    assert_eq!(movements[0]["new_quantity"], 0);
    assert_eq!(movements[0]["change"], -5);

    assert_eq!(stored_quantity(&app, &id).await, 5);
    assert!(app.restock_logs(&id).await.is_empty());
}

#[tokio::test]
async fn product_first_failure_keeps_movement_and_new_quantity() {
    let app = TestApp::with_write_order(StockWriteOrder::ProductFirst).await;
    let id = failing_out_of_stock_edit(&app).await;

    let movements = app.stock_movements(&id).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["change"], -5);

    assert_eq!(stored_quantity(&app, &id).await, 0);
    assert!(app.restock_logs(&id).await.is_empty());
}

#[tokio::test]
async fn failed_edit_is_reported_as_server_error() {
    let app = TestApp::new().await;
    let product = app.create_product("BP-200", "Brakes", 3).await;
    let id = product["id"].as_str().expect("product id").to_string();
    reject_restock_log_inserts(&app).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}/quantity", id),
            Some(serde_json::json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(response.status(), 500);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Database error");
}
