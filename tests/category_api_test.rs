mod common;

use axum::http::Method;
use serde_json::{json, Value};

use common::{data_array, response_json, TestApp};

async fn category_names(app: &TestApp) -> Vec<String> {
    let response = app.request(Method::GET, "/api/v1/categories", None).await;
    assert_eq!(response.status(), 200);
    data_array(response)
        .await
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

async fn create_category(app: &TestApp, name: &str) -> axum::response::Response {
    app.request(
        Method::POST,
        "/api/v1/categories",
        Some(json!({ "name": name })),
    )
    .await
}

#[tokio::test]
async fn categories_are_trimmed_unique_and_sorted() {
    let app = TestApp::new().await;

    let response = create_category(&app, "  Wipers ").await;
    assert_eq!(response.status(), 201);
    let created = response_json(response).await;
    assert_eq!(created["data"]["name"], "Wipers");

    assert_eq!(create_category(&app, "Brakes").await.status(), 201);
    assert_eq!(create_category(&app, "Filters").await.status(), 201);

    assert_eq!(category_names(&app).await, vec!["Brakes", "Filters", "Wipers"]);

    let response = create_category(&app, "Wipers").await;
    assert_eq!(response.status(), 409);

    let response = create_category(&app, "   ").await;
    assert_eq!(response.status(), 400);

    assert_eq!(category_names(&app).await.len(), 3);
}

#[tokio::test]
async fn product_save_creates_missing_category() {
    let app = TestApp::new().await;
    app.create_product("OF-100", "Filters", 1).await;
    app.create_product("AF-300", "Filters", 1).await;
    app.create_product("WB-400", "", 1).await;

    assert_eq!(category_names(&app).await, vec!["Filters"]);
}

#[tokio::test]
async fn unused_category_can_be_deleted() {
    let app = TestApp::new().await;
    assert_eq!(create_category(&app, "Lighting").await.status(), 201);

    let response = app
        .request(Method::DELETE, "/api/v1/categories/Lighting", None)
        .await;
    assert_eq!(response.status(), 204);
    assert!(category_names(&app).await.is_empty());
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let app = TestApp::new().await;
    app.create_product("OF-100", "Filters", 1).await;
    app.create_product("AF-300", "Filters", 0).await;
    app.create_product("BP-200", "Brakes", 2).await;

    let response = app
        .request(Method::DELETE, "/api/v1/categories/Filters", None)
        .await;
    assert_eq!(response.status(), 409);
    let body: Value = response_json(response).await;
    assert_eq!(
        body["message"],
        "Cannot delete category \"Filters\" because 2 product(s) are using it."
    );

    assert_eq!(category_names(&app).await, vec!["Brakes", "Filters"]);
}

#[tokio::test]
async fn deleting_missing_category_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::DELETE, "/api/v1/categories/Nope", None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn category_names_with_spaces_round_trip_through_the_path() {
    let app = TestApp::new().await;
    assert_eq!(create_category(&app, "Body Parts").await.status(), 201);

    let response = app
        .request(Method::DELETE, "/api/v1/categories/Body%20Parts", None)
        .await;
    assert_eq!(response.status(), 204);
    assert!(category_names(&app).await.is_empty());
}
