use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    filters::ProductFilter,
    services::{InventorySummary, ProductInput, QuantityChangeOutcome},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Body of the quick quantity edit
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct SetQuantityRequest {
    #[validate(range(min = 0))]
    #[schema(example = 12)]
    pub quantity: i32,
}

/// Body of the quick restock; the quantity replaces the current one
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RestockRequest {
    #[validate(range(min = 1))]
    #[schema(example = 24)]
    pub quantity: i32,
}

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/summary", get(inventory_summary))
        .route("/out-of-stock", get(out_of_stock_products))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/quantity", put(set_quantity))
        .route("/:id/restock", post(restock_product))
}

/// List products, newest first, optionally filtered
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Products retrieved", body = crate::ApiResponse<Vec<crate::entities::product::Model>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .filter_products(&filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Add a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = crate::ApiResponse<crate::entities::product::Model>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Reference already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create_product(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

/// Headline figures: product counts, units and stock value
#[utoipa::path(
    get,
    path = "/api/v1/products/summary",
    params(ProductFilter),
    responses(
        (status = 200, description = "Summary computed", body = crate::ApiResponse<InventorySummary>)
    ),
    tag = "Products"
)]
pub async fn inventory_summary(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .products
        .summary(&filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// Products with quantity zero
#[utoipa::path(
    get,
    path = "/api/v1/products/out-of-stock",
    responses(
        (status = 200, description = "Out-of-stock products", body = crate::ApiResponse<Vec<crate::entities::product::Model>>)
    ),
    tag = "Products"
)]
pub async fn out_of_stock_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .out_of_stock()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product retrieved", body = crate::ApiResponse<crate::entities::product::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// Full edit of a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = crate::ApiResponse<QuantityChangeOutcome>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Reference already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .products
        .update_product(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(outcome))
}

/// Quick quantity edit
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/quantity",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity applied; `changed` is false when it was already current", body = crate::ApiResponse<QuantityChangeOutcome>),
        (status = 400, description = "Negative quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .products
        .set_quantity(id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(outcome))
}

/// Quick restock
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/restock",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Product restocked", body = crate::ApiResponse<QuantityChangeOutcome>),
        (status = 400, description = "Quantity must be positive", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn restock_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .products
        .restock(id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(outcome))
}
