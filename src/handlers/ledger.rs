use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockMovementQuery {
    /// Only movements of this product
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RestockLogQuery {
    /// Only logs of this product
    pub product_id: Option<Uuid>,
    /// Only episodes not yet restocked
    #[serde(default)]
    pub open_only: bool,
}

pub fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/stock-movements", get(list_stock_movements))
        .route("/restock-logs", get(list_restock_logs))
}

/// Stock movement log, newest first
#[utoipa::path(
    get,
    path = "/api/v1/stock-movements",
    params(StockMovementQuery),
    responses(
        (status = 200, description = "Stock movements", body = crate::ApiResponse<Vec<crate::entities::stock_movement::Model>>)
    ),
    tag = "Ledger"
)]
pub async fn list_stock_movements(
    State(state): State<AppState>,
    Query(query): Query<StockMovementQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = state
        .services
        .ledger
        .stock_movements(query.product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(movements))
}

/// Restock log, newest first
#[utoipa::path(
    get,
    path = "/api/v1/restock-logs",
    params(RestockLogQuery),
    responses(
        (status = 200, description = "Restock logs", body = crate::ApiResponse<Vec<crate::entities::restock_log::Model>>)
    ),
    tag = "Ledger"
)]
pub async fn list_restock_logs(
    State(state): State<AppState>,
    Query(query): Query<RestockLogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = state
        .services
        .ledger
        .restock_logs(query.product_id, query.open_only)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(logs))
}
