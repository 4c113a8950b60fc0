use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "0.1.0",
        description = r#"
# Stockroom Inventory API

Inventory backend for a small parts shop.

- **Products**: list, search, filter, add and edit products
- **Categories**: maintain the category taxonomy; categories in use cannot be deleted
- **Stock movements**: every quantity change is logged with before/after quantities
- **Restock logs**: out-of-stock episodes are opened at zero and closed on restock

## Quantity edits

A quantity edit appends a stock movement, opens a restock log when the product
runs out and closes the latest open one when it comes back. The writes are
separate statements and are not wrapped in a transaction.

## Error Handling

Failed requests return a JSON body:

```json
{
  "error": "Conflict",
  "message": "Cannot delete category \"Filters\" because 3 product(s) are using it.",
  "request_id": "0b6f...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Product catalogue and quantity edits"),
        (name = "Categories", description = "Category taxonomy"),
        (name = "Ledger", description = "Stock movement and restock logs")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::inventory_summary,
        crate::handlers::products::out_of_stock_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::set_quantity,
        crate::handlers::products::restock_product,

        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::delete_category,

        // Ledger
        crate::handlers::ledger::list_stock_movements,
        crate::handlers::ledger::list_restock_logs,
    ),
    components(
        schemas(
            crate::entities::product::Model,
            crate::entities::category::Model,
            crate::entities::stock_movement::Model,
            crate::entities::restock_log::Model,
            crate::services::ProductInput,
            crate::services::InventorySummary,
            crate::services::QuantityChangeOutcome,
            crate::stock_rules::RestockAction,
            crate::handlers::products::SetQuantityRequest,
            crate::handlers::products::RestockRequest,
            crate::handlers::categories::CreateCategoryRequest,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_inventory_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Stockroom API"));
        assert!(json.contains("/api/v1/products/{id}/restock"));
        assert!(json.contains("/api/v1/categories/{name}"));
        assert!(json.contains("/api/v1/restock-logs"));
    }
}
