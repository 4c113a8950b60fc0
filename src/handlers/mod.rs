pub mod categories;
pub mod common;
pub mod ledger;
pub mod products;

use crate::config::StockWriteOrder;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{CategoryService, LedgerService, ProductService, StockService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub categories: Arc<CategoryService>,
    pub ledger: Arc<LedgerService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        write_order: StockWriteOrder,
    ) -> Self {
        let categories = CategoryService::new(db_pool.clone(), event_sender.clone());
        let stock = StockService::new(db_pool.clone(), event_sender.clone(), write_order);
        let products = ProductService::new(
            db_pool.clone(),
            event_sender,
            categories.clone(),
            stock,
        );

        Self {
            products: Arc::new(products),
            categories: Arc::new(categories),
            ledger: Arc::new(LedgerService::new(db_pool)),
        }
    }
}
