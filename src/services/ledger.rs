use crate::{
    db::timed,
    entities::{restock_log, stock_movement, RestockLog, StockMovement},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Read access to the stock movement and restock logs
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
}

impl LedgerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Stock movements, newest first, optionally for one product
    #[instrument(skip(self))]
    pub async fn stock_movements(
        &self,
        product_id: Option<Uuid>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let mut query = StockMovement::find();
        if let Some(id) = product_id {
            query = query.filter(stock_movement::Column::ProductId.eq(id));
        }

        timed(
            "stock_movements.list",
            query
                .order_by_desc(stock_movement::Column::CreatedAt)
                .all(&*self.db),
        )
        .await
    }

    /// Restock logs, newest first; `open_only` keeps the episodes not yet restocked
    #[instrument(skip(self))]
    pub async fn restock_logs(
        &self,
        product_id: Option<Uuid>,
        open_only: bool,
    ) -> Result<Vec<restock_log::Model>, ServiceError> {
        let mut query = RestockLog::find();
        if let Some(id) = product_id {
            query = query.filter(restock_log::Column::ProductId.eq(id));
        }
        if open_only {
            query = query.filter(restock_log::Column::Restocked.eq(false));
        }

        timed(
            "restock_logs.list",
            query
                .order_by_desc(restock_log::Column::CreatedAt)
                .all(&*self.db),
        )
        .await
    }
}
