use crate::{
    config::StockWriteOrder,
    db::timed,
    entities::{product, restock_log, stock_movement, RestockLog},
    errors::ServiceError,
    events::{Event, EventSender},
    stock_rules::{self, MovementDraft, QuantityChangePlan, RestockAction, WriteStep},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Result of applying a quantity edit
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct QuantityChangeOutcome {
    /// Product as stored after the edit
    pub product: product::Model,
    /// False when the new quantity equalled the stored one
    pub changed: bool,
    pub movement: Option<stock_movement::Model>,
    pub restock_action: RestockAction,
    /// Restock log opened or closed by this edit
    pub restock_log: Option<restock_log::Model>,
}

impl QuantityChangeOutcome {
    fn unchanged(product: product::Model) -> Self {
        Self {
            product,
            changed: false,
            movement: None,
            restock_action: RestockAction::None,
            restock_log: None,
        }
    }
}

/// Applies quantity edits: movement log, restock bookkeeping and product write.
///
/// The writes are separate statements with no enclosing transaction. A failure
/// part-way leaves the earlier writes in place; the applied steps are logged.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    write_order: StockWriteOrder,
}

impl StockService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        write_order: StockWriteOrder,
    ) -> Self {
        Self {
            db,
            event_sender,
            write_order,
        }
    }

    /// Moves a product from `previous_quantity` to `target.quantity`.
    ///
    /// `target` is the full product row to persist; its name and reference are
    /// the ones snapshotted into the logs. When the quantity is unchanged
    /// nothing is written and `target` is returned as is.
    #[instrument(skip(self, target), fields(product_id = %target.id, new_quantity = target.quantity))]
    pub async fn apply_quantity_change(
        &self,
        previous_quantity: i32,
        target: product::Model,
    ) -> Result<QuantityChangeOutcome, ServiceError> {
        let plan = stock_rules::evaluate(previous_quantity, target.quantity)?;
        let Some(draft) = plan.movement else {
            debug!("Quantity unchanged; nothing to record");
            return Ok(QuantityChangeOutcome::unchanged(target));
        };

        let now = Utc::now();
        let mut applied: Vec<WriteStep> = Vec::with_capacity(3);
        let mut movement = None;
        let mut restock_log = None;
        let mut saved = None;

        for step in WriteStep::sequence(self.write_order) {
            let result = match step {
                WriteStep::RecordMovement => self
                    .record_movement(&target, draft, now)
                    .await
                    .map(|m| movement = Some(m)),
                WriteStep::RestockBookkeeping => self
                    .restock_bookkeeping(&target, &plan, now)
                    .await
                    .map(|log| restock_log = log),
                WriteStep::UpdateProduct => self
                    .persist_product(&target, now)
                    .await
                    .map(|p| saved = Some(p)),
            };

            if let Err(e) = result {
                error!(
                    failed_step = %step,
                    applied_steps = ?applied,
                    write_order = %self.write_order,
                    error = %e,
                    "Quantity change partially applied"
                );
                return Err(e);
            }
            applied.push(step);
        }

        let product = saved.ok_or_else(|| {
            ServiceError::InternalError("Product write step did not run".to_string())
        })?;

        self.publish(&product, draft, plan.restock, restock_log.as_ref())
            .await;

        info!(
            previous_quantity,
            new_quantity = product.quantity,
            restock = %plan.restock,
            "Quantity change applied"
        );

        Ok(QuantityChangeOutcome {
            product,
            changed: true,
            movement,
            restock_action: plan.restock,
            restock_log,
        })
    }

    async fn record_movement(
        &self,
        target: &product::Model,
        draft: MovementDraft,
        now: DateTime<Utc>,
    ) -> Result<stock_movement::Model, ServiceError> {
        let movement = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(target.id),
            product_name: Set(target.name.clone()),
            product_reference: Set(target.reference.clone()),
            previous_quantity: Set(draft.previous_quantity),
            new_quantity: Set(draft.new_quantity),
            change: Set(draft.change),
            created_at: Set(now),
        };

        let movement = timed("stock_movements.insert", movement.insert(&*self.db)).await?;
        counter!("stockroom.stock_movements.recorded", 1);
        Ok(movement)
    }

    async fn restock_bookkeeping(
        &self,
        target: &product::Model,
        plan: &QuantityChangePlan,
        now: DateTime<Utc>,
    ) -> Result<Option<restock_log::Model>, ServiceError> {
        match plan.restock {
            RestockAction::None => Ok(None),
            RestockAction::Open => self.open_restock_log(target, now).await.map(Some),
            RestockAction::Close { restock_quantity } => {
                self.close_latest_restock_log(target.id, restock_quantity, now)
                    .await
            }
        }
    }

    async fn open_restock_log(
        &self,
        target: &product::Model,
        now: DateTime<Utc>,
    ) -> Result<restock_log::Model, ServiceError> {
        let log = restock_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(target.id),
            product_name: Set(target.name.clone()),
            product_reference: Set(target.reference.clone()),
            out_of_stock_date: Set(now),
            restocked: Set(false),
            restock_date: Set(None),
            restock_quantity: Set(None),
            created_at: Set(now),
        };

        let log = timed("restock_logs.insert", log.insert(&*self.db)).await?;
        counter!("stockroom.restock.opened", 1);
        Ok(log)
    }

    /// Closes the most recent open restock log of the product, if there is one.
    async fn close_latest_restock_log(
        &self,
        product_id: Uuid,
        restock_quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<restock_log::Model>, ServiceError> {
        let open = timed(
            "restock_logs.find_open",
            RestockLog::find()
                .filter(restock_log::Column::ProductId.eq(product_id))
                .filter(restock_log::Column::Restocked.eq(false))
                .order_by_desc(restock_log::Column::OutOfStockDate)
                .order_by_desc(restock_log::Column::CreatedAt)
                .one(&*self.db),
        )
        .await?;

        let Some(open) = open else {
            debug!(%product_id, "No open restock log to close");
            return Ok(None);
        };

        let mut active: restock_log::ActiveModel = open.into();
        active.restocked = Set(true);
        active.restock_date = Set(Some(now));
        active.restock_quantity = Set(Some(restock_quantity));

        let closed = timed("restock_logs.close", active.update(&*self.db)).await?;
        counter!("stockroom.restock.closed", 1);
        Ok(Some(closed))
    }

    async fn persist_product(
        &self,
        target: &product::Model,
        now: DateTime<Utc>,
    ) -> Result<product::Model, ServiceError> {
        let mut active: product::ActiveModel = target.clone().into();
        active = active.reset_all();
        active.updated_at = Set(now);

        timed("products.update", active.update(&*self.db)).await
    }

    async fn publish(
        &self,
        product: &product::Model,
        draft: MovementDraft,
        action: RestockAction,
        restock_log: Option<&restock_log::Model>,
    ) {
        self.event_sender
            .send_or_log(Event::StockMoved {
                product_id: product.id,
                previous_quantity: draft.previous_quantity,
                new_quantity: draft.new_quantity,
            })
            .await;

        let Some(log) = restock_log else {
            return;
        };
        let event = match action {
            RestockAction::Open => Event::WentOutOfStock {
                product_id: product.id,
                restock_log_id: log.id,
            },
            RestockAction::Close { restock_quantity } => Event::Restocked {
                product_id: product.id,
                restock_log_id: log.id,
                quantity: restock_quantity,
            },
            RestockAction::None => return,
        };
        self.event_sender.send_or_log(event).await;
    }
}
