use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain events raised by the inventory services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    StockMoved {
        product_id: Uuid,
        previous_quantity: i32,
        new_quantity: i32,
    },
    WentOutOfStock {
        product_id: Uuid,
        restock_log_id: Uuid,
    },
    Restocked {
        product_id: Uuid,
        restock_log_id: Uuid,
        quantity: i32,
    },
    CategoryCreated(String),
    CategoryDeleted(String),
}

impl Event {
    /// Short stable name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ProductCreated(_) => "product_created",
            Event::ProductUpdated(_) => "product_updated",
            Event::StockMoved { .. } => "stock_moved",
            Event::WentOutOfStock { .. } => "went_out_of_stock",
            Event::Restocked { .. } => "restocked",
            Event::CategoryCreated(_) => "category_created",
            Event::CategoryDeleted(_) => "category_deleted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event without blocking the caller; a full or closed channel
    /// is logged and the event dropped.
    pub async fn send_or_log(&self, event: Event) {
        let kind = event.kind();
        if let Err(e) = self.sender.try_send(event) {
            warn!(event = kind, error = %e, "Dropping domain event");
        }
    }
}

/// Drains the event channel until every sender is gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::WentOutOfStock { product_id, .. } => {
                info!(event = event.kind(), %product_id, "Product went out of stock");
            }
            Event::Restocked {
                product_id,
                quantity,
                ..
            } => {
                info!(event = event.kind(), %product_id, quantity, "Product restocked");
            }
            Event::CategoryDeleted(name) => {
                info!(event = event.kind(), category = %name, "Category deleted");
            }
            other => {
                debug!(event = other.kind(), payload = ?other, "Event received");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_drops_when_channel_is_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);

        sender.send_or_log(Event::CategoryCreated("Filters".into())).await;
        sender.send_or_log(Event::CategoryCreated("Brakes".into())).await;

        assert_eq!(rx.recv().await, Some(Event::CategoryCreated("Filters".into())));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn process_events_returns_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send_or_log(Event::StockMoved {
                product_id: Uuid::new_v4(),
                previous_quantity: 1,
                new_quantity: 0,
            })
            .await;
        drop(sender);
        process_events(rx).await;
    }
}
