//! Quantity-change bookkeeping rule.
//!
//! [`evaluate`] decides which log records a quantity edit produces. It never
//! touches the store; [`crate::services::stock::StockService`] executes the
//! resulting [`QuantityChangePlan`] in the configured [`StockWriteOrder`].

use crate::config::StockWriteOrder;
use crate::errors::ServiceError;
use serde::Serialize;
use strum::Display;
use utoipa::ToSchema;

/// Quantities of the stock movement to append
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct MovementDraft {
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub change: i32,
}

/// What happens to the product's out-of-stock episode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case", tag = "action")]
#[strum(serialize_all = "snake_case")]
pub enum RestockAction {
    #[default]
    None,
    /// Quantity dropped to zero
    Open,
    /// Quantity came back from zero; closes the most recent open episode
    Close { restock_quantity: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct QuantityChangePlan {
    pub movement: Option<MovementDraft>,
    pub restock: RestockAction,
}

impl QuantityChangePlan {
    /// True when the edit leaves the quantity untouched
    pub fn is_noop(&self) -> bool {
        self.movement.is_none()
    }
}

/// One of the separate writes a quantity change performs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum WriteStep {
    RecordMovement,
    RestockBookkeeping,
    UpdateProduct,
}

impl WriteStep {
    /// Write sequence for the given order
    pub fn sequence(order: StockWriteOrder) -> [WriteStep; 3] {
        match order {
            StockWriteOrder::LogsFirst => [
                WriteStep::RecordMovement,
                WriteStep::RestockBookkeeping,
                WriteStep::UpdateProduct,
            ],
            StockWriteOrder::ProductFirst => [
                WriteStep::RecordMovement,
                WriteStep::UpdateProduct,
                WriteStep::RestockBookkeeping,
            ],
        }
    }
}

/// Evaluates a quantity edit from `previous` to `new`.
///
/// # Errors
/// `InvalidInput` if either quantity is negative.
pub fn evaluate(previous: i32, new: i32) -> Result<QuantityChangePlan, ServiceError> {
    if previous < 0 || new < 0 {
        return Err(ServiceError::InvalidInput(format!(
            "Quantities must be non-negative (previous {}, new {})",
            previous, new
        )));
    }

    if previous == new {
        return Ok(QuantityChangePlan {
            movement: None,
            restock: RestockAction::None,
        });
    }

    let movement = MovementDraft {
        previous_quantity: previous,
        new_quantity: new,
        change: new - previous,
    };

    let restock = if previous == 0 {
        RestockAction::Close {
            restock_quantity: new,
        }
    } else if new == 0 {
        RestockAction::Open
    } else {
        RestockAction::None
    };

    Ok(QuantityChangePlan {
        movement: Some(movement),
        restock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[test]
    fn unchanged_quantity_is_a_noop() {
        let plan = evaluate(4, 4).unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.restock, RestockAction::None);

        let plan = evaluate(0, 0).unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.restock, RestockAction::None);
    }

    #[rstest]
    #[case(3, 7, 4, RestockAction::None)]
    #[case(7, 3, -4, RestockAction::None)]
    #[case(5, 0, -5, RestockAction::Open)]
    #[case(0, 5, 5, RestockAction::Close { restock_quantity: 5 })]
    fn movement_and_restock_action(
        #[case] previous: i32,
        #[case] new: i32,
        #[case] change: i32,
        #[case] restock: RestockAction,
    ) {
        let plan = evaluate(previous, new).unwrap();
        let movement = plan.movement.expect("movement");
        assert_eq!(movement.previous_quantity, previous);
        assert_eq!(movement.new_quantity, new);
        assert_eq!(movement.change, change);
        assert_eq!(plan.restock, restock);
    }

    #[test]
    fn negative_quantities_are_rejected() {
        assert_matches!(evaluate(-1, 2), Err(ServiceError::InvalidInput(_)));
        assert_matches!(evaluate(2, -1), Err(ServiceError::InvalidInput(_)));
    }

    #[test]
    fn write_sequences_differ_only_in_product_position() {
        let logs_first = WriteStep::sequence(StockWriteOrder::LogsFirst);
        let product_first = WriteStep::sequence(StockWriteOrder::ProductFirst);
        assert_eq!(logs_first[0], WriteStep::RecordMovement);
        assert_eq!(product_first[0], WriteStep::RecordMovement);
        assert_eq!(logs_first[2], WriteStep::UpdateProduct);
        assert_eq!(product_first[1], WriteStep::UpdateProduct);
        assert_eq!(WriteStep::RestockBookkeeping.to_string(), "restock_bookkeeping");
    }
}
