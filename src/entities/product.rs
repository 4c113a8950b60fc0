use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Product entity
///
/// `category` holds the category *name*; it is not a foreign key and may be
/// empty for uncategorised products.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "products")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Unique human-readable product code
    #[sea_orm(unique)]
    pub reference: String,

    pub category: String,

    #[schema(value_type = String, example = "12.50")]
    pub buying_price: Decimal,

    pub quantity: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    StockMovements,
    #[sea_orm(has_many = "super::restock_log::Entity")]
    RestockLogs,
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl Related<super::restock_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RestockLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// Value of the units on hand at buying price; `None` on overflow
    pub fn stock_value(&self) -> Option<Decimal> {
        self.buying_price.checked_mul(Decimal::from(self.quantity))
    }
}
