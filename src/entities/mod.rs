//! sea-orm entities for the four inventory tables.

pub mod category;
pub mod product;
pub mod restock_log;
pub mod stock_movement;

pub use category::Entity as Category;
pub use product::Entity as Product;
pub use restock_log::Entity as RestockLog;
pub use stock_movement::Entity as StockMovement;
