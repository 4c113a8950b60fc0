pub mod categories;
pub mod ledger;
pub mod products;
pub mod stock;

pub use categories::CategoryService;
pub use ledger::LedgerService;
pub use products::{InventorySummary, ProductInput, ProductService};
pub use stock::{QuantityChangeOutcome, StockService};
