use crate::{
    db::timed,
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    filters::ProductFilter,
    services::{
        categories::CategoryService,
        stock::{QuantityChangeOutcome, StockService},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Product fields accepted on create and full edit
#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Oil Filter")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "OF-100")]
    pub reference: String,
    /// Category label; created when it does not exist yet. Empty means none.
    #[serde(default)]
    pub category: String,
    #[validate(custom = "validate_buying_price")]
    #[schema(value_type = String, example = "8.90")]
    pub buying_price: Decimal,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub quantity: i32,
}

/// Largest price the `decimal(12, 2)` column holds
const MAX_BUYING_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

fn validate_buying_price(price: &Decimal) -> Result<(), ValidationError> {
    let message = if *price < Decimal::ZERO {
        "buying_price must be non-negative"
    } else if *price > MAX_BUYING_PRICE {
        "buying_price must not exceed 9999999999.99"
    } else if price.normalize().scale() > 2 {
        "buying_price must have at most 2 decimal places"
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("buying_price");
    err.message = Some(message.into());
    Err(err)
}

impl ProductInput {
    /// Trims the identifying fields and re-runs validation on the result
    fn normalized(mut self) -> Result<Self, ServiceError> {
        self.name = self.name.trim().to_string();
        self.reference = self.reference.trim().to_string();
        self.category = self.category.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Headline figures for the product table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventorySummary {
    /// Products in the store, ignoring the filter
    pub total_products: u64,
    /// Products matching the filter
    pub filtered_products: u64,
    /// Units on hand across the filtered products
    pub total_units: i64,
    /// Σ buying_price × quantity over the filtered products
    #[schema(value_type = String, example = "1234.50")]
    pub stock_value: Decimal,
    /// Products with quantity zero, ignoring the filter
    pub out_of_stock: u64,
}

impl InventorySummary {
    pub fn from_products(
        all: &[product::Model],
        filter: &ProductFilter,
    ) -> Result<Self, ServiceError> {
        let filtered: Vec<&product::Model> = all.iter().filter(|p| filter.matches(p)).collect();

        let stock_value = filtered.iter().try_fold(Decimal::ZERO, |total, p| {
            p.stock_value()
                .and_then(|value| total.checked_add(value))
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "stock value overflows at product {}",
                        p.id
                    ))
                })
        })?;

        Ok(Self {
            total_products: all.len() as u64,
            filtered_products: filtered.len() as u64,
            total_units: filtered.iter().map(|p| i64::from(p.quantity)).sum(),
            stock_value,
            out_of_stock: all.iter().filter(|p| p.is_out_of_stock()).count() as u64,
        })
    }
}

/// Product catalogue and quantity edits
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    categories: CategoryService,
    stock: StockService,
}

impl ProductService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        categories: CategoryService,
        stock: StockService,
    ) -> Self {
        Self {
            db,
            event_sender,
            categories,
            stock,
        }
    }

    /// All products, newest first
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        timed(
            "products.list",
            Product::find()
                .order_by_desc(product::Column::CreatedAt)
                .all(&*self.db),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn filter_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(filter.apply(self.list_products().await?))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        timed("products.get", Product::find_by_id(product_id).one(&*self.db))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    async fn ensure_unique_reference(
        &self,
        reference: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Reference.eq(reference));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        let existing = timed("products.count_by_reference", query.count(&*self.db)).await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "A product with reference \"{}\" already exists",
                reference
            )));
        }
        Ok(())
    }

    /// Adds a product. No stock movement is recorded for the opening quantity.
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        let input = input.normalized()?;
        self.ensure_unique_reference(&input.reference, None).await?;
        self.categories.ensure_category(&input.category).await?;

        let product_id = Uuid::new_v4();
        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name),
            description: Set(input.description),
            reference: Set(input.reference),
            category: Set(input.category),
            buying_price: Set(input.buying_price),
            quantity: Set(input.quantity),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let product = timed("products.insert", product.insert(&*self.db)).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!(%product_id, reference = %product.reference, "Created product");
        Ok(product)
    }

    /// Full edit. A quantity change goes through the stock bookkeeping using
    /// the edited name and reference.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: ProductInput,
    ) -> Result<QuantityChangeOutcome, ServiceError> {
        let input = input.normalized()?;
        let current = self.get_product(product_id).await?;
        self.ensure_unique_reference(&input.reference, Some(product_id))
            .await?;
        self.categories.ensure_category(&input.category).await?;

        let previous_quantity = current.quantity;
        let target = product::Model {
            name: input.name,
            description: input.description,
            reference: input.reference,
            category: input.category,
            buying_price: input.buying_price,
            quantity: input.quantity,
            ..current
        };

        let outcome = if target.quantity != previous_quantity {
            self.stock
                .apply_quantity_change(previous_quantity, target)
                .await?
        } else {
            let mut active: product::ActiveModel = target.into();
            active = active.reset_all();
            active.updated_at = Set(Utc::now());
            let product = timed("products.update", active.update(&*self.db)).await?;
            QuantityChangeOutcome {
                product,
                changed: false,
                movement: None,
                restock_action: Default::default(),
                restock_log: None,
            }
        };

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!(%product_id, quantity_changed = outcome.changed, "Updated product");
        Ok(outcome)
    }

    /// Quick quantity edit
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<QuantityChangeOutcome, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be non-negative".to_string(),
            ));
        }

        let current = self.get_product(product_id).await?;
        let previous_quantity = current.quantity;
        let target = product::Model {
            quantity,
            ..current
        };

        self.stock
            .apply_quantity_change(previous_quantity, target)
            .await
    }

    /// Quick restock: replaces the quantity with `quantity`, which must be positive
    #[instrument(skip(self))]
    pub async fn restock(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<QuantityChangeOutcome, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Restock quantity must be greater than zero".to_string(),
            ));
        }
        self.set_quantity(product_id, quantity).await
    }

    /// Products with no units on hand, newest first
    #[instrument(skip(self))]
    pub async fn out_of_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        timed(
            "products.out_of_stock",
            Product::find()
                .filter(product::Column::Quantity.eq(0))
                .order_by_desc(product::Column::CreatedAt)
                .all(&*self.db),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, filter: &ProductFilter) -> Result<InventorySummary, ServiceError> {
        let all = self.list_products().await?;
        InventorySummary::from_products(&all, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> ProductInput {
        ProductInput {
            name: "  Oil Filter ".into(),
            description: "Spin-on".into(),
            reference: " OF-100".into(),
            category: " Filters ".into(),
            buying_price: dec!(8.90),
            quantity: 4,
        }
    }

    #[test]
    fn normalized_trims_identifying_fields() {
        let normalized = input().normalized().unwrap();
        assert_eq!(normalized.name, "Oil Filter");
        assert_eq!(normalized.reference, "OF-100");
        assert_eq!(normalized.category, "Filters");
    }

    #[test]
    fn blank_name_or_reference_is_rejected() {
        let mut blank_name = input();
        blank_name.name = "   ".into();
        assert!(matches!(
            blank_name.normalized(),
            Err(ServiceError::ValidationError(_))
        ));

        let mut blank_reference = input();
        blank_reference.reference = String::new();
        assert!(blank_reference.normalized().is_err());
    }

    #[test]
    fn negative_price_and_quantity_are_rejected() {
        let mut negative_price = input();
        negative_price.buying_price = dec!(-0.01);
        assert!(negative_price.normalized().is_err());

        let mut negative_quantity = input();
        negative_quantity.quantity = -1;
        assert!(negative_quantity.normalized().is_err());

        let mut free = input();
        free.buying_price = Decimal::ZERO;
        assert!(free.normalized().is_ok());
    }

    #[test]
    fn price_is_bounded_by_the_column() {
        let mut at_max = input();
        at_max.buying_price = dec!(9999999999.99);
        assert!(at_max.normalized().is_ok());

        let mut too_large = input();
        too_large.buying_price = dec!(10000000000.00);
        assert!(matches!(
            too_large.normalized(),
            Err(ServiceError::ValidationError(_))
        ));

        let mut huge = input();
        huge.buying_price = Decimal::MAX;
        assert!(huge.normalized().is_err());

        let mut fine_grained = input();
        fine_grained.buying_price = dec!(1.005);
        assert!(fine_grained.normalized().is_err());

        let mut trailing_zeros = input();
        trailing_zeros.buying_price = dec!(1.5000);
        assert!(trailing_zeros.normalized().is_ok());
    }

    fn make(name: &str, category: &str, price: Decimal, quantity: i32) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            reference: format!("REF-{}", name),
            category: category.into(),
            buying_price: price,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn summary_reports_overflowing_stock_value_as_error() {
        let product_overflow = vec![make("Gold Bar", "Vault", Decimal::MAX, 2)];
        assert!(matches!(
            InventorySummary::from_products(&product_overflow, &ProductFilter::default()),
            Err(ServiceError::InternalError(_))
        ));

        let sum_overflow = vec![
            make("Gold Bar", "Vault", Decimal::MAX, 1),
            make("Silver Bar", "Vault", Decimal::MAX, 1),
        ];
        assert!(matches!(
            InventorySummary::from_products(&sum_overflow, &ProductFilter::default()),
            Err(ServiceError::InternalError(_))
        ));

        // Filtered-out rows do not contribute
        let summary = InventorySummary::from_products(
            &product_overflow,
            &ProductFilter::new(None, Some("Filters".into())),
        )
        .unwrap();
        assert_eq!(summary.stock_value, Decimal::ZERO);
    }

    #[test]
    fn summary_counts_filtered_and_unfiltered_sets() {
        let all = vec![
            make("Oil Filter", "Filters", dec!(8.90), 10),
            make("Air Filter", "Filters", dec!(12.50), 0),
            make("Brake Pad", "Brakes", dec!(30.00), 2),
        ];

        let summary =
            InventorySummary::from_products(&all, &ProductFilter::new(None, Some("Filters".into())))
                .unwrap();
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.filtered_products, 2);
        assert_eq!(summary.total_units, 10);
        assert_eq!(summary.stock_value, dec!(89.00));
        assert_eq!(summary.out_of_stock, 1);
    }
}
