use crate::{
    db::timed,
    entities::{category, product, Category, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Message returned when a category still has products attached
pub fn category_in_use_message(name: &str, product_count: u64) -> String {
    format!(
        "Cannot delete category \"{}\" because {} product(s) are using it.",
        name, product_count
    )
}

/// Category taxonomy management
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// All categories ordered by name
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        timed(
            "categories.list",
            Category::find()
                .order_by_asc(category::Column::Name)
                .all(&*self.db),
        )
        .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<category::Model>, ServiceError> {
        timed(
            "categories.find_by_name",
            Category::find()
                .filter(category::Column::Name.eq(name))
                .one(&*self.db),
        )
        .await
    }

    async fn insert(&self, name: &str) -> Result<category::Model, ServiceError> {
        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        };
        let category = timed("categories.insert", category.insert(&*self.db)).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.name.clone()))
            .await;
        info!(category = %category.name, "Created category");
        Ok(category)
    }

    /// Creates a category; the name is trimmed and must be new
    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<category::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name is required".to_string(),
            ));
        }

        if self.find_by_name(name).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category \"{}\" already exists",
                name
            )));
        }

        self.insert(name).await
    }

    /// Returns the category with this label, creating it when missing.
    ///
    /// A blank label means "uncategorised" and yields `None`.
    #[instrument(skip(self))]
    pub async fn ensure_category(
        &self,
        name: &str,
    ) -> Result<Option<category::Model>, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(Some(existing));
        }

        match self.insert(name).await {
            Ok(created) => Ok(Some(created)),
            // Lost a race against a concurrent insert of the same name
            Err(e) => match self.find_by_name(name).await? {
                Some(existing) => {
                    warn!(category = %name, error = %e, "Category appeared concurrently");
                    Ok(Some(existing))
                }
                None => Err(e),
            },
        }
    }

    /// Deletes a category unless products still use it
    #[instrument(skip(self))]
    pub async fn delete_category(&self, name: &str) -> Result<(), ServiceError> {
        let category = self
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category \"{}\" not found", name)))?;

        let in_use = timed(
            "products.count_by_category",
            Product::find()
                .filter(product::Column::Category.eq(name))
                .count(&*self.db),
        )
        .await?;

        if in_use > 0 {
            warn!(category = %name, products = in_use, "Refusing to delete category in use");
            return Err(ServiceError::Conflict(category_in_use_message(name, in_use)));
        }

        timed("categories.delete", category.delete(&*self.db)).await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(name.to_string()))
            .await;
        info!(category = %name, "Deleted category");
        Ok(())
    }
}
