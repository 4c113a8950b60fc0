use crate::entities::product;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Category value meaning "no category restriction"
pub const ALL_CATEGORIES: &str = "all";

/// In-memory product filter applied to the product list
#[derive(Clone, Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Case-insensitive substring over name, description and reference
    pub search: Option<String>,
    /// Exact category label; empty or "all" disables the predicate
    pub category: Option<String>,
}

impl ProductFilter {
    pub fn new(search: Option<String>, category: Option<String>) -> Self {
        Self { search, category }
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn category_predicate(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }

    /// True when neither predicate restricts the list
    pub fn is_empty(&self) -> bool {
        self.search_needle().is_none() && self.category_predicate().is_none()
    }

    pub fn matches(&self, product: &product::Model) -> bool {
        let search_ok = match self.search_needle() {
            None => true,
            Some(needle) => [&product.name, &product.description, &product.reference]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle)),
        };

        let category_ok = match self.category_predicate() {
            None => true,
            Some(category) => product.category == category,
        };

        search_ok && category_ok
    }

    /// Keeps the products matching both predicates, preserving order
    pub fn apply(&self, products: Vec<product::Model>) -> Vec<product::Model> {
        if self.is_empty() {
            return products;
        }
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}
