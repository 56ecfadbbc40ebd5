//! Product catalog: listings, filtered queries, view counters.

use chrono::Utc;
use common::{Money, ProductId, UserId};
use store::{
    MarketStore, Page, Product, ProductCondition, ProductPatch, ProductQuery, ProductStatus,
};

use crate::error::DomainError;

/// Input for creating a product listing.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub condition: ProductCondition,
    pub images: Vec<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
}

/// Service for product listings.
///
/// Every mutation is owner-scoped: a wrong id and a wrong owner are both
/// reported as "not found" so callers cannot probe for other users'
/// listings.
pub struct ProductCatalog<S> {
    store: S,
}

impl<S: MarketStore> ProductCatalog<S> {
    /// Creates a new catalog over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a listing owned by `seller`, active with zero views.
    #[tracing::instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: NewProduct, seller: UserId) -> Result<Product, DomainError> {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            title: input.title,
            description: input.description,
            price: input.price,
            category: input.category,
            condition: input.condition,
            images: input.images,
            seller_id: seller,
            status: ProductStatus::Active,
            location: input.location,
            tags: input.tags,
            views: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_product(&product).await?;
        metrics::counter!("products_created_total").increment(1);
        Ok(product)
    }

    /// Fetches a product and counts the read.
    ///
    /// The returned record reflects the pre-increment view count; the
    /// counter bump lands after the read, not atomically with it.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, DomainError> {
        let Some(product) = self.store.find_product(id).await? else {
            return Ok(None);
        };
        self.store.increment_product_views(id).await?;
        metrics::counter!("product_views_total").increment(1);
        Ok(Some(product))
    }

    /// Fetches a product without counting a view.
    ///
    /// Used for eligibility checks and read-time joins, which are not
    /// product reads from the buyer's point of view.
    pub async fn peek(&self, id: ProductId) -> Result<Option<Product>, DomainError> {
        Ok(self.store.find_product(id).await?)
    }

    /// Lists active products matching `query`, newest first.
    pub async fn list(&self, query: &ProductQuery, page: Page) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.query_products(query, page).await?)
    }

    /// Lists a seller's own products regardless of status, newest first.
    pub async fn list_by_seller(
        &self,
        seller: UserId,
        page: Page,
    ) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.products_by_seller(seller, page).await?)
    }

    /// Applies `patch` when `requester` owns the product.
    ///
    /// Returns `None` for an unknown id or a non-owner alike.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        requester: UserId,
    ) -> Result<Option<Product>, DomainError> {
        Ok(self.store.update_product(id, requester, patch).await?)
    }

    /// Deletes the product when `requester` owns it.
    ///
    /// Returns true only if a record owned by `requester` was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId, requester: UserId) -> Result<bool, DomainError> {
        Ok(self.store.delete_product(id, requester).await?)
    }
}
