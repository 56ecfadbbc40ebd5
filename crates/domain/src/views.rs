//! Read-time joins into response-shaped aggregates.

use common::{Money, ProductId, UserId};
use serde::Serialize;
use store::{MarketStore, Order, Product, User};

use crate::catalog::ProductCatalog;
use crate::directory::UserDirectory;
use crate::error::DomainError;

/// Public subset of a user, embedded in enriched views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub full_name: Option<String>,
    pub profile_image: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            profile_image: user.profile_image,
        }
    }
}

/// Public subset of a product, embedded in enriched order views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: Money,
    pub images: Vec<String>,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            images: product.images,
        }
    }
}

/// An order together with summaries of its product, buyer, and seller.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub product_info: Option<ProductSummary>,
    pub buyer_info: Option<UserSummary>,
    pub seller_info: Option<UserSummary>,
}

/// A product together with a summary of its seller.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub seller_info: Option<UserSummary>,
}

/// Assembles enriched views by joining referenced records at read time.
///
/// Enrichment is best-effort: each lookup is independent, and a reference
/// whose record has gone missing leaves its summary empty instead of
/// failing the composition. The joined records are read individually, so a
/// view may mix slightly stale data under concurrent writes.
pub struct ViewComposer<S> {
    catalog: ProductCatalog<S>,
    directory: UserDirectory<S>,
}

impl<S: MarketStore + Clone> ViewComposer<S> {
    /// Creates a new composer over the given store.
    pub fn new(store: S) -> Self {
        Self {
            catalog: ProductCatalog::new(store.clone()),
            directory: UserDirectory::new(store),
        }
    }

    /// Joins an order with its product, buyer, and seller summaries.
    pub async fn order_view(&self, order: Order) -> Result<OrderView, DomainError> {
        let product_info = self
            .catalog
            .peek(order.product_id)
            .await?
            .map(ProductSummary::from);
        let buyer_info = self
            .directory
            .get_by_id(order.buyer_id)
            .await?
            .map(UserSummary::from);
        let seller_info = self
            .directory
            .get_by_id(order.seller_id)
            .await?
            .map(UserSummary::from);
        Ok(OrderView {
            order,
            product_info,
            buyer_info,
            seller_info,
        })
    }

    /// Joins a product with its seller summary.
    pub async fn product_view(&self, product: Product) -> Result<ProductView, DomainError> {
        let seller_info = self
            .directory
            .get_by_id(product.seller_id)
            .await?
            .map(UserSummary::from);
        Ok(ProductView {
            product,
            seller_info,
        })
    }
}
