use async_trait::async_trait;

use common::{OrderId, ProductId, UserId};

use crate::query::{OrderQuery, Page, ProductQuery};
use crate::record::{
    Order, OrderPatch, Product, ProductPatch, Session, User, UserPatch,
};
use crate::Result;

/// Core trait for marketplace document store implementations.
///
/// Every method is a single-record (or single-query) operation; nothing here
/// spans records transactionally. All implementations must be thread-safe
/// (`Send + Sync`), and any method may fail with
/// [`StoreError::Database`](crate::StoreError::Database) when the backing
/// store is unreachable — callers treat that as a retryable infrastructure
/// failure, distinct from domain outcomes.
///
/// Owner-scoped mutations (`update_product`, `delete_product`,
/// `update_order`) match on id AND owner in one predicate, so a wrong id
/// and a wrong owner are indistinguishable to the caller.
#[async_trait]
pub trait MarketStore: Send + Sync {
    // -- users --

    /// Inserts a new user.
    ///
    /// Fails with [`StoreError::Duplicate`](crate::StoreError::Duplicate)
    /// when the email or username is already taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Looks up a user by id.
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    /// Looks up a user by exact email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Looks up a user by exact username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Applies the present fields of `patch` to the user.
    ///
    /// Returns the updated record, or `None` if the id is unknown. An empty
    /// patch leaves the record — including `updated_at` — untouched.
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<Option<User>>;

    // -- products --

    /// Inserts a new product listing.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Looks up a product by id.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Increments a product's view counter by one.
    ///
    /// Missing products are ignored.
    async fn increment_product_views(&self, id: ProductId) -> Result<()>;

    /// Lists active products matching `query`, newest-created first.
    async fn query_products(&self, query: &ProductQuery, page: Page) -> Result<Vec<Product>>;

    /// Lists a seller's products regardless of status, newest-created first.
    async fn products_by_seller(&self, seller: UserId, page: Page) -> Result<Vec<Product>>;

    /// Applies `patch` to the product, but only when `owner` matches the
    /// recorded seller.
    ///
    /// Returns the updated record, or `None` when the id is unknown OR the
    /// owner does not match. A non-empty patch bumps `updated_at`.
    async fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>>;

    /// Deletes the product when `owner` matches the recorded seller.
    ///
    /// Returns true only if a record was removed.
    async fn delete_product(&self, id: ProductId, owner: UserId) -> Result<bool>;

    // -- orders --

    /// Inserts a new order.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Looks up an order by id.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders matching `query`, newest-created first.
    async fn query_orders(&self, query: &OrderQuery, page: Page) -> Result<Vec<Order>>;

    /// Applies `patch` to the order, but only when `seller` matches the
    /// recorded seller.
    ///
    /// Returns the updated record, or `None` when the id is unknown OR the
    /// seller does not match. A non-empty patch bumps `updated_at`.
    async fn update_order(
        &self,
        id: OrderId,
        seller: UserId,
        patch: &OrderPatch,
    ) -> Result<Option<Order>>;

    // -- sessions --

    /// Persists a login session.
    async fn insert_session(&self, session: &Session) -> Result<()>;

    /// Resolves a session token back to its session record.
    async fn find_session(&self, token: &str) -> Result<Option<Session>>;
}
