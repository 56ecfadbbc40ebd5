use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::query::{OrderQuery, Page, ProductQuery};
use crate::record::{
    Order, OrderPatch, Product, ProductPatch, ProductStatus, Session, User, UserPatch,
};
use crate::store::MarketStore;
use crate::{Result, StoreError};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    products: Vec<Product>,
    orders: Vec<Order>,
    sessions: HashMap<String, Session>,
}

/// In-memory store implementation.
///
/// Backs the test suites and the default server configuration, and provides
/// the same interface and semantics as the PostgreSQL implementation.
/// Records are kept in insertion order; listings sort newest-created first
/// with insertion order as the stable tie-break.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.users.clear();
        inner.products.clear();
        inner.orders.clear();
        inner.sessions.clear();
    }
}

/// Word-level match: every search term must appear as a whole word in the
/// product's title or description, case-insensitively.
fn text_matches(search: &str, product: &Product) -> bool {
    let words: Vec<String> = product
        .title
        .split_whitespace()
        .chain(product.description.split_whitespace())
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .collect();

    search
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .all(|term| words.iter().any(|w| *w == term))
}

fn product_matches(query: &ProductQuery, product: &Product) -> bool {
    if product.status != ProductStatus::Active {
        return false;
    }
    if let Some(category) = &query.category
        && product.category != *category
    {
        return false;
    }
    if let Some(min) = query.min_price
        && product.price < min
    {
        return false;
    }
    if let Some(max) = query.max_price
        && product.price > max
    {
        return false;
    }
    if let Some(condition) = query.condition
        && product.condition != condition
    {
        return false;
    }
    if let Some(location) = &query.location {
        let matched = product
            .location
            .as_ref()
            .is_some_and(|l| l.to_lowercase().contains(&location.to_lowercase()));
        if !matched {
            return false;
        }
    }
    if let Some(search) = &query.search
        && !text_matches(search, product)
    {
        return false;
    }
    true
}

fn order_matches(query: &OrderQuery, order: &Order) -> bool {
    let party = if query.as_buyer {
        order.buyer_id
    } else {
        order.seller_id
    };
    if party != query.user {
        return false;
    }
    if let Some(status) = query.status
        && order.status != status
    {
        return false;
    }
    if let Some(payment_status) = query.payment_status
        && order.payment_status != payment_status
    {
        return false;
    }
    true
}

/// Sorts newest-created first and applies the pagination window.
///
/// Input must already be in newest-insertion-first order so that equal
/// timestamps keep a stable tail order.
fn paginate<T>(mut records: Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>, page: Page) -> Vec<T> {
    records.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    records
        .into_iter()
        .skip(page.skip.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if !patch.is_empty() {
            patch.apply_to(user);
            user.updated_at = Utc::now();
        }
        Ok(Some(user.clone()))
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.push(product.clone());
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn increment_product_views(&self, id: ProductId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(product) = inner.products.iter_mut().find(|p| p.id == id) {
            product.views += 1;
        }
        Ok(())
    }

    async fn query_products(&self, query: &ProductQuery, page: Page) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let matches: Vec<Product> = inner
            .products
            .iter()
            .rev()
            .filter(|p| product_matches(query, p))
            .cloned()
            .collect();
        Ok(paginate(matches, |p| p.created_at, page))
    }

    async fn products_by_seller(&self, seller: UserId, page: Page) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let matches: Vec<Product> = inner
            .products
            .iter()
            .rev()
            .filter(|p| p.seller_id == seller)
            .cloned()
            .collect();
        Ok(paginate(matches, |p| p.created_at, page))
    }

    async fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>> {
        let mut inner = self.inner.write().await;
        let Some(product) = inner
            .products
            .iter_mut()
            .find(|p| p.id == id && p.seller_id == owner)
        else {
            return Ok(None);
        };
        if !patch.is_empty() {
            patch.apply_to(product);
            product.updated_at = Utc::now();
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId, owner: UserId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.products.len();
        inner
            .products
            .retain(|p| !(p.id == id && p.seller_id == owner));
        Ok(inner.products.len() < before)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn query_orders(&self, query: &OrderQuery, page: Page) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let matches: Vec<Order> = inner
            .orders
            .iter()
            .rev()
            .filter(|o| order_matches(query, o))
            .cloned()
            .collect();
        Ok(paginate(matches, |o| o.created_at, page))
    }

    async fn update_order(
        &self,
        id: OrderId,
        seller: UserId,
        patch: &OrderPatch,
    ) -> Result<Option<Order>> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.seller_id == seller)
        else {
            return Ok(None);
        };
        if !patch.is_empty() {
            patch.apply_to(order);
            order.updated_at = Utc::now();
        }
        Ok(Some(order.clone()))
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn user(username: &str, email: &str) -> User {
        User {
            id: UserId::new(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            full_name: None,
            phone: None,
            address: None,
            profile_image: None,
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(seller: UserId, title: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(),
            title: title.to_string(),
            description: format!("{title} description"),
            price: Money::from_cents(cents),
            category: "misc".to_string(),
            condition: Default::default(),
            images: Vec::new(),
            seller_id: seller,
            status: ProductStatus::Active,
            location: None,
            tags: Vec::new(),
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_and_username_are_rejected() {
        let store = InMemoryStore::new();
        store.insert_user(&user("alice", "a@x.com")).await.unwrap();

        let err = store
            .insert_user(&user("alice2", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email" }));

        let err = store
            .insert_user(&user("alice", "a2@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "username" }));
    }

    #[tokio::test]
    async fn owner_mismatch_is_indistinguishable_from_missing_id() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let stranger = UserId::new();
        let listed = product(owner, "Bike", 10_000);
        store.insert_product(&listed).await.unwrap();

        let patch = ProductPatch {
            title: Some("Stolen Bike".to_string()),
            ..Default::default()
        };

        let wrong_owner = store
            .update_product(listed.id, stranger, &patch)
            .await
            .unwrap();
        let wrong_id = store
            .update_product(ProductId::new(), owner, &patch)
            .await
            .unwrap();
        assert_eq!(wrong_owner, wrong_id);
        assert!(wrong_owner.is_none());

        assert!(!store.delete_product(listed.id, stranger).await.unwrap());
        assert!(!store.delete_product(ProductId::new(), owner).await.unwrap());
        assert!(store.delete_product(listed.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_pages_are_disjoint() {
        let store = InMemoryStore::new();
        let seller = UserId::new();
        for i in 0..7 {
            let mut p = product(seller, &format!("Item {i}"), 1_000);
            p.created_at = Utc::now() + chrono::Duration::seconds(i);
            store.insert_product(&p).await.unwrap();
        }

        let first = store
            .query_products(&ProductQuery::default(), Page::new(0, 3))
            .await
            .unwrap();
        let second = store
            .query_products(&ProductQuery::default(), Page::new(3, 3))
            .await
            .unwrap();
        let third = store
            .query_products(&ProductQuery::default(), Page::new(6, 3))
            .await
            .unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first[0].title, "Item 6");
        assert_eq!(third.len(), 1);

        let mut seen: Vec<ProductId> = Vec::new();
        for page in [&first, &second, &third] {
            for p in page.iter() {
                assert!(!seen.contains(&p.id), "pages overlap");
                seen.push(p.id);
            }
        }
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn listing_hides_non_active_products() {
        let store = InMemoryStore::new();
        let seller = UserId::new();
        for status in [
            ProductStatus::Active,
            ProductStatus::Sold,
            ProductStatus::Draft,
            ProductStatus::Inactive,
        ] {
            let mut p = product(seller, &format!("{status} thing"), 1_000);
            p.status = status;
            store.insert_product(&p).await.unwrap();
        }

        let listed = store
            .query_products(&ProductQuery::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ProductStatus::Active);

        // The seller's own view has no status filter.
        let own = store
            .products_by_seller(seller, Page::default())
            .await
            .unwrap();
        assert_eq!(own.len(), 4);
    }

    #[tokio::test]
    async fn text_search_matches_whole_words() {
        let store = InMemoryStore::new();
        let seller = UserId::new();
        let mut bike = product(seller, "Mountain Bike", 10_000);
        bike.description = "Hardly used, great brakes.".to_string();
        store.insert_product(&bike).await.unwrap();
        store
            .insert_product(&product(seller, "Bicycle bell", 500))
            .await
            .unwrap();

        let query = ProductQuery {
            search: Some("bike".to_string()),
            ..Default::default()
        };
        let found = store.query_products(&query, Page::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Mountain Bike");

        // "bik" is not a word in either listing.
        let query = ProductQuery {
            search: Some("bik".to_string()),
            ..Default::default()
        };
        assert!(store
            .query_products(&query, Page::default())
            .await
            .unwrap()
            .is_empty());

        // Terms are ANDed.
        let query = ProductQuery {
            search: Some("mountain brakes".to_string()),
            ..Default::default()
        };
        assert_eq!(
            store
                .query_products(&query, Page::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn location_match_is_case_insensitive_substring() {
        let store = InMemoryStore::new();
        let seller = UserId::new();
        let mut p = product(seller, "Lamp", 2_000);
        p.location = Some("Portland, OR".to_string());
        store.insert_product(&p).await.unwrap();

        let query = ProductQuery {
            location: Some("portland".to_string()),
            ..Default::default()
        };
        assert_eq!(
            store
                .query_products(&query, Page::default())
                .await
                .unwrap()
                .len(),
            1
        );

        let query = ProductQuery {
            location: Some("seattle".to_string()),
            ..Default::default()
        };
        assert!(store
            .query_products(&query, Page::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn price_bounds_are_inclusive() {
        let store = InMemoryStore::new();
        let seller = UserId::new();
        store
            .insert_product(&product(seller, "Cheap", 1_000))
            .await
            .unwrap();
        store
            .insert_product(&product(seller, "Mid", 5_000))
            .await
            .unwrap();
        store
            .insert_product(&product(seller, "Dear", 9_000))
            .await
            .unwrap();

        let query = ProductQuery {
            min_price: Some(Money::from_cents(1_000)),
            max_price: Some(Money::from_cents(5_000)),
            ..Default::default()
        };
        let found = store.query_products(&query, Page::default()).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn empty_patch_does_not_bump_updated_at() {
        let store = InMemoryStore::new();
        let record = user("alice", "a@x.com");
        store.insert_user(&record).await.unwrap();

        let untouched = store
            .update_user(record.id, &UserPatch::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.updated_at, record.updated_at);

        let patch: UserPatch = serde_json::from_str(r#"{"full_name": "Alice"}"#).unwrap();
        let touched = store.update_user(record.id, &patch).await.unwrap().unwrap();
        assert!(touched.updated_at > record.updated_at);
    }

    #[tokio::test]
    async fn session_round_trip() {
        let store = InMemoryStore::new();
        let session = Session::open(UserId::new());
        store.insert_session(&session).await.unwrap();

        let found = store.find_session(&session.token).await.unwrap().unwrap();
        assert_eq!(found.user_id, session.user_id);
        assert!(store.find_session("missing").await.unwrap().is_none());
    }
}
