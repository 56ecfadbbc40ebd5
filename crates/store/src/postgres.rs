use async_trait::async_trait;
use chrono::Utc;
use common::{Money, OrderId, ProductId, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::query::{OrderQuery, Page, ProductQuery};
use crate::record::{
    Order, OrderPatch, Product, ProductPatch, Session, User, UserPatch,
};
use crate::store::MarketStore;
use crate::{Result, StoreError};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::debug!("connecting to PostgreSQL");
        let pool = PgPool::connect(url).await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::debug!("running migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a unique-constraint violation to [`StoreError::Duplicate`], naming
/// the field from the violated constraint.
fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        let field = match db.constraint() {
            Some(c) if c.contains("email") => "email",
            Some(c) if c.contains("username") => "username",
            _ => "id",
        };
        return StoreError::Duplicate { field };
    }
    StoreError::Database(err)
}

fn row_to_user(row: PgRow) -> Result<User> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        profile_image: row.try_get("profile_image")?,
        is_active: row.try_get("is_active")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get::<i64, _>("price_cents")?),
        category: row.try_get("category")?,
        condition: row.try_get::<String, _>("condition")?.parse()?,
        images: row.try_get("images")?,
        seller_id: UserId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
        status: row.try_get::<String, _>("status")?.parse()?,
        location: row.try_get("location")?,
        tags: row.try_get("tags")?,
        views: row.try_get("views")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        buyer_id: UserId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
        seller_id: UserId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        total_price: Money::from_cents(row.try_get::<i64, _>("total_price_cents")?),
        status: row.try_get::<String, _>("status")?.parse()?,
        payment_status: row.try_get::<String, _>("payment_status")?.parse()?,
        shipping_address: row.try_get("shipping_address")?,
        buyer_notes: row.try_get("buyer_notes")?,
        seller_notes: row.try_get("seller_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_session(row: PgRow) -> Result<Session> {
    Ok(Session {
        token: row.try_get("token")?,
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MarketStore for PostgresStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, full_name, phone, address, \
             profile_image, is_active, is_verified, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.profile_image)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_user).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_user).transpose()
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<Option<User>> {
        if patch.is_empty() {
            return self.find_user(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(full_name) = &patch.full_name {
            qb.push(", full_name = ").push_bind(full_name.clone());
        }
        if let Some(phone) = &patch.phone {
            qb.push(", phone = ").push_bind(phone.clone());
        }
        if let Some(address) = &patch.address {
            qb.push(", address = ").push_bind(address.clone());
        }
        if let Some(profile_image) = &patch.profile_image {
            qb.push(", profile_image = ").push_bind(profile_image.clone());
        }
        qb.push(" WHERE id = ").push_bind(id.as_uuid());
        qb.push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.map(row_to_user).transpose()
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, title, description, price_cents, category, condition, \
             images, seller_id, status, location, tags, views, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.category)
        .bind(product.condition.as_str())
        .bind(&product.images)
        .bind(product.seller_id.as_uuid())
        .bind(product.status.as_str())
        .bind(&product.location)
        .bind(&product.tags)
        .bind(product.views)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_product).transpose()
    }

    async fn increment_product_views(&self, id: ProductId) -> Result<()> {
        sqlx::query("UPDATE products SET views = views + 1 WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_products(&self, query: &ProductQuery, page: Page) -> Result<Vec<Product>> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT * FROM products WHERE status = 'active'");
        if let Some(category) = &query.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(min) = query.min_price {
            qb.push(" AND price_cents >= ").push_bind(min.cents());
        }
        if let Some(max) = query.max_price {
            qb.push(" AND price_cents <= ").push_bind(max.cents());
        }
        if let Some(condition) = query.condition {
            qb.push(" AND condition = ").push_bind(condition.as_str());
        }
        if let Some(location) = &query.location {
            qb.push(" AND location ILIKE ")
                .push_bind(format!("%{location}%"));
        }
        if let Some(search) = &query.search {
            qb.push(
                " AND to_tsvector('english', title || ' ' || description) @@ \
                 plainto_tsquery('english', ",
            )
            .push_bind(search.clone())
            .push(")");
        }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn products_by_seller(&self, seller: UserId, page: Page) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT * FROM products WHERE seller_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(seller.as_uuid())
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>> {
        if patch.is_empty() {
            let row = sqlx::query("SELECT * FROM products WHERE id = $1 AND seller_id = $2")
                .bind(id.as_uuid())
                .bind(owner.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
            return row.map(row_to_product).transpose();
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(title) = &patch.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(price) = patch.price {
            qb.push(", price_cents = ").push_bind(price.cents());
        }
        if let Some(category) = &patch.category {
            qb.push(", category = ").push_bind(category.clone());
        }
        if let Some(condition) = patch.condition {
            qb.push(", condition = ").push_bind(condition.as_str());
        }
        if let Some(images) = &patch.images {
            qb.push(", images = ").push_bind(images.clone());
        }
        if let Some(location) = &patch.location {
            qb.push(", location = ").push_bind(location.clone());
        }
        if let Some(tags) = &patch.tags {
            qb.push(", tags = ").push_bind(tags.clone());
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        qb.push(" WHERE id = ").push_bind(id.as_uuid());
        qb.push(" AND seller_id = ").push_bind(owner.as_uuid());
        qb.push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.map(row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId, owner: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND seller_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, product_id, buyer_id, seller_id, quantity, \
             total_price_cents, status, payment_status, shipping_address, buyer_notes, \
             seller_notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(order.id.as_uuid())
        .bind(order.product_id.as_uuid())
        .bind(order.buyer_id.as_uuid())
        .bind(order.seller_id.as_uuid())
        .bind(order.quantity as i32)
        .bind(order.total_price.cents())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.shipping_address)
        .bind(&order.buyer_notes)
        .bind(&order.seller_notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_order).transpose()
    }

    async fn query_orders(&self, query: &OrderQuery, page: Page) -> Result<Vec<Order>> {
        let party = if query.as_buyer {
            "buyer_id"
        } else {
            "seller_id"
        };
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM orders WHERE {party} = "));
        qb.push_bind(query.user.as_uuid());
        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(payment_status) = query.payment_status {
            qb.push(" AND payment_status = ")
                .push_bind(payment_status.as_str());
        }
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn update_order(
        &self,
        id: OrderId,
        seller: UserId,
        patch: &OrderPatch,
    ) -> Result<Option<Order>> {
        if patch.is_empty() {
            let row = sqlx::query("SELECT * FROM orders WHERE id = $1 AND seller_id = $2")
                .bind(id.as_uuid())
                .bind(seller.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
            return row.map(row_to_order).transpose();
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE orders SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(payment_status) = patch.payment_status {
            qb.push(", payment_status = ")
                .push_bind(payment_status.as_str());
        }
        if let Some(seller_notes) = &patch.seller_notes {
            qb.push(", seller_notes = ").push_bind(seller_notes.clone());
        }
        qb.push(" WHERE id = ").push_bind(id.as_uuid());
        qb.push(" AND seller_id = ").push_bind(seller.as_uuid());
        qb.push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.map(row_to_order).transpose()
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id.as_uuid())
            .bind(session.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_session).transpose()
    }
}
