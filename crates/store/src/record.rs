//! Entity records, status enumerations, and partial-update patches.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Lifecycle status of a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Listed and purchasable.
    #[default]
    Active,
    /// Sold and no longer purchasable.
    Sold,
    /// Not yet published by the seller.
    Draft,
    /// Withdrawn by the seller.
    Inactive,
}

impl ProductStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Sold => "sold",
            ProductStatus::Draft => "draft",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "sold" => Ok(ProductStatus::Sold),
            "draft" => Ok(ProductStatus::Draft),
            "inactive" => Ok(ProductStatus::Inactive),
            other => Err(StoreError::UnknownEnum {
                what: "product status",
                value: other.to_string(),
            }),
        }
    }
}

/// Physical condition of a listed product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    New,
    LikeNew,
    #[default]
    Good,
    Fair,
    Poor,
}

impl ProductCondition {
    /// Returns the wire name of the condition.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCondition::New => "new",
            ProductCondition::LikeNew => "like_new",
            ProductCondition::Good => "good",
            ProductCondition::Fair => "fair",
            ProductCondition::Poor => "poor",
        }
    }
}

impl std::fmt::Display for ProductCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProductCondition {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ProductCondition::New),
            "like_new" => Ok(ProductCondition::LikeNew),
            "good" => Ok(ProductCondition::Good),
            "fair" => Ok(ProductCondition::Fair),
            "poor" => Ok(ProductCondition::Poor),
            other => Err(StoreError::UnknownEnum {
                what: "product condition",
                value: other.to_string(),
            }),
        }
    }
}

/// Fulfillment status of an order.
///
/// The sketched lifecycle is:
/// ```text
/// pending ──► confirmed ──► shipped ──► delivered
///    │            │
///    └────────────┴──► cancelled        any ──► refunded
/// ```
/// Transition legality is advisory only (see [`OrderStatus::can_transition_to`]);
/// the write path lets the seller set any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Returns true if `next` is a step of the sketched lifecycle.
    ///
    /// Advisory only: no write path currently rejects a transition, so a
    /// seller may move an order to any status. Whether to enforce this
    /// table is an open product decision.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if next == Refunded {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(StoreError::UnknownEnum {
                what: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// Payment status label on an order.
///
/// A label only; there is no integration with a payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(StoreError::UnknownEnum {
                what: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

/// A registered user account.
///
/// `password_hash` is the argon2 PHC string, never the plaintext. Email and
/// username are globally unique (enforced by the store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product listing.
///
/// `seller_id` is immutable after creation; `views` only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub condition: ProductCondition,
    pub images: Vec<String>,
    pub seller_id: UserId,
    pub status: ProductStatus,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order between a buyer and a product's seller.
///
/// `seller_id` and `total_price` are snapshots taken at creation time and
/// are never recomputed from the product afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub quantity: u32,
    pub total_price: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: String,
    pub buyer_notes: Option<String>,
    pub seller_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An opaque login session token resolved back to a user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Opens a new session for a user with a freshly generated token.
    pub fn open(user_id: UserId) -> Self {
        Self {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Deserializes a field that was present in the payload, keeping an explicit
/// `null` distinct from an absent field.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Partial update of a user's profile fields.
///
/// Outer `Option` is payload presence, inner is the new value: an absent
/// field is left untouched while an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default, deserialize_with = "present")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub profile_image: Option<Option<String>>,
}

impl UserPatch {
    /// Returns true if no field is present in the patch.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.profile_image.is_none()
    }

    /// Applies the present fields to a user record.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.full_name {
            user.full_name = v.clone();
        }
        if let Some(v) = &self.phone {
            user.phone = v.clone();
        }
        if let Some(v) = &self.address {
            user.address = v.clone();
        }
        if let Some(v) = &self.profile_image {
            user.profile_image = v.clone();
        }
    }
}

/// Partial update of a product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub condition: Option<ProductCondition>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
}

impl ProductPatch {
    /// Returns true if no field is present in the patch.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.condition.is_none()
            && self.images.is_none()
            && self.location.is_none()
            && self.tags.is_none()
            && self.status.is_none()
    }

    /// Applies the present fields to a product record.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(v) = &self.title {
            product.title = v.clone();
        }
        if let Some(v) = &self.description {
            product.description = v.clone();
        }
        if let Some(v) = self.price {
            product.price = v;
        }
        if let Some(v) = &self.category {
            product.category = v.clone();
        }
        if let Some(v) = self.condition {
            product.condition = v;
        }
        if let Some(v) = &self.images {
            product.images = v.clone();
        }
        if let Some(v) = &self.location {
            product.location = v.clone();
        }
        if let Some(v) = &self.tags {
            product.tags = v.clone();
        }
        if let Some(v) = self.status {
            product.status = v;
        }
    }
}

/// Partial update of an order, restricted to the seller-editable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "present")]
    pub seller_notes: Option<Option<String>>,
}

impl OrderPatch {
    /// Returns true if no field is present in the patch.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none() && self.seller_notes.is_none()
    }

    /// Applies the present fields to an order record.
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(v) = self.status {
            order.status = v;
        }
        if let Some(v) = self.payment_status {
            order.payment_status = v;
        }
        if let Some(v) = &self.seller_notes {
            order.seller_notes = v.clone();
        }
    }
}
