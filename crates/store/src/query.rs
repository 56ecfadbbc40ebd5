//! Query and pagination types for store reads.

use common::{Money, UserId};

use crate::record::{OrderStatus, PaymentStatus, ProductCondition};

/// Skip/limit pagination window.
///
/// Bounds (`skip >= 0`, `limit` in `1..=100`) are enforced at the HTTP
/// boundary, not here; the store applies the window as given.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Filter over the public product listing.
///
/// All predicates are optional and ANDed together; the listing itself is
/// always restricted to active products.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Exact category match.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Money>,
    /// Inclusive upper price bound.
    pub max_price: Option<Money>,
    /// Exact condition match.
    pub condition: Option<ProductCondition>,
    /// Case-insensitive substring match on the location field.
    pub location: Option<String>,
    /// Word-level text search over title and description.
    pub search: Option<String>,
}

/// Filter over a user's orders, from either side of the transaction.
#[derive(Debug, Clone)]
pub struct OrderQuery {
    /// The user whose orders are listed.
    pub user: UserId,
    /// When true, match `buyer_id`; otherwise match `seller_id`.
    pub as_buyer: bool,
    /// Exact order status match.
    pub status: Option<OrderStatus>,
    /// Exact payment status match.
    pub payment_status: Option<PaymentStatus>,
}

impl OrderQuery {
    /// Builds a filter over `user`'s purchases.
    pub fn purchases(user: UserId) -> Self {
        Self {
            user,
            as_buyer: true,
            status: None,
            payment_status: None,
        }
    }

    /// Builds a filter over `user`'s sales.
    pub fn sales(user: UserId) -> Self {
        Self {
            user,
            as_buyer: false,
            status: None,
            payment_status: None,
        }
    }
}
