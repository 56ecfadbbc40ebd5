//! Order ledger: creation invariants, listings, seller-only updates.

use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use store::{
    MarketStore, Order, OrderPatch, OrderQuery, OrderStatus, Page, PaymentStatus, ProductStatus,
};

use crate::catalog::ProductCatalog;
use crate::error::DomainError;

/// Input for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub quantity: u32,
    pub shipping_address: String,
    pub buyer_notes: Option<String>,
}

/// Optional equality filters over a user's orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Service for orders.
///
/// Creation snapshots the product's seller and price; neither is ever
/// recomputed afterwards, so later edits to the listing do not touch
/// existing orders.
pub struct OrderLedger<S> {
    store: S,
    catalog: ProductCatalog<S>,
}

impl<S: MarketStore + Clone> OrderLedger<S> {
    /// Creates a new ledger over the given store.
    pub fn new(store: S) -> Self {
        let catalog = ProductCatalog::new(store.clone());
        Self { store, catalog }
    }

    /// Places an order for `buyer` against an active product.
    ///
    /// Fails with [`DomainError::ProductNotFound`] for an unknown product,
    /// [`DomainError::SelfPurchase`] when the buyer is the seller, and
    /// [`DomainError::ProductUnavailable`] unless the product is active.
    /// The product itself is untouched: no stock is decremented and its
    /// status does not change, so concurrent purchases are not prevented.
    #[tracing::instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn create(&self, input: NewOrder, buyer: UserId) -> Result<Order, DomainError> {
        let Some(product) = self.catalog.peek(input.product_id).await? else {
            return Err(DomainError::ProductNotFound);
        };
        if product.seller_id == buyer {
            return Err(DomainError::SelfPurchase);
        }
        if product.status != ProductStatus::Active {
            return Err(DomainError::ProductUnavailable);
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            product_id: product.id,
            buyer_id: buyer,
            seller_id: product.seller_id,
            quantity: input.quantity,
            total_price: product.price.multiply(input.quantity),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: input.shipping_address,
            buyer_notes: input.buyer_notes,
            seller_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_order(&order).await?;
        metrics::counter!("orders_created_total").increment(1);
        Ok(order)
    }

    /// Looks up an order by id.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.store.find_order(id).await?)
    }

    /// Lists `user`'s orders, newest first.
    ///
    /// `as_buyer` selects which side of the transaction to match; the
    /// filter's status fields narrow by equality.
    pub async fn list_for_user(
        &self,
        user: UserId,
        filter: &OrderFilter,
        page: Page,
        as_buyer: bool,
    ) -> Result<Vec<Order>, DomainError> {
        let query = OrderQuery {
            user,
            as_buyer,
            status: filter.status,
            payment_status: filter.payment_status,
        };
        Ok(self.store.query_orders(&query, page).await?)
    }

    /// Applies `patch` when `requester` is the order's seller.
    ///
    /// Only status, payment status, and seller notes are patchable. Returns
    /// `None` for an unknown id or a non-seller alike. Status values are not
    /// checked against the lifecycle sketch; the seller may currently set
    /// any status (see [`OrderStatus::can_transition_to`]).
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: OrderId,
        patch: &OrderPatch,
        requester: UserId,
    ) -> Result<Option<Order>, DomainError> {
        Ok(self.store.update_order(id, requester, patch).await?)
    }
}
