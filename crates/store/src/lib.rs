//! Persistence layer for the marketplace backend.
//!
//! This crate provides:
//! - The entity records (users, products, orders, sessions) and their
//!   closed status/condition enumerations
//! - Partial-update patch types with per-field presence
//! - The [`MarketStore`] trait abstracting the document store
//! - An in-memory implementation for tests and local runs
//! - A PostgreSQL implementation backed by sqlx

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{OrderQuery, Page, ProductQuery};
pub use record::{
    Order, OrderPatch, OrderStatus, PaymentStatus, Product, ProductCondition, ProductPatch,
    ProductStatus, Session, User, UserPatch,
};
pub use store::MarketStore;
