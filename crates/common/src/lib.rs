//! Shared types for the marketplace backend.

pub mod types;

pub use types::{Money, OrderId, ProductId, UserId};
