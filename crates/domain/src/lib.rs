//! Business core of the marketplace backend.
//!
//! This crate provides the cross-entity consistency layer:
//! - [`UserDirectory`] — account storage, credential checks, sessions
//! - [`ProductCatalog`] — listings, filtered queries, view counters,
//!   owner-only mutation
//! - [`OrderLedger`] — order creation with purchase-eligibility checks,
//!   seller-only updates, derived pricing
//! - [`ViewComposer`] — read-time joins into response-shaped aggregates
//!
//! Services are explicitly constructed over an injected store handle; there
//! is no ambient global state.

pub mod catalog;
pub mod directory;
pub mod error;
pub mod ledger;
mod password;
pub mod views;

pub use catalog::{NewProduct, ProductCatalog};
pub use directory::{NewUser, UserDirectory};
pub use error::DomainError;
pub use ledger::{NewOrder, OrderFilter, OrderLedger};
pub use views::{OrderView, ProductSummary, ProductView, UserSummary, ViewComposer};
