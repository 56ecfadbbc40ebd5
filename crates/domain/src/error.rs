//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
///
/// Domain-rule failures carry actionable messages for the caller; store
/// failures propagate unrecovered so the boundary layer can surface them as
/// retryable infrastructure errors. "Present but not owned by the caller" is
/// deliberately NOT an error here — owner-scoped operations return `None`
/// for it, indistinguishable from an unknown id.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Email or username is already taken.
    #[error("User with this email or username already exists")]
    AlreadyExists,

    /// The ordered product does not exist.
    #[error("Product not found")]
    ProductNotFound,

    /// Buyer and seller are the same user.
    #[error("Cannot buy your own product")]
    SelfPurchase,

    /// The product is not in active status.
    #[error("Product is not available for purchase")]
    ProductUnavailable,

    /// Password hashing or verification failed internally.
    #[error("password hashing failed: {0}")]
    Password(String),

    /// An error occurred in the document store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
