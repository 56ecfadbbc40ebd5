use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated on insert.
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: &'static str },

    /// A stored record carried an enumeration value this build does not know.
    #[error("unrecognized {what} value in stored record: `{value}`")]
    UnknownEnum { what: &'static str, value: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
