//! # Error Types
//!
//! Domain error taxonomy for caixa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caixa-core errors (this file)                                         │
//! │  ├── CoreError        - Tagged domain error kinds                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caixa-db errors (separate crate)                                      │
//! │  ├── DbError          - Storage failures                               │
//! │  └── ServiceError     - CoreError | DbError                            │
//! │                                                                         │
//! │  caixa-app errors                                                      │
//! │  └── ApiError         - What callers see (code + message)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers branch on the variant, never on the rendered message.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Missing Product
// =============================================================================

/// Identifies which product lookup came back empty.
///
/// Cart validation resolves by barcode and stops at the first miss; the
/// ledger resolves a whole batch by id and reports every missing id at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingProduct {
    /// No active product carries this barcode.
    Barcode(String),
    /// These ids are unknown or inactive.
    Ids(Vec<String>),
    /// A catalogue search matched nothing.
    Search(String),
}

impl fmt::Display for MissingProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingProduct::Barcode(barcode) => write!(f, "barcode {}", barcode),
            MissingProduct::Ids(ids) => write!(f, "ids {}", ids.join(", ")),
            MissingProduct::Search(criteria) => write!(f, "no product matches {}", criteria),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They carry enough structured detail to render a user-facing message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Commit was called with zero cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product cannot be found, or is inactive.
    ///
    /// ## When This Occurs
    /// - Cart line barcode matches no active product
    /// - Ledger batch references unknown or soft-deleted ids
    /// - Catalogue lookup by id/barcode misses, or a search finds nothing
    #[error("Product not found or inactive: {0}")]
    ProductNotFound(MissingProduct),

    /// Requested quantity exceeds available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: Soda × 5
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Soda", available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 Soda in stock"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Unknown adjustment mode, or a stock value that can never be valid.
    #[error("Invalid stock adjustment: {reason}")]
    InvalidAdjustment { reason: String },

    /// Stock was observed negative outside the subtract guard.
    ///
    /// This is a bug signal: some write path bypassed the ledger.
    #[error("Stock invariant violated for product {product_id}: stock is {stock}")]
    StockConsistency { product_id: String, stock: i64 },

    /// The sale's atomic scope exceeded its budget and was rolled back.
    #[error("Sale transaction exceeded its {budget_ms}ms budget and was rolled back")]
    TransactionTimeout { budget_ms: u64 },

    /// No sale with this id exists.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Another product already uses this barcode.
    #[error("Barcode '{0}' is already registered")]
    DuplicateBarcode(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a barcode miss.
    pub fn barcode_not_found(barcode: impl Into<String>) -> Self {
        CoreError::ProductNotFound(MissingProduct::Barcode(barcode.into()))
    }

    /// Shorthand for one or more id misses.
    pub fn ids_not_found<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CoreError::ProductNotFound(MissingProduct::Ids(
            ids.into_iter().map(Into::into).collect(),
        ))
    }

    /// Creates an InvalidAdjustment error.
    pub fn invalid_adjustment(reason: impl Into<String>) -> Self {
        CoreError::InvalidAdjustment {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
