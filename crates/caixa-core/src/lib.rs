//! # caixa-core: Pure Business Logic for Caixa POS
//!
//! This crate holds the domain model of the point-of-sale system and every
//! rule that can be expressed without touching storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caixa POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 caixa-app (commands, config)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │     caixa-db: Ledger ─ Validator ─ Coordinator ─ Query          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caixa-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ price_cart│  │   rules   │  │   │
//! │  │   │   Sale    │  │           │  │ StockPlan │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartLine, Sale, filters, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Field-level input checks
//! - [`pricing`] - Cart pricing and stock-adjustment arithmetic
//!
//! ## Example Usage
//!
//! ```rust
//! use caixa_core::money::Money;
//!
//! let unit_price = Money::from_cents(250); // $2.50
//! let subtotal = unit_price.multiply_quantity(3);
//! assert_eq!(subtotal.cents(), 750);
//! ```

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, MissingProduct, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Budget for one sale commit, in seconds.
///
/// Reads, stock decrements and the sale insert must all finish inside this
/// window or the whole unit is abandoned.
pub const SALE_COMMIT_TIMEOUT_SECS: u64 = 10;

/// Default page size for sale listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a sale listing accepts.
pub const MAX_PAGE_LIMIT: u32 = 100;
