//! # Repository Module
//!
//! Database repository implementations for Caixa POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Service (ledger, validator, coordinator, query)                       │
//! │       │                                                                 │
//! │       │  product::find_active_by_barcodes(&mut *tx, &barcodes)         │
//! │       ▼                                                                 │
//! │  Repository functions ── SQL lives only here                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function that the sale path needs takes `&mut SqliteConnection`,
//! so it runs on whatever scope the caller holds: a pooled connection or an
//! open transaction.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and search
//! - [`sale`] - Sale inserts and reads on a caller's connection

pub mod product;
pub mod sale;
