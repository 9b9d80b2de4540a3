//! # caixa-db: Database Layer and Sale Engine for Caixa POS
//!
//! This crate provides storage for the Caixa POS system and the components
//! that keep stock and sales consistent under concurrent commits.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caixa POS Data Flow                              │
//! │                                                                         │
//! │  caixa-app command (commit_sale)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     caixa-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   SaleCoordinator ──► CartValidator ──► StockLedger             │   │
//! │  │          │                                   │                  │   │
//! │  │          └──────────► repository ◄───────────┘                  │   │
//! │  │                          ▲                                      │   │
//! │  │   SaleQueryService ──────┘        Catalog (product CRUD)        │   │
//! │  │                                                                 │   │
//! │  │   Database (pool.rs) ── SqlitePool, BEGIN IMMEDIATE scopes      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError`, `ServiceError`
//! - [`repository`] - SQL for products and sales
//! - [`ledger`] - Stock Ledger
//! - [`validator`] - Cart Validator
//! - [`coordinator`] - Sale Transaction Coordinator
//! - [`query`] - Sale Query Service
//! - [`catalog`] - Product catalogue rules
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caixa_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("caixa.db")).await?;
//! let sale = db
//!     .coordinator(Duration::from_secs(10))
//!     .commit_sale(&[CartLine::new("123", 3)], PaymentMethod::Cash)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;
pub mod validator;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::Catalog;
pub use coordinator::SaleCoordinator;
pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use ledger::StockLedger;
pub use pool::{Database, DbConfig};
pub use query::SaleQueryService;
pub use validator::{CartPreview, CartValidator};

pub use repository::product::ProductRepository;
