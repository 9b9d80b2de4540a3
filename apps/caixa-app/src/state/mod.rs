//! # State Module
//!
//! Application state handed to commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │          ┌──────────────────────────┬──────────────────┐               │
//! │          ▼                          ▼                                   │
//! │  ┌──────────────────────┐  ┌──────────────────┐                        │
//! │  │   DbState            │  │   ConfigState    │                        │
//! │  │                      │  │                  │                        │
//! │  │  Database (pool)     │  │  StoreInfo       │                        │
//! │  │  commit budget       │  │                  │                        │
//! │  │  reference offset    │  │                  │                        │
//! │  └──────────────────────┘  └──────────────────┘                        │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands take only the state they need.

mod config;
mod db;

pub use config::ConfigState;
pub use db::DbState;
