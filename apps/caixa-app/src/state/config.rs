//! # Configuration State
//!
//! Establishment info for receipts. Read-only after startup, passed to
//! the commands that need it instead of living in a global.

use crate::config::{AppConfig, StoreInfo};

/// Read-only view of the configuration commands need.
#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    store: StoreInfo,
}

impl ConfigState {
    pub fn new(store: StoreInfo) -> Self {
        ConfigState { store }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        ConfigState::new(config.store.clone())
    }

    /// Establishment info printed on receipts.
    pub fn store(&self) -> &StoreInfo {
        &self.store
    }
}
