pub mod alerts;
pub mod inventory;
pub mod ledger;
pub mod locks;
pub mod products;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;

use self::{
    alerts::AlertService, inventory::InventoryService, ledger::LedgerService,
    locks::ProductLocks, products::ProductService,
};

/// Offset/limit window applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
        }
    }
}

/// Rejects text that is blank after trimming or longer than `max_chars`.
pub(crate) fn require_text(field: &str, value: &str, max_chars: usize) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} must not be blank", field)));
    }
    if value.chars().count() > max_chars {
        return Err(ServiceError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(())
}

/// Services shared by every handler. All of them serialize stock writes
/// through the same [`ProductLocks`].
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub inventory: InventoryService,
    pub ledger: LedgerService,
    pub alerts: AlertService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let locks = ProductLocks::default();
        Self {
            products: ProductService::new(db.clone(), locks.clone()),
            inventory: InventoryService::new(db.clone(), locks.clone()),
            ledger: LedgerService::new(db.clone(), locks),
            alerts: AlertService::new(db),
        }
    }
}
