use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::{info, instrument};

use super::{ledger::inventory_for_update, locks::ProductLocks, Page};
use crate::{db::run_in_transaction, entities::inventory, errors::ServiceError};

/// Allow-listed inventory fields. Each present value must be non-negative.
#[derive(Debug, Clone, Default)]
pub struct InventoryChanges {
    pub quantity: Option<i32>,
    pub min_stock_level: Option<i32>,
    pub max_stock_level: Option<i32>,
}

impl InventoryChanges {
    fn check(&self) -> Result<(), ServiceError> {
        for (field, value) in [
            ("quantity", self.quantity),
            ("min_stock_level", self.min_stock_level),
            ("max_stock_level", self.max_stock_level),
        ] {
            if matches!(value, Some(v) if v < 0) {
                return Err(ServiceError::InvalidInput(format!(
                    "{} must not be negative",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    locks: ProductLocks,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, locks: ProductLocks) -> Self {
        Self { db, locks }
    }

    #[instrument(skip(self))]
    pub async fn list_inventory(&self, page: Page) -> Result<Vec<inventory::Model>, ServiceError> {
        Ok(inventory::Entity::find()
            .order_by_asc(inventory::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_inventory(&self, product_id: i32) -> Result<inventory::Model, ServiceError> {
        inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory not found for product {}", product_id))
            })
    }

    /// Overwrites the given fields of a product's inventory row. Serialized with
    /// ledger writes on the same product.
    #[instrument(skip(self))]
    pub async fn update_inventory(
        &self,
        product_id: i32,
        changes: InventoryChanges,
    ) -> Result<inventory::Model, ServiceError> {
        changes.check()?;

        let _guard = self.locks.acquire(product_id).await;

        let updated =
            run_in_transaction::<_, _, ServiceError>(&self.db, "update_inventory", move |txn| {
                Box::pin(async move {
                    let existing = inventory_for_update(txn, product_id).await?.ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Inventory not found for product {}",
                            product_id
                        ))
                    })?;

                    let mut model: inventory::ActiveModel = existing.into();
                    if let Some(quantity) = changes.quantity {
                        model.quantity = Set(quantity);
                    }
                    if let Some(min) = changes.min_stock_level {
                        model.min_stock_level = Set(min);
                    }
                    if let Some(max) = changes.max_stock_level {
                        model.max_stock_level = Set(max);
                    }

                    Ok(model.update(txn).await?)
                })
            })
            .await?;

        info!(
            product_id,
            quantity = updated.quantity,
            min_stock_level = updated.min_stock_level,
            "Inventory updated"
        );
        Ok(updated)
    }
}
