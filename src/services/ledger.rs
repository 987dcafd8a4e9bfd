//! Stock ledger: applies purchase, sale and adjustment transactions to a
//! product's inventory and keeps the immutable transaction history.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument, warn};

use super::{locks::ProductLocks, require_text, Page};
use crate::{
    db::run_in_transaction,
    entities::{
        inventory, product,
        stock_transaction::{self, TransactionType},
    },
    errors::ServiceError,
};

const MAX_USER_NAME_CHARS: usize = 100;

/// Parses a transaction kind as sent by clients.
pub fn parse_transaction_type(raw: &str) -> Result<TransactionType, ServiceError> {
    TransactionType::from_str(raw.trim()).map_err(|_| {
        ServiceError::InvalidInput(format!(
            "Unknown transaction type '{}'; expected purchase, sale or adjustment",
            raw
        ))
    })
}

/// Computes the quantity on hand after applying one transaction.
///
/// Purchases add and sales subtract. An adjustment replaces the quantity with
/// the transacted value, so an adjustment of 0 empties the shelf.
pub fn apply_transaction(
    current: i32,
    kind: TransactionType,
    quantity: i32,
) -> Result<i32, ServiceError> {
    match kind {
        TransactionType::Purchase | TransactionType::Sale if quantity <= 0 => Err(
            ServiceError::InvalidInput(format!(
                "Quantity must be greater than zero for a {}",
                kind
            )),
        ),
        TransactionType::Adjustment if quantity < 0 => Err(ServiceError::InvalidInput(
            "Adjusted quantity must not be negative".to_string(),
        )),
        TransactionType::Purchase => current.checked_add(quantity).ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "Purchase of {} would overflow quantity on hand {}",
                quantity, current
            ))
        }),
        TransactionType::Sale if current < quantity => Err(ServiceError::InsufficientStock(
            format!("requested {}, available {}", quantity, current),
        )),
        TransactionType::Sale => Ok(current - quantity),
        TransactionType::Adjustment => Ok(quantity),
    }
}

/// A stock movement to be recorded against one product.
#[derive(Debug, Clone)]
pub struct RecordTransaction {
    pub product_id: i32,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    pub user_name: String,
    pub notes: Option<String>,
}

/// Loads a product's inventory row, locking it on backends that support row locks.
pub(crate) async fn inventory_for_update(
    txn: &DatabaseTransaction,
    product_id: i32,
) -> Result<Option<inventory::Model>, ServiceError> {
    let mut query = inventory::Entity::find().filter(inventory::Column::ProductId.eq(product_id));
    if txn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }
    Ok(query.one(txn).await?)
}

#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
    locks: ProductLocks,
}

impl LedgerService {
    pub fn new(db: Arc<DatabaseConnection>, locks: ProductLocks) -> Self {
        Self { db, locks }
    }

    /// Applies `command` to the product's inventory and stores the transaction
    /// record. Either both writes commit or neither does.
    #[instrument(
        skip(self, command),
        fields(product_id = command.product_id, kind = %command.transaction_type)
    )]
    pub async fn record_transaction(
        &self,
        command: RecordTransaction,
    ) -> Result<stock_transaction::Model, ServiceError> {
        require_text("user_name", &command.user_name, MAX_USER_NAME_CHARS)?;
        let kind = command.transaction_type;
        let start = Instant::now();

        let _guard = self.locks.acquire(command.product_id).await;

        let result = run_in_transaction::<_, _, ServiceError>(&self.db, "record_transaction", move |txn| {
            Box::pin(async move {
                product::Entity::find_by_id(command.product_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Product {} not found", command.product_id))
                    })?;

                let stock = inventory_for_update(txn, command.product_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Inventory not found for product {}",
                            command.product_id
                        ))
                    })?;

                let previous = stock.quantity;
                let next = apply_transaction(previous, kind, command.quantity)?;

                let mut stock: inventory::ActiveModel = stock.into();
                stock.quantity = Set(next);
                stock.update(txn).await?;

                let record = stock_transaction::ActiveModel {
                    product_id: Set(command.product_id),
                    transaction_type: Set(kind),
                    quantity: Set(command.quantity),
                    user_name: Set(command.user_name),
                    notes: Set(command.notes),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                info!(
                    transaction_id = record.id,
                    previous_quantity = previous,
                    new_quantity = next,
                    "Stock transaction recorded"
                );
                Ok(record)
            })
        })
        .await;

        histogram!("inventory_ledger.record.duration", start.elapsed());
        match &result {
            Ok(_) => {
                counter!("inventory_ledger.transactions.recorded", 1, "type" => kind.to_string());
            }
            Err(e) => {
                let reason = match e {
                    ServiceError::InsufficientStock(_) => "insufficient_stock",
                    ServiceError::NotFound(_) => "not_found",
                    ServiceError::InvalidInput(_) => "invalid_input",
                    _ => "error",
                };
                counter!("inventory_ledger.transactions.rejected", 1, "reason" => reason);
                warn!(error = %e, "Stock transaction rejected");
            }
        }

        result
    }

    /// Most recent transactions first.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        page: Page,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        Ok(stock_transaction::Entity::find()
            .order_by_desc(stock_transaction::Column::TransactionDate)
            .order_by_desc(stock_transaction::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: i32,
        page: Page,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        Ok(stock_transaction::Entity::find()
            .filter(stock_transaction::Column::ProductId.eq(product_id))
            .order_by_desc(stock_transaction::Column::TransactionDate)
            .order_by_desc(stock_transaction::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_name: &str,
        page: Page,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        Ok(stock_transaction::Entity::find()
            .filter(stock_transaction::Column::UserName.eq(user_name))
            .order_by_desc(stock_transaction::Column::TransactionDate)
            .order_by_desc(stock_transaction::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use test_case::test_case;

    #[test_case(50, 5, 55 ; "purchase adds")]
    #[test_case(0, 1, 1 ; "purchase from empty")]
    fn purchase(current: i32, qty: i32, expected: i32) {
        assert_eq!(
            apply_transaction(current, TransactionType::Purchase, qty).unwrap(),
            expected
        );
    }

    #[test_case(50, 20, 30 ; "partial sale")]
    #[test_case(50, 50, 0 ; "sell out exactly")]
    fn sale(current: i32, qty: i32, expected: i32) {
        assert_eq!(
            apply_transaction(current, TransactionType::Sale, qty).unwrap(),
            expected
        );
    }

    #[test]
    fn oversell_is_insufficient_stock() {
        assert_matches!(
            apply_transaction(50, TransactionType::Sale, 60),
            Err(ServiceError::InsufficientStock(msg)) if msg.contains("available 50")
        );
    }

    #[rstest]
    #[case(50, 0)]
    #[case(50, 7)]
    #[case(3, 500)]
    #[case(0, 0)]
    fn adjustment_sets_absolute_quantity(#[case] current: i32, #[case] qty: i32) {
        assert_eq!(
            apply_transaction(current, TransactionType::Adjustment, qty).unwrap(),
            qty
        );
    }

    #[rstest]
    #[case(TransactionType::Purchase, 0)]
    #[case(TransactionType::Purchase, -3)]
    #[case(TransactionType::Sale, 0)]
    #[case(TransactionType::Sale, -1)]
    #[case(TransactionType::Adjustment, -1)]
    fn non_positive_quantities_are_invalid(#[case] kind: TransactionType, #[case] qty: i32) {
        assert_matches!(
            apply_transaction(10, kind, qty),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn purchase_overflow_is_rejected() {
        assert_matches!(
            apply_transaction(i32::MAX, TransactionType::Purchase, 1),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn parses_known_types_and_rejects_others() {
        assert_eq!(
            parse_transaction_type("sale").unwrap(),
            TransactionType::Sale
        );
        assert_eq!(
            parse_transaction_type(" adjustment ").unwrap(),
            TransactionType::Adjustment
        );
        assert_matches!(
            parse_transaction_type("refund"),
            Err(ServiceError::InvalidInput(msg)) if msg.contains("refund")
        );
    }

    #[test]
    fn worked_example_sequence() {
        let mut qty = 50;
        assert!(apply_transaction(qty, TransactionType::Sale, 60).is_err());
        qty = apply_transaction(qty, TransactionType::Sale, 20).unwrap();
        assert_eq!(qty, 30);
        qty = apply_transaction(qty, TransactionType::Purchase, 5).unwrap();
        assert_eq!(qty, 35);
        qty = apply_transaction(qty, TransactionType::Adjustment, 0).unwrap();
        assert_eq!(qty, 0);
    }
}
