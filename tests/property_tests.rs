//! Property-based tests for the stock arithmetic applied by the ledger.

use inventory_ledger::{
    entities::stock_transaction::TransactionType, errors::ServiceError,
    services::ledger::apply_transaction,
};
use proptest::prelude::*;

fn quantity_strategy() -> impl Strategy<Value = i32> {
    0i32..1_000_000
}

fn kind_strategy() -> impl Strategy<Value = TransactionType> {
    prop_oneof![
        Just(TransactionType::Purchase),
        Just(TransactionType::Sale),
        Just(TransactionType::Adjustment),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn quantity_never_goes_negative(
        current in quantity_strategy(),
        kind in kind_strategy(),
        qty in -10i32..1_000_000,
    ) {
        if let Ok(next) = apply_transaction(current, kind, qty) {
            prop_assert!(next >= 0);
        }
    }

    #[test]
    fn purchase_then_sale_restores_quantity(current in quantity_strategy(), qty in 1i32..1_000_000) {
        let bought = apply_transaction(current, TransactionType::Purchase, qty).unwrap();
        let sold = apply_transaction(bought, TransactionType::Sale, qty).unwrap();
        prop_assert_eq!(sold, current);
    }

    #[test]
    fn sale_succeeds_exactly_when_stock_covers_it(current in quantity_strategy(), qty in 1i32..2_000_000) {
        match apply_transaction(current, TransactionType::Sale, qty) {
            Ok(next) => {
                prop_assert!(qty <= current);
                prop_assert_eq!(next, current - qty);
            }
            Err(ServiceError::InsufficientStock(_)) => prop_assert!(qty > current),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn adjustment_ignores_previous_quantity(a in quantity_strategy(), b in quantity_strategy(), target in quantity_strategy()) {
        prop_assert_eq!(
            apply_transaction(a, TransactionType::Adjustment, target).unwrap(),
            apply_transaction(b, TransactionType::Adjustment, target).unwrap()
        );
    }
}
