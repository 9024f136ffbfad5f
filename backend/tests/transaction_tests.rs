//! Transaction engine tests
//!
//! Tests for transaction totals, inventory effects and reversal:
//! - Stock delta per transaction type
//! - Total computation with discounts, tax and shipping
//! - Payment accumulation and the PAID flip
//! - Create-then-delete stock round-trip

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{
    is_fully_paid, line_total, transaction_total, MovementType, TransactionType,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Sale removes stock, purchase and return add it, quotation does nothing
    #[test]
    fn test_stock_effect_table() {
        let sale = TransactionType::Sale.stock_effect().unwrap();
        assert_eq!(sale.movement_type, MovementType::Out);
        assert_eq!(sale.delta(4), -4);

        let purchase = TransactionType::Purchase.stock_effect().unwrap();
        assert_eq!(purchase.movement_type, MovementType::In);
        assert_eq!(purchase.delta(4), 4);

        let ret = TransactionType::Return.stock_effect().unwrap();
        assert_eq!(ret.movement_type, MovementType::In);
        assert_eq!(ret.delta(4), 4);

        assert!(TransactionType::Quotation.stock_effect().is_none());
    }

    /// Worked example: 3 x 10.00, transaction discount 5, tax 2, no shipping
    #[test]
    fn test_total_worked_example() {
        let item_sum = line_total(3, dec("10.00"), Decimal::ZERO);
        let total = transaction_total(item_sum, dec("5"), dec("2"), Decimal::ZERO);
        assert_eq!(total, dec("27.00"));
    }

    /// Item-level discounts subtract before the header amounts apply
    #[test]
    fn test_total_with_item_discounts() {
        let item_sum = line_total(2, dec("50.00"), dec("10.00"))
            + line_total(1, dec("25.00"), Decimal::ZERO);
        // (2*50 - 10) + 25 = 115; 115 - 5 + 8.05 + 12 = 130.05
        let total = transaction_total(item_sum, dec("5"), dec("8.05"), dec("12"));
        assert_eq!(total, dec("130.05"));
    }

    /// No floor at zero: an oversized discount produces a negative total
    #[test]
    fn test_total_not_floored() {
        let total = transaction_total(dec("10"), dec("25"), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(total, dec("-15"));
    }

    /// Payments settle at >= total; overpayment settles silently
    #[test]
    fn test_payment_flip_threshold() {
        let total = dec("27.00");
        assert!(!is_fully_paid(dec("26.99"), total));
        assert!(is_fully_paid(dec("27.00"), total));
        assert!(is_fully_paid(dec("100.00"), total));
    }

    /// Sequential item application: each movement brackets the stock value
    /// left by the previous item
    #[test]
    fn test_sequential_item_brackets() {
        let effect = TransactionType::Sale.stock_effect().unwrap();
        let mut stock = 100;
        let mut movements = Vec::new();

        for quantity in [3, 5, 2] {
            let previous = stock;
            stock += effect.delta(quantity);
            movements.push((previous, stock));
        }

        assert_eq!(movements, vec![(100, 97), (97, 92), (92, 90)]);
        assert_eq!(stock, 90);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for line item quantities
    fn quantity_strategy() -> impl Strategy<Value = i32> {
        1i32..=500
    }

    /// Strategy for unit prices (0.01 to 1000.00)
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for stock-affecting transaction types
    fn effect_type_strategy() -> impl Strategy<Value = TransactionType> {
        prop_oneof![
            Just(TransactionType::Sale),
            Just(TransactionType::Purchase),
            Just(TransactionType::Return),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The total is the item sum shifted by the header amounts
        #[test]
        fn prop_total_formula(
            quantities in prop::collection::vec(quantity_strategy(), 1..8),
            price in price_strategy(),
            discount in price_strategy(),
            tax in price_strategy(),
            shipping in price_strategy()
        ) {
            let item_sum: Decimal = quantities
                .iter()
                .map(|&q| line_total(q, price, Decimal::ZERO))
                .sum();
            let total = transaction_total(item_sum, discount, tax, shipping);

            prop_assert_eq!(total, item_sum - discount + tax + shipping);
        }

        /// Applying a transaction's items then reversing every movement
        /// restores the starting stock exactly
        #[test]
        fn prop_reversal_round_trip(
            transaction_type in effect_type_strategy(),
            quantities in prop::collection::vec(quantity_strategy(), 1..10),
            initial_stock in 0i32..=10000
        ) {
            let effect = transaction_type.stock_effect().unwrap();

            let mut stock = initial_stock;
            let mut movements = Vec::new();
            for &quantity in &quantities {
                let previous = stock;
                stock += effect.delta(quantity);
                movements.push((previous, stock));
            }

            // Reverse: subtract each movement's recorded delta
            for &(previous, new) in &movements {
                stock -= new - previous;
            }

            prop_assert_eq!(stock, initial_stock);
        }

        /// Movement brackets chain: each movement starts where the previous
        /// one ended, and the last new_stock is the final stock
        #[test]
        fn prop_movement_chain(
            transaction_type in effect_type_strategy(),
            quantities in prop::collection::vec(quantity_strategy(), 1..10),
            initial_stock in 0i32..=10000
        ) {
            let effect = transaction_type.stock_effect().unwrap();

            let mut stock = initial_stock;
            let mut movements = Vec::new();
            for &quantity in &quantities {
                let previous = stock;
                stock += effect.delta(quantity);
                movements.push((previous, stock));
            }

            prop_assert_eq!(movements[0].0, initial_stock);
            for pair in movements.windows(2) {
                prop_assert_eq!(pair[0].1, pair[1].0);
            }
            prop_assert_eq!(movements.last().unwrap().1, stock);

            // Each bracket spans exactly the signed quantity
            for (movement, &quantity) in movements.iter().zip(&quantities) {
                prop_assert_eq!(movement.1 - movement.0, effect.delta(quantity));
            }
        }

        /// Payment accumulation flips exactly once the running sum reaches
        /// the total, and never before
        #[test]
        fn prop_payment_accumulation(
            payments in prop::collection::vec(price_strategy(), 1..10),
            total in price_strategy()
        ) {
            let mut paid = Decimal::ZERO;
            let mut flipped_at = None;

            for (idx, amount) in payments.iter().enumerate() {
                if is_fully_paid(paid, total) {
                    // Once PAID, further payments are rejected upstream
                    break;
                }
                paid += amount;
                if flipped_at.is_none() && is_fully_paid(paid, total) {
                    flipped_at = Some(idx);
                }
            }

            if let Some(idx) = flipped_at {
                let sum_before: Decimal = payments.iter().take(idx).copied().sum();
                prop_assert!(sum_before < total);
                prop_assert!(paid >= total);
            } else {
                prop_assert!(paid < total);
            }
        }
    }
}

// ============================================================================
// Simulation Helpers (mirror of the engine's create/remove flow)
// ============================================================================

#[cfg(test)]
mod simulation {
    use super::*;

    /// In-memory mirror of one product's stock plus its movement ledger
    struct ProductLedger {
        stock: i32,
        movements: Vec<(i32, i32)>,
        deleted: bool,
    }

    impl ProductLedger {
        fn new(stock: i32) -> Self {
            Self {
                stock,
                movements: Vec::new(),
                deleted: false,
            }
        }

        fn create(&mut self, transaction_type: TransactionType, quantities: &[i32]) {
            if let Some(effect) = transaction_type.stock_effect() {
                for &quantity in quantities {
                    let previous = self.stock;
                    self.stock += effect.delta(quantity);
                    self.movements.push((previous, self.stock));
                }
            }
        }

        fn remove(&mut self) -> Result<(), &'static str> {
            if self.deleted {
                return Err("Transaction not found");
            }
            for &(previous, new) in self.movements.clone().iter() {
                let current = self.stock;
                let restored = current - (new - previous);
                // Reversal appends inverse movements instead of rewriting
                self.movements.push((current, restored));
                self.stock = restored;
            }
            self.deleted = true;
            Ok(())
        }
    }

    #[test]
    fn test_sale_create_then_delete_restores_stock() {
        let mut ledger = ProductLedger::new(50);
        ledger.create(TransactionType::Sale, &[3]);
        assert_eq!(ledger.stock, 47);

        ledger.remove().unwrap();
        assert_eq!(ledger.stock, 50);
        // Original movement plus its inverse, both retained
        assert_eq!(ledger.movements.len(), 2);
        assert_eq!(ledger.movements[1], (47, 50));
    }

    #[test]
    fn test_second_delete_fails_not_found() {
        let mut ledger = ProductLedger::new(10);
        ledger.create(TransactionType::Purchase, &[5]);
        ledger.remove().unwrap();
        assert!(ledger.remove().is_err());
    }

    #[test]
    fn test_quotation_moves_no_stock() {
        let mut ledger = ProductLedger::new(10);
        ledger.create(TransactionType::Quotation, &[5, 2]);
        assert_eq!(ledger.stock, 10);
        assert!(ledger.movements.is_empty());
    }

    #[test]
    fn test_multi_item_delete_restores_stock() {
        let mut ledger = ProductLedger::new(100);
        ledger.create(TransactionType::Sale, &[10, 20, 5]);
        assert_eq!(ledger.stock, 65);

        ledger.remove().unwrap();
        assert_eq!(ledger.stock, 100);
    }
}
