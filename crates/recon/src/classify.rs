//! Transaction-type classification.
//!
//! All matching is an unanchored, case-insensitive substring test against the
//! settlement's free-text `type`. The three item buckets are not mutually
//! exclusive: a type containing two keywords counts in both.

use serde::Serialize;

const ORDER: &str = "order";
const REFUND: &str = "refund";
const ADJUSTMENT: &str = "adjustment";
const TRANSFER: &str = "transfer";

/// Which item buckets a transaction type falls into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeBuckets {
    pub order: bool,
    pub refund: bool,
    pub adjustment: bool,
}

impl TypeBuckets {
    pub fn of(transaction_type: &str) -> Self {
        let lower = transaction_type.to_lowercase();
        Self {
            order: lower.contains(ORDER),
            refund: lower.contains(REFUND),
            adjustment: lower.contains(ADJUSTMENT),
        }
    }

    /// Item-bearing rows carry a SKU quantity that feeds cost.
    pub fn is_item(&self) -> bool {
        self.order || self.refund || self.adjustment
    }

    /// Multiplier on `unit cost × |qty|` that counts as consumed stock.
    pub fn cost_units(&self) -> f64 {
        f64::from(u8::from(self.order)) + f64::from(u8::from(self.adjustment))
    }

    /// Multiplier on `unit cost × |qty| × recovery rate` that comes back.
    pub fn recovery_units(&self) -> f64 {
        f64::from(u8::from(self.refund))
    }
}

pub fn is_transfer(transaction_type: &str) -> bool {
    transaction_type.to_lowercase().contains(TRANSFER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_types() {
        assert_eq!(
            TypeBuckets::of("Order"),
            TypeBuckets { order: true, refund: false, adjustment: false }
        );
        assert_eq!(
            TypeBuckets::of("Refund"),
            TypeBuckets { order: false, refund: true, adjustment: false }
        );
        assert_eq!(
            TypeBuckets::of("Adjustment"),
            TypeBuckets { order: false, refund: false, adjustment: true }
        );
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert!(TypeBuckets::of("order").order);
        assert!(TypeBuckets::of("FBA Inventory Adjustment").adjustment);
        assert!(TypeBuckets::of("Order_Retrocharge").order);
        assert!(is_transfer("transfer"));
        assert!(is_transfer("Bank TRANSFER"));
        assert!(!is_transfer("Order"));
    }

    #[test]
    fn non_item_types() {
        assert!(!TypeBuckets::of("Service Fee").is_item());
        assert!(!TypeBuckets::of("Transfer").is_item());
        assert!(!TypeBuckets::of("").is_item());
    }

    #[test]
    fn overlapping_keywords_count_in_every_bucket() {
        // Not a real settlement type, but matching does not pick a single bucket.
        let b = TypeBuckets::of("Order Refund Adjustment");
        assert!(b.order && b.refund && b.adjustment);
        assert_eq!(b.cost_units(), 2.0);
        assert_eq!(b.recovery_units(), 1.0);
    }
}
