use std::collections::BTreeMap;

use crate::classify::TypeBuckets;
use crate::model::TransactionRecord;

/// Quantity and money sums for one SKU across item-bearing rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkuBucketSums {
    pub sku: String,
    pub order_qty: f64,
    pub refund_qty: f64,
    pub adj_qty: f64,
    pub product_sales: f64,
    pub total: f64,
}

/// Group item-bearing transactions by SKU, summing absolute quantities per
/// type bucket. Output is ordered by SKU.
pub fn aggregate_by_sku<'a, I>(transactions: I) -> Vec<SkuBucketSums>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut groups: BTreeMap<&str, SkuBucketSums> = BTreeMap::new();

    for txn in transactions {
        let buckets = TypeBuckets::of(&txn.transaction_type);
        if !buckets.is_item() {
            continue;
        }

        let qty = txn.quantity.abs();
        let entry = groups.entry(txn.sku.as_str()).or_insert_with(|| SkuBucketSums {
            sku: txn.sku.clone(),
            ..SkuBucketSums::default()
        });
        if buckets.order {
            entry.order_qty += qty;
        }
        if buckets.refund {
            entry.refund_qty += qty;
        }
        if buckets.adjustment {
            entry.adj_qty += qty;
        }
        entry.product_sales += txn.product_sales;
        entry.total += txn.total;
    }

    groups.into_values().collect()
}
