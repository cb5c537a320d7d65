//! Sort and ranking views over the per-SKU table.

use serde::Deserialize;

use crate::model::{ProfitReport, SkuProfitSummary};

/// Numeric column of [`SkuProfitSummary`] the table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuSortKey {
    OrderQty,
    RefundQty,
    AdjQty,
    NetSoldQty,
    GrossSales,
    NetPayout,
    CostTotalInclusive,
    CostTotalExclusive,
    ProfitInclusive,
    ProfitExclusive,
    Margin,
}

impl SkuSortKey {
    /// Missing exclusive figures sort as 0.
    pub fn value(&self, row: &SkuProfitSummary) -> f64 {
        match self {
            Self::OrderQty => row.order_qty,
            Self::RefundQty => row.refund_qty,
            Self::AdjQty => row.adj_qty,
            Self::NetSoldQty => row.net_sold_qty(),
            Self::GrossSales => row.gross_sales,
            Self::NetPayout => row.net_payout,
            Self::CostTotalInclusive => row.cost_total_inclusive,
            Self::CostTotalExclusive => row.cost_total_exclusive.unwrap_or(0.0),
            Self::ProfitInclusive => row.profit_inclusive,
            Self::ProfitExclusive => row.profit_exclusive.unwrap_or(0.0),
            Self::Margin => row.margin,
        }
    }
}

/// Stable sort; equal keys keep their current relative order.
pub fn sort_skus(rows: &mut [SkuProfitSummary], key: SkuSortKey, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = key.value(a).total_cmp(&key.value(b));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

impl ProfitReport {
    /// Highest inclusive profit first.
    pub fn top(&self, n: usize) -> Vec<&SkuProfitSummary> {
        self.skus.iter().take(n).collect()
    }

    /// Lowest inclusive profit (largest losses) first.
    pub fn bottom(&self, n: usize) -> Vec<&SkuProfitSummary> {
        let mut rows: Vec<&SkuProfitSummary> = self.skus.iter().collect();
        rows.sort_by(|a, b| a.profit_inclusive.total_cmp(&b.profit_inclusive));
        rows.truncate(n);
        rows
    }

    /// Copy of the table sorted by `key`.
    pub fn sorted_by(&self, key: SkuSortKey, descending: bool) -> Vec<SkuProfitSummary> {
        let mut rows = self.skus.clone();
        sort_skus(&mut rows, key, descending);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku: &str, profit: f64, sales: f64) -> SkuProfitSummary {
        SkuProfitSummary {
            sku: sku.into(),
            product_name: "p".into(),
            catalog_match: true,
            order_qty: 1.0,
            refund_qty: 0.0,
            adj_qty: 0.0,
            gross_sales: sales,
            net_payout: 0.0,
            cost_inclusive: 0.0,
            recovery_inclusive: 0.0,
            cost_total_inclusive: 0.0,
            profit_inclusive: profit,
            cost_exclusive: None,
            recovery_exclusive: None,
            cost_total_exclusive: None,
            profit_exclusive: None,
            margin: 0.0,
        }
    }

    fn skus(rows: &[SkuProfitSummary]) -> Vec<&str> {
        rows.iter().map(|r| r.sku.as_str()).collect()
    }

    #[test]
    fn descending_sort_is_stable_on_ties() {
        let mut rows = vec![row("A", 5.0, 0.0), row("B", 9.0, 0.0), row("C", 5.0, 0.0), row("D", -1.0, 0.0)];
        sort_skus(&mut rows, SkuSortKey::ProfitInclusive, true);
        assert_eq!(skus(&rows), vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn ascending_by_other_column() {
        let mut rows = vec![row("A", 0.0, 30.0), row("B", 0.0, 10.0), row("C", 0.0, 20.0)];
        sort_skus(&mut rows, SkuSortKey::GrossSales, false);
        assert_eq!(skus(&rows), vec!["B", "C", "A"]);
    }

    #[test]
    fn missing_exclusive_sorts_as_zero() {
        let mut with = row("A", 0.0, 0.0);
        with.profit_exclusive = Some(-3.0);
        let mut rows = vec![with, row("B", 0.0, 0.0)];
        sort_skus(&mut rows, SkuSortKey::ProfitExclusive, true);
        assert_eq!(skus(&rows), vec!["B", "A"]);
    }

    #[test]
    fn sort_key_parses_snake_case() {
        let key: SkuSortKey = serde_json::from_str("\"net_sold_qty\"").unwrap();
        assert_eq!(key, SkuSortKey::NetSoldQty);
    }
}
