use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::ReconError;

/// Product name used when a catalog has no name column or a SKU has no catalog entry.
pub const UNKNOWN_PRODUCT: &str = "unknown product";

// ---------------------------------------------------------------------------
// Settlement input
// ---------------------------------------------------------------------------

/// One settlement row after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub transaction_type: String,
    /// Trimmed, upper-cased. Empty for rows that carry no item.
    pub sku: String,
    pub timestamp: Option<NaiveDateTime>,
    pub total: f64,
    pub product_sales: f64,
    pub selling_fees: f64,
    pub fba_fees: f64,
    /// Signed, from `quantity` or the `amount-description` fallback.
    pub quantity: f64,
    pub is_advertising: bool,
    /// Normalized cell text, aligned with [`Settlement::columns`].
    pub fields: Vec<String>,
}

impl TransactionRecord {
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }
}

/// A parsed settlement export: lower-cased column names plus typed rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settlement {
    pub columns: Vec<String>,
    pub transactions: Vec<TransactionRecord>,
}

// ---------------------------------------------------------------------------
// Cost catalog
// ---------------------------------------------------------------------------

/// One (product, SKU) pairing from the unpivoted cost catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRecord {
    pub sku: String,
    pub product_name: String,
    pub cost_inclusive: f64,
    /// Present only when the catalog has a tax-exclusive cost column.
    pub cost_exclusive: Option<f64>,
}

/// Normalized catalog plus the column roles it was resolved from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostCatalog {
    pub records: Vec<CostRecord>,
    pub name_column: String,
    pub inclusive_column: String,
    pub exclusive_column: Option<String>,
    /// Sheet the records came from; `None` for delimited files.
    pub sheet: Option<String>,
}

impl CostCatalog {
    pub fn has_exclusive_cost(&self) -> bool {
        self.exclusive_column.is_some()
    }

    pub fn lookup(&self) -> CostLookup {
        CostLookup {
            by_sku: self
                .records
                .iter()
                .map(|r| (r.sku.clone(), r.clone()))
                .collect(),
            has_exclusive_cost: self.has_exclusive_cost(),
        }
    }
}

/// SKU-keyed view of a catalog, held for one run.
#[derive(Debug, Clone, Default)]
pub struct CostLookup {
    by_sku: HashMap<String, CostRecord>,
    has_exclusive_cost: bool,
}

impl CostLookup {
    pub fn get(&self, sku: &str) -> Option<&CostRecord> {
        self.by_sku.get(sku)
    }

    /// Tax-inclusive unit cost, 0 when the SKU is not in the catalog.
    pub fn unit_cost(&self, sku: &str) -> f64 {
        self.get(sku).map_or(0.0, |r| r.cost_inclusive)
    }

    pub fn has_exclusive_cost(&self) -> bool {
        self.has_exclusive_cost
    }

    pub fn len(&self) -> usize {
        self.by_sku.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sku.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Per-SKU profit
// ---------------------------------------------------------------------------

/// Transaction-derived quantities for one SKU joined with its cost record.
///
/// Cost totals are net of recovery: `(order + adj) × unit cost − refund ×
/// unit cost × recovery rate`. Profit is `net_payout × rate − cost total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuProfitSummary {
    pub sku: String,
    pub product_name: String,
    pub catalog_match: bool,
    pub order_qty: f64,
    pub refund_qty: f64,
    pub adj_qty: f64,
    /// Source currency.
    pub gross_sales: f64,
    /// Source currency.
    pub net_payout: f64,
    pub cost_inclusive: f64,
    pub recovery_inclusive: f64,
    pub cost_total_inclusive: f64,
    pub profit_inclusive: f64,
    pub cost_exclusive: Option<f64>,
    pub recovery_exclusive: Option<f64>,
    pub cost_total_exclusive: Option<f64>,
    pub profit_exclusive: Option<f64>,
    /// Inclusive profit over local-currency gross sales; 0 when sales <= 0.
    pub margin: f64,
}

impl SkuProfitSummary {
    /// May be negative when returns exceed same-period orders.
    pub fn net_sold_qty(&self) -> f64 {
        self.order_qty - self.refund_qty
    }

    pub fn label(&self) -> String {
        format!("{} | {}", self.sku, self.product_name)
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Account-wide figures. Suffix-less money fields are source currency;
/// `_local` fields and all cost/profit fields are local currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTotals {
    pub gross_sales: f64,
    pub gross_sales_local: f64,
    pub net_payout: f64,
    pub net_payout_local: f64,
    pub advertising_spend: f64,
    pub advertising_spend_local: f64,
    pub ad_permille: f64,
    pub transfer_total: f64,
    pub selling_fees: f64,
    pub selling_fees_local: f64,
    pub fba_fees: f64,
    pub fba_fees_local: f64,
    pub manual_freight: f64,
    pub total_cost_inclusive: f64,
    pub total_recovery_inclusive: f64,
    pub net_profit_inclusive: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive: Option<ExclusiveTotals>,
}

/// Tax-exclusive variant, computed only when the catalog exposes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExclusiveTotals {
    pub total_cost: f64,
    pub total_recovery: f64,
    pub net_profit: f64,
}

/// Sum of `total` for one (date, type) cell of the daily trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub transaction_type: String,
    pub total: f64,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
    pub transactions_in: usize,
    pub transactions_used: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<(NaiveDate, NaiveDate)>,
    pub has_exclusive_cost: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitReport {
    pub meta: ReportMeta,
    pub totals: AggregateTotals,
    /// Sorted by `profit_inclusive` descending (stable).
    pub skus: Vec<SkuProfitSummary>,
    /// Non-empty SKUs with no catalog entry, ascending.
    pub unmatched_skus: Vec<String>,
    pub daily: Vec<DailyTotal>,
}

impl ProfitReport {
    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReconError::Export(format!("failed to serialize report: {e}")))
    }

    pub fn sku(&self, sku: &str) -> Option<&SkuProfitSummary> {
        self.skus.iter().find(|s| s.sku == sku)
    }
}

// ---------------------------------------------------------------------------
// Audit export
// ---------------------------------------------------------------------------

/// One audit ledger line: a settlement row with its imputed cost, or the
/// synthetic freight adjustment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLine {
    pub transaction_type: String,
    pub sku: String,
    /// Cells aligned with [`AuditLedger::columns`]; empty for the freight line.
    pub fields: Vec<String>,
    /// `None` only on the freight line.
    pub unit_cost: Option<f64>,
    pub line_profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditLedger {
    /// Settlement columns; writers append `unit_cost` and `line_profit`.
    pub columns: Vec<String>,
    pub lines: Vec<AuditLine>,
}

impl AuditLedger {
    pub fn total_line_profit(&self) -> f64 {
        self.lines.iter().map(|l| l.line_profit).sum()
    }
}
