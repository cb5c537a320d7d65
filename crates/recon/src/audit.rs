//! Line-level audit ledger.
//!
//! Every settlement row gets its imputed unit cost and a line profit; a final
//! synthetic `ADJUSTMENT` / `MANUAL_FREIGHT` line carries the manual freight.
//! Line profits are split the same way the aggregate profit is, so the ledger
//! sums to `net_profit_inclusive` for the same rows and config:
//!
//! - payout part: `total × rate`, or 0 for Transfer rows
//! - cost part: `unit × |qty| × (order + adjustment)`
//! - recovery part: `unit × |qty| × recovery rate × refund`
//!
//! For a plain Order row this reduces to `total × rate − unit × |qty|`.

use crate::classify::{is_transfer, TypeBuckets};
use crate::config::ProfitConfig;
use crate::model::{AuditLedger, AuditLine, CostLookup, TransactionRecord};

pub const FREIGHT_TYPE: &str = "ADJUSTMENT";
pub const FREIGHT_SKU: &str = "MANUAL_FREIGHT";

/// Build the audit ledger over `transactions` (filtered or not; the caller
/// decides which sequence is audited).
///
/// `line_profit` is not the plain `total × rate − unit_cost × |quantity|`
/// row profit used by older spreadsheet exports. Refund rows are credited
/// the recovered cost (`unit_cost × |quantity| × recovery rate`) instead of
/// being charged it, and Transfer rows carry 0, so that the column sums to
/// the report's `net_profit_inclusive`. The two agree on plain Order rows.
pub fn build_audit<'a, I>(
    columns: &[String],
    transactions: I,
    costs: &CostLookup,
    config: &ProfitConfig,
) -> AuditLedger
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let rate = config.exchange_rate;
    let rf = config.recovery_fraction();

    let mut lines: Vec<AuditLine> = transactions
        .into_iter()
        .map(|txn| {
            let unit_cost = costs.unit_cost(&txn.sku);
            AuditLine {
                transaction_type: txn.transaction_type.clone(),
                sku: txn.sku.clone(),
                fields: txn.fields.clone(),
                unit_cost: Some(unit_cost),
                line_profit: line_profit(txn, unit_cost, rate, rf),
            }
        })
        .collect();

    lines.push(AuditLine {
        transaction_type: FREIGHT_TYPE.to_string(),
        sku: FREIGHT_SKU.to_string(),
        fields: vec![String::new(); columns.len()],
        unit_cost: None,
        line_profit: -config.manual_freight,
    });

    AuditLedger {
        columns: columns.to_vec(),
        lines,
    }
}

fn line_profit(txn: &TransactionRecord, unit_cost: f64, rate: f64, rf: f64) -> f64 {
    let payout = if is_transfer(&txn.transaction_type) {
        0.0
    } else {
        txn.total * rate
    };

    let buckets = TypeBuckets::of(&txn.transaction_type);
    let units = unit_cost * txn.quantity.abs();
    payout - units * buckets.cost_units() + units * rf * buckets.recovery_units()
}
