use crate::aggregate::{aggregate_by_sku, SkuBucketSums};
use crate::classify::is_transfer;
use crate::config::ProfitConfig;
use crate::derived::{daily_trend, filter_window};
use crate::error::ReconError;
use crate::model::{
    AggregateTotals, CostLookup, ExclusiveTotals, ProfitReport, ReportMeta, SkuProfitSummary,
    TransactionRecord, UNKNOWN_PRODUCT,
};
use crate::ranking::{sort_skus, SkuSortKey};

/// Run the profit model over `transactions` joined with `costs`.
///
/// Validates `config` first; nothing else in the run can fail.
pub fn run(
    config: &ProfitConfig,
    transactions: &[TransactionRecord],
    costs: &CostLookup,
) -> Result<ProfitReport, ReconError> {
    config.validate()?;

    let window = config.window();
    let filtered = filter_window(transactions, window);
    log::debug!(
        "profit run: {} of {} transactions in window {:?}",
        filtered.len(),
        transactions.len(),
        window
    );

    let sums = aggregate_by_sku(filtered.iter().copied());
    let mut skus: Vec<SkuProfitSummary> = sums
        .iter()
        .map(|s| price_sku(s, costs, config))
        .collect();

    let unmatched_skus: Vec<String> = skus
        .iter()
        .filter(|s| !s.catalog_match && !s.sku.is_empty())
        .map(|s| s.sku.clone())
        .collect();
    if !unmatched_skus.is_empty() {
        log::warn!(
            "{} SKU(s) have no cost catalog entry and are costed at 0",
            unmatched_skus.len()
        );
    }

    let totals = compute_totals(&filtered, &skus, config, costs.has_exclusive_cost());
    sort_skus(&mut skus, SkuSortKey::ProfitInclusive, true);

    Ok(ProfitReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            transactions_in: transactions.len(),
            transactions_used: filtered.len(),
            window,
            has_exclusive_cost: costs.has_exclusive_cost(),
        },
        totals,
        skus,
        unmatched_skus,
        daily: daily_trend(&filtered),
    })
}

/// Join one SKU's bucket sums with its cost record and compute profit.
fn price_sku(sums: &SkuBucketSums, costs: &CostLookup, config: &ProfitConfig) -> SkuProfitSummary {
    let record = costs.get(&sums.sku);
    let rate = config.exchange_rate;
    let rf = config.recovery_fraction();

    let unit_inclusive = record.map_or(0.0, |r| r.cost_inclusive);
    let consumed = sums.order_qty + sums.adj_qty;
    let payout_local = sums.total * rate;

    let cost_inclusive = consumed * unit_inclusive;
    let recovery_inclusive = sums.refund_qty * unit_inclusive * rf;
    let cost_total_inclusive = cost_inclusive - recovery_inclusive;
    let profit_inclusive = payout_local - cost_total_inclusive;

    let (cost_exclusive, recovery_exclusive, cost_total_exclusive, profit_exclusive) =
        if costs.has_exclusive_cost() {
            let unit = record.and_then(|r| r.cost_exclusive).unwrap_or(0.0);
            let cost = consumed * unit;
            let recovery = sums.refund_qty * unit * rf;
            (
                Some(cost),
                Some(recovery),
                Some(cost - recovery),
                Some(payout_local - (cost - recovery)),
            )
        } else {
            (None, None, None, None)
        };

    SkuProfitSummary {
        sku: sums.sku.clone(),
        product_name: record.map_or_else(|| UNKNOWN_PRODUCT.to_string(), |r| r.product_name.clone()),
        catalog_match: record.is_some(),
        order_qty: sums.order_qty,
        refund_qty: sums.refund_qty,
        adj_qty: sums.adj_qty,
        gross_sales: sums.product_sales,
        net_payout: sums.total,
        cost_inclusive,
        recovery_inclusive,
        cost_total_inclusive,
        profit_inclusive,
        cost_exclusive,
        recovery_exclusive,
        cost_total_exclusive,
        profit_exclusive,
        margin: margin(profit_inclusive, sums.product_sales * rate),
    }
}

/// Profit over sales, 0 unless sales are strictly positive.
fn margin(profit: f64, sales_local: f64) -> f64 {
    if sales_local > 0.0 {
        let m = profit / sales_local;
        if m.is_finite() {
            return m;
        }
    }
    0.0
}

fn compute_totals(
    filtered: &[&TransactionRecord],
    skus: &[SkuProfitSummary],
    config: &ProfitConfig,
    has_exclusive_cost: bool,
) -> AggregateTotals {
    let rate = config.exchange_rate;

    let gross_sales: f64 = filtered.iter().map(|t| t.product_sales).sum();
    let net_payout: f64 = filtered
        .iter()
        .filter(|t| !is_transfer(&t.transaction_type))
        .map(|t| t.total)
        .sum();
    let advertising_spend = filtered
        .iter()
        .filter(|t| t.is_advertising)
        .map(|t| t.total)
        .sum::<f64>()
        .abs();
    let transfer_total = filtered
        .iter()
        .filter(|t| is_transfer(&t.transaction_type))
        .map(|t| t.total)
        .sum::<f64>()
        .abs();
    let selling_fees = filtered.iter().map(|t| t.selling_fees).sum::<f64>().abs();
    let fba_fees = filtered.iter().map(|t| t.fba_fees).sum::<f64>().abs();

    let ad_permille = if gross_sales > 0.0 {
        advertising_spend / gross_sales * 1000.0
    } else {
        0.0
    };

    let net_payout_local = net_payout * rate;
    let total_cost_inclusive: f64 = skus.iter().map(|s| s.cost_inclusive).sum();
    let total_recovery_inclusive: f64 = skus.iter().map(|s| s.recovery_inclusive).sum();
    let net_profit_inclusive =
        net_payout_local - total_cost_inclusive + total_recovery_inclusive - config.manual_freight;

    let exclusive = has_exclusive_cost.then(|| {
        let total_cost: f64 = skus.iter().filter_map(|s| s.cost_exclusive).sum();
        let total_recovery: f64 = skus.iter().filter_map(|s| s.recovery_exclusive).sum();
        ExclusiveTotals {
            total_cost,
            total_recovery,
            net_profit: net_payout_local - total_cost + total_recovery - config.manual_freight,
        }
    });

    AggregateTotals {
        gross_sales,
        gross_sales_local: gross_sales * rate,
        net_payout,
        net_payout_local,
        advertising_spend,
        advertising_spend_local: advertising_spend * rate,
        ad_permille,
        transfer_total,
        selling_fees,
        selling_fees_local: selling_fees * rate,
        fba_fees,
        fba_fees_local: fba_fees * rate,
        manual_freight: config.manual_freight,
        total_cost_inclusive,
        total_recovery_inclusive,
        net_profit_inclusive,
        exclusive,
    }
}
