//! Date-window filtering and the date-keyed series layered on top of it.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{DailyTotal, TransactionRecord};

/// Types that make up the daily trend series.
const TREND_TYPES: [&str; 2] = ["Order", "Refund"];

/// Keep transactions whose calendar date falls inside `window` (inclusive).
///
/// With no window every transaction is kept. With a window, undated rows are
/// dropped since they cannot be placed inside it.
pub fn filter_window(
    transactions: &[TransactionRecord],
    window: Option<(NaiveDate, NaiveDate)>,
) -> Vec<&TransactionRecord> {
    match window {
        None => transactions.iter().collect(),
        Some((start, end)) => transactions
            .iter()
            .filter(|t| t.date().is_some_and(|d| d >= start && d <= end))
            .collect(),
    }
}

/// Earliest and latest calendar date in the sequence.
pub fn date_bounds(transactions: &[TransactionRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = transactions.iter().filter_map(TransactionRecord::date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Per-day sums of `total` for `Order` and `Refund` rows (exact type match),
/// ordered by date then type.
pub fn daily_trend(transactions: &[&TransactionRecord]) -> Vec<DailyTotal> {
    let mut cells: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();

    for txn in transactions {
        let Some(date) = txn.date() else {
            continue;
        };
        if !TREND_TYPES.contains(&txn.transaction_type.as_str()) {
            continue;
        }
        *cells.entry((date, txn.transaction_type.as_str())).or_insert(0.0) += txn.total;
    }

    cells
        .into_iter()
        .map(|((date, kind), total)| DailyTotal {
            date,
            transaction_type: kind.to_string(),
            total,
        })
        .collect()
}
