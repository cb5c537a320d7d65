//! Settlement export parser.
//!
//! Settlement exports open with a free-text preamble of unknown length; the
//! real header is the first line naming both `settlement id` and `type`.
//! Cells are normalized in place so that downstream consumers (including the
//! audit export) see upper-cased SKUs, plain numbers and timezone-free
//! timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use skuprofit_recon::{ReconError, Settlement, TransactionRecord};

use crate::csv::{decode_lossy, read_table_sniffed};
use crate::table::{cell, parse_number};

pub const TYPE_COLUMN: &str = "type";
pub const SKU_COLUMN: &str = "sku";
pub const DATETIME_COLUMN: &str = "date/time";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const QUANTITY_COLUMN: &str = "quantity";
/// Read as a quantity only when `quantity` is absent.
pub const QUANTITY_FALLBACK_COLUMN: &str = "amount-description";

/// Monetary columns coerced to numbers.
pub const MONEY_COLUMNS: [&str; 4] = ["total", "product sales", "selling fees", "fba fees"];

const ADVERTISING_TOKEN: &str = "advertising";

/// Trailing zone abbreviations stripped before timestamp parsing.
const TIMEZONE_SUFFIXES: &[&str] = &[
    "PDT", "PST", "MDT", "MST", "CDT", "CST", "EDT", "EST", "AKDT", "AKST", "HST", "UTC", "GMT",
    "BST", "CET", "CEST", "JST", "AEST", "AEDT",
];

const DATETIME_FORMATS: &[&str] = &[
    "%b %d, %Y %I:%M:%S %p",
    "%b %d, %Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y", "%d.%m.%Y", "%d %b %Y",
];

/// Parse raw settlement bytes into typed transactions.
///
/// Never fails on cell contents; only a table the CSV reader cannot walk is
/// reported as unreadable.
pub fn parse_settlement(bytes: &[u8]) -> Result<Settlement, ReconError> {
    let text = decode_lossy(bytes);
    let body = &text[header_offset(&text)..];
    let table = read_table_sniffed("settlement", body)?;

    let columns: Vec<String> = table.headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let col = |name: &str| columns.iter().position(|c| c == name);

    let type_idx = col(TYPE_COLUMN);
    let sku_idx = col(SKU_COLUMN);
    let datetime_idx = col(DATETIME_COLUMN);
    let description_idx = col(DESCRIPTION_COLUMN);
    let quantity_idx = col(QUANTITY_COLUMN).or_else(|| col(QUANTITY_FALLBACK_COLUMN));
    let money_idx: Vec<Option<usize>> = MONEY_COLUMNS.iter().map(|&m| col(m)).collect();

    let mut transactions = Vec::with_capacity(table.rows.len());
    let mut undated = 0usize;
    for row in &table.rows {
        let mut fields: Vec<String> = (0..columns.len()).map(|i| cell(row, i).to_string()).collect();

        let sku = match sku_idx {
            Some(i) => {
                let sku = normalize_sku(&fields[i]);
                fields[i] = sku.clone();
                sku
            }
            None => String::new(),
        };

        let timestamp = datetime_idx.and_then(|i| {
            let stripped = strip_timezone(&fields[i]).to_string();
            fields[i] = stripped;
            parse_timestamp(&fields[i])
        });
        if datetime_idx.is_some() && timestamp.is_none() {
            undated += 1;
        }

        let mut money = [0.0; 4];
        for (slot, idx) in money.iter_mut().zip(&money_idx) {
            if let Some(i) = *idx {
                *slot = parse_number(&fields[i]);
                fields[i] = slot.to_string();
            }
        }
        let [total, product_sales, selling_fees, fba_fees] = money;

        transactions.push(TransactionRecord {
            transaction_type: type_idx.map(|i| fields[i].clone()).unwrap_or_default(),
            sku,
            timestamp,
            total,
            product_sales,
            selling_fees,
            fba_fees,
            quantity: quantity_idx.map_or(0.0, |i| parse_number(&fields[i])),
            is_advertising: description_idx
                .is_some_and(|i| fields[i].to_lowercase().contains(ADVERTISING_TOKEN)),
            fields,
        });
    }

    if undated * 2 > transactions.len() {
        log::warn!(
            "settlement: {undated} of {} timestamps could not be parsed; date filtering will drop those rows",
            transactions.len()
        );
    }
    log::debug!(
        "settlement: {} columns, {} transactions",
        columns.len(),
        transactions.len()
    );
    Ok(Settlement {
        columns,
        transactions,
    })
}

/// Byte offset of the header line, or 0 when no line qualifies.
fn header_offset(text: &str) -> usize {
    let mut offset = 0;
    for (line_no, line) in text.split_inclusive('\n').enumerate() {
        let lower = line.to_lowercase();
        if lower.contains("settlement id") && lower.contains("type") {
            log::debug!("settlement: header on line {}, {} preamble line(s) skipped", line_no + 1, line_no);
            return offset;
        }
        offset += line.len();
    }
    log::warn!("settlement: no 'settlement id'/'type' header line found; reading from line 1");
    0
}

pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn strip_timezone(raw: &str) -> &str {
    let trimmed = raw.trim();
    for tz in TIMEZONE_SUFFIXES {
        if let Some(rest) = trimmed.strip_suffix(tz) {
            if rest.ends_with(' ') {
                return rest.trim_end();
            }
        }
    }
    trimmed
}

/// Parse a zone-free settlement timestamp; date-only values land at midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMAZON_PREAMBLE: &str = "\
\"Includes Amazon Marketplace, Fulfillment by Amazon (FBA), and Amazon Webstore transactions\"
\"All amounts in USD, unless specified\"
\"date/time\",\"settlement id\",\"type\",\"order id\",\"sku\",\"description\",\"quantity\",\"product sales\",\"selling fees\",\"fba fees\",\"total\"
\"Jan 5, 2026 1:02:03 AM PST\",\"111\",\"Order\",\"113-1\",\" abc-1 \",\"Widget\",\"2\",\"120.00\",\"-18.00\",\"-6.50\",\"95.50\"
\"Jan 6, 2026 11:15:00 PM PDT\",\"111\",\"Refund\",\"113-1\",\"abc-1\",\"Widget\",\"1\",\"-60.00\",\"9.00\",\"0\",\"-51.00\"
\"Jan 7, 2026 9:00:00 AM PST\",\"111\",\"Service Fee\",\"\",\"\",\"Cost of Advertising\",\"\",\"0\",\"0\",\"0\",\"-1,234.56\"
\"Jan 8, 2026 9:00:00 AM PST\",\"111\",\"Transfer\",\"\",\"\",\"To account ending in: 123\",\"\",\"0\",\"0\",\"0\",\"-500.00\"
";

    #[test]
    fn skips_preamble_and_normalizes() {
        let settlement = parse_settlement(AMAZON_PREAMBLE.as_bytes()).unwrap();
        assert_eq!(settlement.columns[0], "date/time");
        assert_eq!(settlement.transactions.len(), 4);

        let order = &settlement.transactions[0];
        assert_eq!(order.transaction_type, "Order");
        assert_eq!(order.sku, "ABC-1");
        assert_eq!(order.quantity, 2.0);
        assert_eq!(order.product_sales, 120.0);
        assert_eq!(order.selling_fees, -18.0);
        assert_eq!(order.fba_fees, -6.5);
        assert_eq!(order.total, 95.5);
        assert_eq!(
            order.timestamp,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_hms_opt(1, 2, 3)
        );
        assert!(!order.is_advertising);

        let late = &settlement.transactions[1];
        assert_eq!(late.date(), NaiveDate::from_ymd_opt(2026, 1, 6));
        assert_eq!(late.timestamp.unwrap().time().to_string(), "23:15:00");

        let ad = &settlement.transactions[2];
        assert!(ad.is_advertising);
        assert_eq!(ad.total, -1234.56);
        assert_eq!(ad.sku, "");
    }

    #[test]
    fn fields_hold_normalized_cells() {
        let settlement = parse_settlement(AMAZON_PREAMBLE.as_bytes()).unwrap();
        let sku_col = settlement.columns.iter().position(|c| c == "sku").unwrap();
        let total_col = settlement.columns.iter().position(|c| c == "total").unwrap();
        let dt_col = settlement.columns.iter().position(|c| c == "date/time").unwrap();

        let order = &settlement.transactions[0];
        assert_eq!(order.fields[sku_col], "ABC-1");
        assert_eq!(order.fields[dt_col], "Jan 5, 2026 1:02:03 AM");
        assert_eq!(settlement.transactions[2].fields[total_col], "-1234.56");
    }

    #[test]
    fn no_preamble_reads_from_first_line() {
        let csv = "type,sku,quantity,total\nOrder,abc,1,10\n";
        let settlement = parse_settlement(csv.as_bytes()).unwrap();
        assert_eq!(settlement.transactions.len(), 1);
        assert_eq!(settlement.transactions[0].sku, "ABC");
        assert_eq!(settlement.transactions[0].total, 10.0);
        assert_eq!(settlement.transactions[0].timestamp, None);
    }

    #[test]
    fn tab_delimited_with_crlf() {
        let tsv = "report\r\nsettlement id\ttype\tsku\ttotal\r\n1\tOrder\tx1\t5.25\r\n";
        let settlement = parse_settlement(tsv.as_bytes()).unwrap();
        assert_eq!(settlement.columns, vec!["settlement id", "type", "sku", "total"]);
        assert_eq!(settlement.transactions[0].sku, "X1");
        assert_eq!(settlement.transactions[0].total, 5.25);
    }

    #[test]
    fn missing_columns_default() {
        let csv = "settlement id,type\n1,Order\n2,\n";
        let settlement = parse_settlement(csv.as_bytes()).unwrap();
        let t = &settlement.transactions[0];
        assert_eq!(t.sku, "");
        assert_eq!(t.total, 0.0);
        assert_eq!(t.quantity, 0.0);
        assert!(!t.is_advertising);
        assert_eq!(settlement.transactions[1].transaction_type, "");
    }

    #[test]
    fn malformed_cells_degrade() {
        let csv = "settlement id,type,sku,date/time,quantity,total\n1,Order,a,not a date,two,abc\n";
        let t = &parse_settlement(csv.as_bytes()).unwrap().transactions[0];
        assert_eq!(t.timestamp, None);
        assert_eq!(t.quantity, 0.0);
        assert_eq!(t.total, 0.0);
    }

    #[test]
    fn quantity_falls_back_to_amount_description() {
        let csv = "settlement id,type,sku,amount-description,total\n1,Order,a,3,10\n2,Order,b,Principal,10\n";
        let settlement = parse_settlement(csv.as_bytes()).unwrap();
        assert_eq!(settlement.transactions[0].quantity, 3.0);
        assert_eq!(settlement.transactions[1].quantity, 0.0);
    }

    #[test]
    fn quantity_column_wins_over_fallback() {
        let csv = "settlement id,type,quantity,amount-description\n1,Order,2,7\n";
        let settlement = parse_settlement(csv.as_bytes()).unwrap();
        assert_eq!(settlement.transactions[0].quantity, 2.0);
    }

    #[test]
    fn header_names_are_trimmed_and_lowercased() {
        let csv = " Settlement ID , Type ,SKU , Total \n1,Order,a,1\n";
        let settlement = parse_settlement(csv.as_bytes()).unwrap();
        assert_eq!(settlement.columns, vec!["settlement id", "type", "sku", "total"]);
        assert_eq!(settlement.transactions[0].total, 1.0);
    }

    #[test]
    fn invalid_utf8_is_substituted() {
        let mut bytes = b"settlement id,type,sku,description,total\n1,Order,a,caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b",3\n");
        let settlement = parse_settlement(&bytes).unwrap();
        assert_eq!(settlement.transactions[0].total, 3.0);
    }

    #[test]
    fn timestamp_formats() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(parse_timestamp("2026-01-05 10:00:00").unwrap().date(), d(2026, 1, 5));
        assert_eq!(parse_timestamp("2026-01-05T10:00:00+09:00").unwrap().date(), d(2026, 1, 5));
        assert_eq!(parse_timestamp("01/31/2026 10:00:00 PM").unwrap().date(), d(2026, 1, 31));
        assert_eq!(parse_timestamp("31.01.2026 10:00:00").unwrap().date(), d(2026, 1, 31));
        assert_eq!(parse_timestamp("2026-01-05").unwrap().date(), d(2026, 1, 5));
        assert_eq!(parse_timestamp("1 Jan 2026 00:08:04").unwrap().date(), d(2026, 1, 1));
        assert_eq!(parse_timestamp("14 February 2026 23:59:00").unwrap().date(), d(2026, 2, 14));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn day_first_gmt_rows_keep_their_timestamp() {
        let text = "date/time,settlement id,type,sku,total\n\
                    1 Jan 2026 00:08:04 GMT,7,Order,mug,12.00\n\
                    31 Jan 2026 23:30:00 GMT,7,Refund,mug,-4.00\n";
        let settlement = parse_settlement(text.as_bytes()).unwrap();
        let stamps: Vec<_> = settlement.transactions.iter().map(|t| t.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(0, 8, 4),
                NaiveDate::from_ymd_opt(2026, 1, 31).unwrap().and_hms_opt(23, 30, 0),
            ]
        );
        assert_eq!(settlement.transactions[0].fields[0], "1 Jan 2026 00:08:04");
    }

    #[test]
    fn timezone_suffix_stripping() {
        assert_eq!(strip_timezone("Jan 5, 2026 1:02:03 AM PST"), "Jan 5, 2026 1:02:03 AM");
        assert_eq!(strip_timezone("2026-01-05 10:00:00 UTC"), "2026-01-05 10:00:00");
        assert_eq!(strip_timezone("2026-01-05 10:00:00"), "2026-01-05 10:00:00");
        // Only whole trailing tokens are removed
        assert_eq!(strip_timezone("BEST"), "BEST");
    }
}
