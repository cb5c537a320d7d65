// Audit ledger export (xlsx and csv)

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use skuprofit_recon::{AuditLedger, AuditLine, ReconError};

use crate::settlement::{MONEY_COLUMNS, QUANTITY_COLUMN, SKU_COLUMN, TYPE_COLUMN};
use crate::table::parse_number;

pub const UNIT_COST_COLUMN: &str = "unit_cost";
pub const LINE_PROFIT_COLUMN: &str = "line_profit";
pub const AUDIT_SHEET_NAME: &str = "Audit";

/// Column layout of an exported ledger: `type` and `sku` (prepended when the
/// settlement lacked them), the settlement columns, then the two audit columns.
struct Layout {
    headers: Vec<String>,
    prefix: Vec<&'static str>,
}

impl Layout {
    fn of(ledger: &AuditLedger) -> Self {
        let prefix: Vec<&'static str> = [TYPE_COLUMN, SKU_COLUMN]
            .into_iter()
            .filter(|c| !ledger.columns.iter().any(|h| h.as_str() == *c))
            .collect();
        let headers = prefix
            .iter()
            .map(|c| c.to_string())
            .chain(ledger.columns.iter().cloned())
            .chain([UNIT_COST_COLUMN.to_string(), LINE_PROFIT_COLUMN.to_string()])
            .collect();
        Self { headers, prefix }
    }

    /// Text of every settlement-side cell for one line, in header order.
    fn row_text<'a>(&self, ledger: &'a AuditLedger, line: &'a AuditLine) -> Vec<&'a str> {
        let label = |col: &str| -> Option<&'a str> {
            match col {
                TYPE_COLUMN => Some(line.transaction_type.as_str()),
                SKU_COLUMN => Some(line.sku.as_str()),
                _ => None,
            }
        };
        let prefix = self.prefix.iter().filter_map(|c| label(*c));
        let body = ledger.columns.iter().enumerate().map(|(i, col)| {
            label(col.as_str()).unwrap_or_else(|| line.fields.get(i).map(String::as_str).unwrap_or(""))
        });
        prefix.chain(body).collect()
    }
}

fn is_numeric_column(name: &str) -> bool {
    name == QUANTITY_COLUMN || MONEY_COLUMNS.contains(&name)
}

/// Serialize the ledger as a single-sheet workbook.
pub fn write_audit_xlsx(ledger: &AuditLedger) -> Result<Vec<u8>, ReconError> {
    let mut workbook = build_workbook(ledger)?;
    workbook
        .save_to_buffer()
        .map_err(|e| ReconError::Export(format!("failed to serialize workbook: {e}")))
}

/// Write the ledger workbook to `path`.
pub fn save_audit_xlsx(ledger: &AuditLedger, path: &Path) -> Result<(), ReconError> {
    let mut workbook = build_workbook(ledger)?;
    workbook
        .save(path)
        .map_err(|e| ReconError::Export(format!("failed to save {}: {e}", path.display())))
}

fn build_workbook(ledger: &AuditLedger) -> Result<Workbook, ReconError> {
    let layout = Layout::of(ledger);
    let export_err = |e: rust_xlsxwriter::XlsxError| ReconError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(AUDIT_SHEET_NAME)
        .map_err(export_err)?;

    let bold = Format::new().set_bold();
    for (col, header) in layout.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &bold)
            .map_err(export_err)?;
    }
    worksheet.set_freeze_panes(1, 0).map_err(export_err)?;

    let audit_col = layout.headers.len() - 2;
    for (i, line) in ledger.lines.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, text) in layout.row_text(ledger, line).into_iter().enumerate() {
            let col16 = col as u16;
            if is_numeric_column(&layout.headers[col]) && !text.is_empty() {
                worksheet
                    .write_number(row, col16, parse_number(text))
                    .map_err(export_err)?;
            } else if !text.is_empty() {
                worksheet.write_string(row, col16, text).map_err(export_err)?;
            }
        }
        if let Some(unit_cost) = line.unit_cost {
            worksheet
                .write_number(row, audit_col as u16, unit_cost)
                .map_err(export_err)?;
        }
        worksheet
            .write_number(row, (audit_col + 1) as u16, line.line_profit)
            .map_err(export_err)?;
    }

    Ok(workbook)
}

/// Serialize the ledger as comma-separated text with a header row.
pub fn write_audit_csv(ledger: &AuditLedger) -> Result<String, ReconError> {
    let layout = Layout::of(ledger);
    let export_err = |e: csv::Error| ReconError::Export(e.to_string());

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&layout.headers).map_err(export_err)?;

    for line in &ledger.lines {
        let mut record: Vec<String> = layout
            .row_text(ledger, line)
            .into_iter()
            .map(str::to_string)
            .collect();
        record.push(line.unit_cost.map(|c| c.to_string()).unwrap_or_default());
        record.push(line.line_profit.to_string());
        writer.write_record(&record).map_err(export_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReconError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::read_sheets;

    fn ledger() -> AuditLedger {
        let columns: Vec<String> = ["date/time", "type", "sku", "quantity", "total"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let fields = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        AuditLedger {
            columns,
            lines: vec![
                AuditLine {
                    transaction_type: "Order".into(),
                    sku: "A".into(),
                    fields: fields(&["2026-01-05 10:00:00", "Order", "A", "2", "100"]),
                    unit_cost: Some(10.0),
                    line_profit: 680.0,
                },
                AuditLine {
                    transaction_type: "ADJUSTMENT".into(),
                    sku: "MANUAL_FREIGHT".into(),
                    fields: fields(&["", "", "", "", ""]),
                    unit_cost: None,
                    line_profit: -50.0,
                },
            ],
        }
    }

    #[test]
    fn csv_has_audit_columns_and_freight_label() {
        let text = write_audit_csv(&ledger()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date/time,type,sku,quantity,total,unit_cost,line_profit");
        assert_eq!(lines[1], "2026-01-05 10:00:00,Order,A,2,100,10,680");
        assert_eq!(lines[2], ",ADJUSTMENT,MANUAL_FREIGHT,,,,-50");
    }

    #[test]
    fn missing_label_columns_are_prepended() {
        let mut l = ledger();
        l.columns = vec!["total".into()];
        for line in &mut l.lines {
            line.fields.truncate(1);
        }
        let text = write_audit_csv(&l).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "type,sku,total,unit_cost,line_profit");
        assert_eq!(lines[2], "ADJUSTMENT,MANUAL_FREIGHT,,,-50");
    }

    #[test]
    fn xlsx_round_trips_through_reader() {
        let bytes = write_audit_xlsx(&ledger()).unwrap();
        let sheets = read_sheets("audit.xlsx", &bytes).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, AUDIT_SHEET_NAME);

        let table = &sheets[0].table;
        assert_eq!(table.headers.last().map(String::as_str), Some(LINE_PROFIT_COLUMN));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][3], "2");
        assert_eq!(table.rows[0][6], "680");
        assert_eq!(table.rows[1][1], "ADJUSTMENT");
        assert_eq!(table.rows[1][2], "MANUAL_FREIGHT");
        assert_eq!(table.rows[1][6], "-50");
    }

    #[test]
    fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.xlsx");
        save_audit_xlsx(&ledger(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }
}
