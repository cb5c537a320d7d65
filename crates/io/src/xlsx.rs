// Spreadsheet import (xlsx, xls, xlsb, ods) for cost catalogs

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use skuprofit_recon::ReconError;

use crate::table::{format_number, Table};

/// Maximum dimensions read from a single sheet
const MAX_ROWS: usize = 65536;
const MAX_COLS: usize = 256;

/// One worksheet read as text.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: String,
    pub table: Table,
}

/// Read every sheet of a workbook held in memory, in workbook order.
pub fn read_sheets(source: &str, bytes: &[u8]) -> Result<Vec<SheetTable>, ReconError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ReconError::unreadable(source, format!("failed to open spreadsheet: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ReconError::EmptyWorkbook);
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            ReconError::unreadable(source, format!("failed to read sheet '{name}': {e}"))
        })?;

        let (height, width) = range.get_size();
        if height > MAX_ROWS || width > MAX_COLS {
            log::warn!(
                "{source}: sheet '{name}' truncated from {height}x{width} to {}x{}",
                height.min(MAX_ROWS),
                width.min(MAX_COLS)
            );
        }

        let records: Vec<Vec<String>> = range
            .rows()
            .take(MAX_ROWS)
            .map(|row| row.iter().take(MAX_COLS).map(cell_text).collect())
            .collect();

        sheets.push(SheetTable {
            name,
            table: Table::from_records(records),
        });
    }

    Ok(sheets)
}

#[allow(unreachable_patterns)]
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Format nicely: integers without decimals
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn reads_all_sheets_in_order() {
        let mut wb = Workbook::new();
        let first = wb.add_worksheet();
        first.set_name("Notes").unwrap();
        first.write_string(0, 0, "hello").unwrap();
        let second = wb.add_worksheet();
        second.set_name("Costs").unwrap();
        second.write_string(0, 0, "品名").unwrap();
        second.write_string(0, 1, "SKU").unwrap();
        second.write_string(1, 0, "杯子").unwrap();
        second.write_number(1, 1, 12345.0).unwrap();
        let bytes = wb.save_to_buffer().unwrap();

        let sheets = read_sheets("costs.xlsx", &bytes).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "Notes");
        assert_eq!(sheets[1].name, "Costs");
        assert_eq!(sheets[1].table.headers, vec!["品名", "SKU"]);
        assert_eq!(sheets[1].table.rows[0], vec!["杯子", "12345"]);
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        let err = read_sheets("costs.xlsx", b"PK\x03\x04 definitely not a zip").unwrap_err();
        assert!(matches!(err, ReconError::Unreadable { .. }));
    }
}
