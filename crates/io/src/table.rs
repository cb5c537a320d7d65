// Header-plus-rows text table shared by the CSV and workbook readers

/// A header row followed by ragged data rows, all as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// First record is the header row. Blank records are dropped.
    pub fn from_records(records: Vec<Vec<String>>) -> Self {
        let mut records = records
            .into_iter()
            .filter(|r| r.iter().any(|c| !c.trim().is_empty()));
        let headers = records.next().unwrap_or_default();
        Self {
            headers,
            rows: records.collect(),
        }
    }
}

/// Cell text, empty when the row is shorter than the header.
pub fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Lenient numeric coercion: thousands separators stripped, anything
/// unparseable or non-finite becomes 0.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw.trim().chars().filter(|&c| c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Render a spreadsheet float the way a user typed it: integers without decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn first_non_blank_record_is_header() {
        let table = Table::from_records(vec![
            rec(&["", " "]),
            rec(&["a", "b"]),
            rec(&["1", "2"]),
            rec(&["", ""]),
            rec(&["3"]),
        ]);
        assert_eq!(table.headers, rec(&["a", "b"]));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(cell(&table.rows[1], 1), "");
    }

    #[test]
    fn parse_number_is_lenient() {
        assert_eq!(parse_number("1,234.50"), 1234.5);
        assert_eq!(parse_number(" -20 "), -20.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("n/a"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    #[test]
    fn format_number_drops_integer_decimals() {
        assert_eq!(format_number(12345.0), "12345");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-3.0), "-3");
    }
}
