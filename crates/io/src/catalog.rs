//! Cost catalog normalizer.
//!
//! Cost catalogs are hand-maintained spreadsheets: one row per product, a
//! name column, one or two cost columns, and any number of columns whose
//! *values* are SKU codes (single unit, 2-pack, case, ...). Column roles are
//! found by synonym lookup; every remaining column that is not obviously
//! descriptive (weights, images, remarks, ...) is a SKU column. The wide table
//! is then unpivoted into one [`CostRecord`] per SKU.
//!
//! Nothing here fails on shape: a missing name column yields
//! [`UNKNOWN_PRODUCT`], a missing cost column yields 0.

use std::collections::HashSet;

use skuprofit_recon::{CostCatalog, CostRecord, ReconError, UNKNOWN_PRODUCT};

use crate::csv::{decode_lossy, read_table_sniffed};
use crate::settlement::normalize_sku;
use crate::table::{cell, parse_number, Table};
use crate::xlsx::{read_sheets, SheetTable};

// ---------------------------------------------------------------------------
// Role synonyms
// ---------------------------------------------------------------------------

/// Product-name headers, most specific first.
pub const NAME_SYNONYMS: &[&str] = &["中文名", "产品名称", "品名", "product name", "name"];

/// Tax-inclusive cost headers, most specific first.
pub const INCLUSIVE_COST_SYNONYMS: &[&str] = &[
    "销售成本含税",
    "销售成本",
    "成本",
    "含税单价",
    "含税成本",
    "cost incl. tax",
    "unit cost",
    "cost",
];

/// Tax-exclusive cost headers. Absence is normal.
pub const EXCLUSIVE_COST_SYNONYMS: &[&str] = &["销售成本不含税", "不含税成本", "cost excl. tax"];

/// Column names reported when a role had to be synthesized.
const DEFAULT_NAME_COLUMN: &str = "中文名";
const DEFAULT_INCLUSIVE_COLUMN: &str = "销售成本";

/// Header substrings that mark a sheet as a cost catalog.
const SHEET_NAME_TOKENS: &[&str] = &["名", "产品", "name", "product"];
const SHEET_COST_TOKENS: &[&str] = &["成本", "价", "cost", "price"];

/// Whole headers (upper-cased) that are never SKU columns.
const EXCLUDED_HEADERS: &[&str] = &[
    "序号", "ID", "NO", "NO.", "#", "HS", "备注", "图片", "未命名", "UNNAMED", "名", "价", "重", "长",
    "宽", "高", "率", "体积",
];

/// Placeholder fragments left behind by blank or merged header cells.
const PLACEHOLDER_TOKENS: &[&str] = &["UNNAMED", "未命名"];

/// Latin words that mark a descriptive column. Matched against whole words
/// of the header, so `RATE` excludes `Tax Rate` but not `Crate SKU`.
const EXCLUDED_WORDS: &[&str] = &[
    "REMARK", "REMARKS", "NOTE", "NOTES", "IMAGE", "PICTURE", "PHOTO", "NAME", "PRICE", "COST",
    "WEIGHT", "LENGTH", "WIDTH", "HEIGHT", "VOLUME", "RATE", "HS",
];

/// Multi-character CJK fragments that mark a descriptive column.
const EXCLUDED_CJK_TOKENS: &[&str] = &[
    "备注", "图片", "成本", "价格", "重量", "毛重", "净重", "体积", "尺寸", "长度", "宽度", "高度",
    "HS编码",
];

/// Endings of descriptive CJK headers: 英文名, 单价, 毛重, 退货率.
const EXCLUDED_CJK_SUFFIXES: &[char] = &['名', '价', '重', '率'];

/// Cell values that mean "no SKU here" once upper-cased.
const NULL_SKUS: &[&str] = &["", "NAN", "NONE", "NULL"];

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogFormat {
    Delimited,
    Spreadsheet,
}

impl CatalogFormat {
    /// Spreadsheet when the bytes carry a ZIP (xlsx/ods) or OLE2 (xls)
    /// signature or the name has a spreadsheet extension.
    pub fn detect(bytes: &[u8], file_name: Option<&str>) -> Self {
        const ZIP: &[u8] = b"PK\x03\x04";
        const OLE2: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

        if bytes.starts_with(ZIP) || bytes.starts_with(OLE2) {
            return Self::Spreadsheet;
        }
        let by_name = file_name.is_some_and(|name| {
            let lower = name.to_lowercase();
            [".xlsx", ".xlsm", ".xlsb", ".xls", ".ods"]
                .iter()
                .any(|ext| lower.ends_with(ext))
        });
        if by_name {
            Self::Spreadsheet
        } else {
            Self::Delimited
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Normalize raw catalog bytes of the given format.
pub fn parse_catalog(bytes: &[u8], format: CatalogFormat) -> Result<CostCatalog, ReconError> {
    match format {
        CatalogFormat::Delimited => {
            let text = decode_lossy(bytes);
            let table = read_table_sniffed("cost catalog", &text)?;
            Ok(normalize_table(table, None))
        }
        CatalogFormat::Spreadsheet => {
            let mut sheets = read_sheets("cost catalog", bytes)?;
            let idx = select_sheet(&sheets);
            let SheetTable { name, table } = sheets.swap_remove(idx);
            log::debug!("cost catalog: using sheet '{name}'");
            Ok(normalize_table(table, Some(name)))
        }
    }
}

/// First sheet whose header row has both a name-like and a cost-like token;
/// the first sheet when none qualifies or there is only one.
pub fn select_sheet(sheets: &[SheetTable]) -> usize {
    if sheets.len() <= 1 {
        return 0;
    }
    sheets
        .iter()
        .position(|s| {
            let joined = s.table.headers.concat().to_lowercase();
            SHEET_NAME_TOKENS.iter().any(|t| joined.contains(t))
                && SHEET_COST_TOKENS.iter().any(|t| joined.contains(t))
        })
        .unwrap_or(0)
}

/// Index of the header matching the earliest synonym in `synonyms`.
///
/// Synonym order is priority order: a later synonym is only considered when
/// no earlier one is present. Matching ignores ASCII case.
pub fn resolve(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    synonyms
        .iter()
        .find_map(|syn| headers.iter().position(|h| h.eq_ignore_ascii_case(syn)))
}

/// Collapse embedded line breaks and whitespace runs into single spaces.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Resolve roles, pick SKU columns, unpivot and deduplicate.
pub fn normalize_table(table: Table, sheet: Option<String>) -> CostCatalog {
    let headers = clean_headers(&table.headers);

    let name_idx = resolve(&headers, NAME_SYNONYMS);
    let inc_idx = resolve(&headers, INCLUSIVE_COST_SYNONYMS);
    let exc_idx = resolve(&headers, EXCLUSIVE_COST_SYNONYMS);

    if name_idx.is_none() {
        log::debug!("cost catalog: no product name column; using '{UNKNOWN_PRODUCT}'");
    }
    if inc_idx.is_none() {
        log::warn!("cost catalog: no tax-inclusive cost column; all costs are 0");
    }

    let role_columns = [name_idx, inc_idx, exc_idx];
    let sku_columns: Vec<usize> = (0..headers.len())
        .filter(|i| !role_columns.contains(&Some(*i)))
        .filter(|&i| !is_excluded(&headers[i]))
        .collect();
    log::debug!(
        "cost catalog: {} SKU column(s): {:?}",
        sku_columns.len(),
        sku_columns.iter().map(|&i| headers[i].as_str()).collect::<Vec<_>>()
    );

    let unpivoted = unpivot(&table.rows, name_idx, inc_idx, exc_idx, &sku_columns);
    let records = dedupe_keep_last(unpivoted);

    let column_name = |idx: Option<usize>, fallback: &str| {
        idx.map_or_else(|| fallback.to_string(), |i| headers[i].clone())
    };

    CostCatalog {
        records,
        name_column: column_name(name_idx, DEFAULT_NAME_COLUMN),
        inclusive_column: column_name(inc_idx, DEFAULT_INCLUSIVE_COLUMN),
        exclusive_column: exc_idx.map(|i| headers[i].clone()),
        sheet,
    }
}

/// Normalize whitespace, name blank headers `Unnamed: <idx>`, and suffix
/// repeats with `.1`, `.2`, ...
fn clean_headers(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    raw.iter()
        .enumerate()
        .map(|(i, h)| {
            let mut header = normalize_header(h);
            if header.is_empty() {
                header = format!("Unnamed: {i}");
            }
            let base = header.clone();
            let mut n = 1;
            while !seen.insert(header.clone()) {
                header = format!("{base}.{n}");
                n += 1;
            }
            header
        })
        .collect()
}

/// Descriptive columns (weights, images, remarks, ...) are not SKU columns.
///
/// Single-character CJK names only match as the whole header so that variant
/// columns such as `长款SKU` or `高配SKU` survive.
fn is_excluded(header: &str) -> bool {
    let upper = header.trim().to_uppercase();
    if EXCLUDED_HEADERS.contains(&upper.as_str()) || upper.contains('%') {
        return true;
    }
    if PLACEHOLDER_TOKENS.iter().any(|t| upper.contains(t)) {
        return true;
    }
    if is_role_synonym(&upper) {
        return true;
    }
    if upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| EXCLUDED_WORDS.contains(&word))
    {
        return true;
    }
    EXCLUDED_CJK_TOKENS.iter().any(|t| upper.contains(t))
        || upper.ends_with(EXCLUDED_CJK_SUFFIXES)
}

/// A second column carrying a role header (say, another `成本`) is never a
/// SKU column either.
fn is_role_synonym(upper: &str) -> bool {
    [NAME_SYNONYMS, INCLUSIVE_COST_SYNONYMS, EXCLUSIVE_COST_SYNONYMS]
        .iter()
        .flat_map(|list| list.iter())
        .any(|syn| syn.eq_ignore_ascii_case(upper))
}

/// One record per (row, SKU column) with a real SKU value, row-major.
fn unpivot(
    rows: &[Vec<String>],
    name_idx: Option<usize>,
    inc_idx: Option<usize>,
    exc_idx: Option<usize>,
    sku_columns: &[usize],
) -> Vec<CostRecord> {
    let mut out = Vec::new();
    for row in rows {
        let product_name = match name_idx.map(|i| cell(row, i).trim()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => UNKNOWN_PRODUCT.to_string(),
        };
        let cost_inclusive = inc_idx.map_or(0.0, |i| parse_cost(cell(row, i)));
        let cost_exclusive = exc_idx.map(|i| parse_cost(cell(row, i)));

        for &col in sku_columns {
            let sku = normalize_sku(cell(row, col));
            if NULL_SKUS.contains(&sku.as_str()) {
                continue;
            }
            out.push(CostRecord {
                sku,
                product_name: product_name.clone(),
                cost_inclusive,
                cost_exclusive,
            });
        }
    }
    out
}

/// Costs are non-negative; anything else counts as unparseable.
fn parse_cost(raw: &str) -> f64 {
    let n = parse_number(raw);
    if n < 0.0 {
        0.0
    } else {
        n
    }
}

/// Keep the last record per SKU, at the position of that last occurrence.
fn dedupe_keep_last(records: Vec<CostRecord>) -> Vec<CostRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<CostRecord> = records
        .into_iter()
        .rev()
        .filter(|r| seen.insert(r.sku.clone()))
        .collect();
    kept.reverse();
    kept
}
