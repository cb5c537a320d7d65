// Delimited text decoding, delimiter sniffing and table reading

use skuprofit_recon::ReconError;

use crate::table::Table;

/// Decode bytes as UTF-8, dropping a BOM and substituting U+FFFD for
/// undecodable sequences instead of failing.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        log::debug!("input contained invalid UTF-8; replaced undecodable bytes");
    }
    text.into_owned()
}

const DELIMITERS: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_LINES: usize = 10;

/// Guess the field delimiter from the first non-blank lines.
///
/// A candidate must split the header line into several fields; among those,
/// the one scoring `header width × lines agreeing with it` wins, earlier
/// candidates winning ties. Falls back to a comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = (b',', 0usize);
    for delim in DELIMITERS {
        let widths: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();
        let Some(&header) = widths.first().filter(|&&w| w > 1) else {
            continue;
        };
        let score = header * widths.iter().filter(|&&w| w == header).count();
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

/// Fields on a single line, honouring quotes.
fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |r| r.len())
}

/// Parse delimited text into a [`Table`]; the first non-blank record is the header.
pub fn read_table(source: &str, content: &str, delimiter: u8) -> Result<Table, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ReconError::unreadable(source, e))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::from_records(records))
}

/// Decode, sniff and read in one step.
pub fn read_table_sniffed(source: &str, content: &str) -> Result<Table, ReconError> {
    let delimiter = sniff_delimiter(content);
    log::debug!("{source}: sniffed delimiter {:?}", delimiter as char);
    read_table(source, content, delimiter)
}
