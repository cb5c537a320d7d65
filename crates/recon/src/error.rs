use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config value outside its valid domain (exchange rate, recovery rate, freight).
    ConfigValidation(String),
    /// Input bytes could not be read as a table at all.
    Unreadable { source: String, reason: String },
    /// Spreadsheet opened but contains no sheets.
    EmptyWorkbook,
    /// Audit export could not be serialized.
    Export(String),
}

impl ReconError {
    pub fn unreadable(source: &str, reason: impl fmt::Display) -> Self {
        Self::Unreadable {
            source: source.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Unreadable { source, reason } => {
                write!(f, "{source}: file unreadable: {reason}")
            }
            Self::EmptyWorkbook => write!(f, "spreadsheet contains no sheets"),
            Self::Export(msg) => write!(f, "audit export error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
