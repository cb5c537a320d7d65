use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Scalar parameters for one profit run.
///
/// `exchange_rate` converts settlement currency (USD) into the local
/// currency that costs and freight are expressed in. `recovery_rate` is the
/// integer percentage of a returned unit's cost assumed resellable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProfitConfig {
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
    #[serde(default = "default_recovery_rate")]
    pub recovery_rate: u8,
    #[serde(default)]
    pub manual_freight: f64,
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

fn default_exchange_rate() -> f64 {
    7.0
}

fn default_recovery_rate() -> u8 {
    50
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            exchange_rate: default_exchange_rate(),
            recovery_rate: default_recovery_rate(),
            manual_freight: 0.0,
            date_range: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive calendar window. Either end may be missing while the user is
/// still picking; a partial or inverted range filters nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both ends, in order. `None` means "use the full set".
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ProfitConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ProfitConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.exchange_rate.is_finite() || self.exchange_rate <= 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "exchange_rate must be > 0, got {}",
                self.exchange_rate
            )));
        }

        if self.recovery_rate > 100 {
            return Err(ReconError::ConfigValidation(format!(
                "recovery_rate must be within 0..=100, got {}",
                self.recovery_rate
            )));
        }

        if !self.manual_freight.is_finite() || self.manual_freight < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "manual_freight must be >= 0, got {}",
                self.manual_freight
            )));
        }

        Ok(())
    }

    /// Recovery rate as a fraction in `[0, 1]`.
    pub fn recovery_fraction(&self) -> f64 {
        f64::from(self.recovery_rate) / 100.0
    }

    /// The validated window, if the configured range is complete.
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range.as_ref().and_then(DateRange::bounds)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
