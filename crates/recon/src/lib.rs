//! `skuprofit-recon`: settlement-to-cost reconciliation and SKU profit engine.
//!
//! Pure engine crate: receives parsed transactions and a cost lookup, returns
//! aggregate totals, the per-SKU profit table and the audit ledger.
//! No file-format dependencies.

pub mod aggregate;
pub mod audit;
pub mod classify;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod model;
pub mod ranking;

pub use audit::build_audit;
pub use config::{DateRange, ProfitConfig};
pub use derived::{date_bounds, filter_window};
pub use engine::run;
pub use error::ReconError;
pub use model::{
    AggregateTotals, AuditLedger, AuditLine, CostCatalog, CostLookup, CostRecord, ProfitReport,
    Settlement, SkuProfitSummary, TransactionRecord, UNKNOWN_PRODUCT,
};
pub use ranking::SkuSortKey;
