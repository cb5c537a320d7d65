// File I/O for the profit engine: settlement and catalog parsing, audit export

pub mod cache;
pub mod catalog;
pub mod csv;
pub mod export;
pub mod session;
pub mod settlement;
pub mod table;
pub mod xlsx;

pub use cache::{CacheStats, ContentHash, ParseCache};
pub use catalog::{parse_catalog, CatalogFormat};
pub use export::{save_audit_xlsx, write_audit_csv, write_audit_xlsx};
pub use session::{load_file, CatalogInput, Reconciler, RunOutput};
pub use settlement::parse_settlement;
