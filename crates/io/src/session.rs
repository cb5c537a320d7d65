// One reconciliation run over uploaded bytes: parse (memoized), price, audit

use std::path::Path;
use std::sync::Arc;

use skuprofit_recon::{
    build_audit, filter_window, AuditLedger, CostCatalog, ProfitConfig, ProfitReport, ReconError,
    Settlement,
};

use crate::cache::ParseCache;
use crate::catalog::CatalogFormat;

/// Raw catalog upload. The file name only feeds format detection.
#[derive(Debug, Clone, Copy)]
pub struct CatalogInput<'a> {
    pub bytes: &'a [u8],
    pub file_name: Option<&'a str>,
}

impl<'a> CatalogInput<'a> {
    pub fn new(bytes: &'a [u8], file_name: Option<&'a str>) -> Self {
        Self { bytes, file_name }
    }

    pub fn format(&self) -> CatalogFormat {
        CatalogFormat::detect(self.bytes, self.file_name)
    }
}

/// Everything one run produces. Parsed inputs are shared with the cache.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub settlement: Arc<Settlement>,
    pub catalog: Arc<CostCatalog>,
    pub report: ProfitReport,
    pub audit: AuditLedger,
}

/// Owns the parse cache across runs; each run re-prices from cached inputs.
#[derive(Debug, Default)]
pub struct Reconciler {
    cache: ParseCache,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(
        &mut self,
        settlement_bytes: &[u8],
        catalog: CatalogInput<'_>,
        config: &ProfitConfig,
    ) -> Result<RunOutput, ReconError> {
        config.validate()?;

        let settlement = self.cache.settlement(settlement_bytes)?;
        let format = catalog.format();
        log::debug!("cost catalog format: {format:?}");
        let catalog = self.cache.catalog(catalog.bytes, format)?;

        let costs = catalog.lookup();
        let report = skuprofit_recon::run(config, &settlement.transactions, &costs)?;

        let audited = filter_window(&settlement.transactions, config.window());
        let audit = build_audit(&settlement.columns, audited, &costs, config);

        log::info!(
            "reconciled {} transaction(s) over {} SKU(s); net profit {:.2}",
            report.meta.transactions_used,
            report.skus.len(),
            report.totals.net_profit_inclusive
        );

        Ok(RunOutput {
            settlement,
            catalog,
            report,
            audit,
        })
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ParseCache {
        &mut self.cache
    }
}

/// Read an input file whole, naming it in the error when that fails.
pub fn load_file(path: &Path) -> Result<Vec<u8>, ReconError> {
    std::fs::read(path).map_err(|e| ReconError::unreadable(&path.display().to_string(), e))
}
