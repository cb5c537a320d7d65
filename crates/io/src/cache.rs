//! Content-addressed memoization of parsed inputs.
//!
//! Parsing is a pure function of the uploaded bytes, so repeated runs over the
//! same files (say, while adjusting the exchange rate) reuse the parsed
//! settlement and catalog. Keys are blake3 digests of the raw bytes; entries
//! are shared through `Arc` so callers can hold them across runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use skuprofit_recon::{CostCatalog, ReconError, Settlement};

use crate::catalog::{parse_catalog, CatalogFormat};
use crate::settlement::parse_settlement;

/// blake3 digest of an input's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blake3:{}", blake3::Hash::from(self.0).to_hex())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Parsed-input cache. Failed parses are not cached.
#[derive(Debug, Default)]
pub struct ParseCache {
    settlements: HashMap<ContentHash, Arc<Settlement>>,
    catalogs: HashMap<(ContentHash, CatalogFormat), Arc<CostCatalog>>,
    stats: CacheStats,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settlement(&mut self, bytes: &[u8]) -> Result<Arc<Settlement>, ReconError> {
        let key = ContentHash::of(bytes);
        if let Some(hit) = self.settlements.get(&key) {
            self.stats.hits += 1;
            log::debug!("settlement cache hit {key}");
            return Ok(Arc::clone(hit));
        }
        self.stats.misses += 1;
        log::debug!("settlement cache miss {key}");
        let parsed = Arc::new(parse_settlement(bytes)?);
        self.settlements.insert(key, Arc::clone(&parsed));
        Ok(parsed)
    }

    pub fn catalog(
        &mut self,
        bytes: &[u8],
        format: CatalogFormat,
    ) -> Result<Arc<CostCatalog>, ReconError> {
        let key = (ContentHash::of(bytes), format);
        if let Some(hit) = self.catalogs.get(&key) {
            self.stats.hits += 1;
            log::debug!("catalog cache hit {}", key.0);
            return Ok(Arc::clone(hit));
        }
        self.stats.misses += 1;
        log::debug!("catalog cache miss {}", key.0);
        let parsed = Arc::new(parse_catalog(bytes, format)?);
        self.catalogs.insert(key, Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Drop every entry parsed from bytes with this hash. Returns whether
    /// anything was removed.
    pub fn invalidate(&mut self, hash: &ContentHash) -> bool {
        let before = self.len();
        self.settlements.remove(hash);
        self.catalogs.retain(|(h, _), _| h != hash);
        before != self.len()
    }

    pub fn clear(&mut self) {
        self.settlements.clear();
        self.catalogs.clear();
    }

    pub fn len(&self) -> usize {
        self.settlements.len() + self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
