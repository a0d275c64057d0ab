//! Permission and metadata cache for archival units

use crate::concurrency::KeyedLockManager;
use crate::error::ApiError;
use crate::types::UNIT_DESCRIPTOR;
use crate::unit::probe::{MetadataExtractor, PermissionProbe};
use crate::unit::ArchivalUnit;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared store of unit permission and metadata.
pub trait UnitCache: Send + Sync {
    /// Cached unit, loading it on first access.
    fn permission_and_metadata(&self, unit_id: &str) -> Result<Arc<ArchivalUnit>, ApiError>;

    /// Forget one unit so the next access re-probes it.
    fn invalidate(&self, unit_id: &str);

    fn clear(&self);
}

/// In-memory unit cache.
///
/// Lookups take a shared lock on the entry map. A miss takes the unit's
/// population lock, re-checks the map and only then calls the probe and the
/// extractor, so each unit is loaded once however many threads ask for it.
pub struct MemoryUnitCache {
    root: PathBuf,
    probe: Arc<dyn PermissionProbe>,
    extractor: Arc<dyn MetadataExtractor>,
    ttl: Option<Duration>,
    entries: RwLock<HashMap<String, Arc<ArchivalUnit>>>,
    population: KeyedLockManager<String>,
}

impl MemoryUnitCache {
    pub fn new(
        root: impl Into<PathBuf>,
        probe: Arc<dyn PermissionProbe>,
        extractor: Arc<dyn MetadataExtractor>,
    ) -> Self {
        Self {
            root: root.into(),
            probe,
            extractor,
            ttl: None,
            entries: RwLock::new(HashMap::new()),
            population: KeyedLockManager::new(),
        }
    }

    /// Expire entries after `ttl`; `None` keeps them for the cache lifetime.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh(&self, unit_id: &str) -> Option<Arc<ArchivalUnit>> {
        let entries = self.entries.read();
        let unit = entries.get(unit_id)?;
        match self.ttl {
            Some(ttl) if unit.loaded_at.elapsed() >= ttl => None,
            _ => Some(unit.clone()),
        }
    }

    fn load(&self, unit_id: &str) -> Result<ArchivalUnit, ApiError> {
        let descriptor = self.root.join(unit_id).join(UNIT_DESCRIPTOR);
        if !self.probe.can_read(&descriptor) {
            debug!(unit = unit_id, "Unit is not readable");
            return Ok(ArchivalUnit::unreadable(unit_id));
        }
        let metadata = self.extractor.extract(&descriptor).map_err(|e| {
            ApiError::runtime(format!("Metadata extraction failed for unit {}", unit_id), e)
        })?;
        info!(unit = unit_id, empty = metadata.is_empty(), "Loaded unit metadata");
        Ok(ArchivalUnit::readable(unit_id, metadata))
    }
}

impl UnitCache for MemoryUnitCache {
    fn permission_and_metadata(&self, unit_id: &str) -> Result<Arc<ArchivalUnit>, ApiError> {
        if unit_id.is_empty() || unit_id.contains('/') {
            return Err(ApiError::InvalidArgument(format!(
                "Invalid unit id: {:?}",
                unit_id
            )));
        }
        if let Some(unit) = self.fresh(unit_id) {
            return Ok(unit);
        }

        let loaded = {
            let lock = self.population.get_lock(unit_id);
            let _guard = lock.write();
            match self.fresh(unit_id) {
                Some(unit) => Ok(unit),
                None => self.load(unit_id).map(|unit| {
                    let unit = Arc::new(unit);
                    self.entries
                        .write()
                        .insert(unit_id.to_string(), unit.clone());
                    unit
                }),
            }
        };
        self.population.release(unit_id);
        loaded
    }

    fn invalidate(&self, unit_id: &str) {
        self.entries.write().remove(unit_id);
        self.population.release(unit_id);
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}
