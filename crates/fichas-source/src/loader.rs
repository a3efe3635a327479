//! Dataset loading with an optional read-through cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use fichas_core::{Dataset, SourceError, Tab};
use tracing::debug;

use crate::columns::ColumnMapper;
use crate::{parse_dataset, SheetSource};

/// Loads mapped datasets from a sheet source.
///
/// With caching enabled, successful loads are kept per source id as immutable
/// snapshots. Failed loads are never cached.
pub struct DatasetLoader<S> {
    source: S,
    mapper: ColumnMapper,
    cache: Option<Mutex<HashMap<String, Arc<Dataset>>>>,
}

impl<S: SheetSource> DatasetLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            mapper: ColumnMapper::default(),
            cache: None,
        }
    }

    /// Replace the column mapper
    pub fn mapper(mut self, mapper: ColumnMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Enable the read-through cache
    pub fn cached(mut self) -> Self {
        self.cache = Some(Mutex::new(HashMap::new()));
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch, parse and map a tab, going through the cache when enabled
    pub fn load(&self, tab: Tab) -> Result<Arc<Dataset>, SourceError> {
        let source_id = self.source.source_id(tab);

        let Some(cache) = &self.cache else {
            return self.fetch(tab, &source_id).map(Arc::new);
        };

        if let Some(hit) = cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&source_id)
        {
            debug!(source = %source_id, "dataset cache hit");
            return Ok(Arc::clone(hit));
        }

        debug!(source = %source_id, "dataset cache miss");
        let dataset = Arc::new(self.fetch(tab, &source_id)?);
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source_id, Arc::clone(&dataset));
        Ok(dataset)
    }

    fn fetch(&self, tab: Tab, source_id: &str) -> Result<Dataset, SourceError> {
        let bytes = self.source.fetch_csv(tab)?;
        parse_dataset(&bytes, tab, source_id, &self.mapper)
    }

    /// Drop every cached dataset
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Number of cached datasets
    pub fn cached_len(&self) -> usize {
        self.cache
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }
}
