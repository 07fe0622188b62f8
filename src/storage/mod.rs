// Persistence for the rental catalog
//
// The engine hands the whole catalog to a `CatalogStore` after every mutation
// and loads it once at startup.

pub mod flat_file;

pub use flat_file::{parse_flexible_date, FlatFileStore};

use crate::rental::repository::Catalog;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A single record could not be understood; loading skips it
    #[error("Malformed record in {file} line {line}: {reason}")]
    Malformed {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result of a load: the catalog plus every record that was skipped
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub catalog: Catalog,
    pub skipped: Vec<StorageError>,
}

pub trait CatalogStore: Send {
    fn load(&self) -> Result<LoadOutcome, StorageError>;

    /// Replace the stored state with `catalog`
    fn save(&self, catalog: &Catalog) -> Result<(), StorageError>;
}

/// Store that keeps the last saved catalog in memory
///
/// Clones share the same snapshot, so a test can keep a handle and inspect
/// what the engine saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Catalog,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.snapshot = catalog;
        }
        store
    }

    pub fn snapshot(&self) -> Catalog {
        self.state
            .lock()
            .map(|state| state.snapshot.clone())
            .unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().map(|state| state.saves).unwrap_or(0)
    }

    /// Make every following save fail
    pub fn fail_saves(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_saves = fail;
        }
    }
}

impl CatalogStore for MemoryStore {
    fn load(&self) -> Result<LoadOutcome, StorageError> {
        Ok(LoadOutcome {
            catalog: self.snapshot(),
            skipped: Vec::new(),
        })
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StorageError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))?;
        if state.fail_saves {
            return Err(StorageError::Unavailable("saves disabled".to_string()));
        }
        state.snapshot = catalog.clone();
        state.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::models::Vehicle;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let catalog = Catalog::from_parts(Vehicle::samples(), Vec::new(), Vec::new());

        store.save(&catalog).unwrap();

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().unwrap().catalog, catalog);
    }

    #[test]
    fn test_memory_store_failure_keeps_previous_snapshot() {
        let store = MemoryStore::new();
        store.fail_saves(true);

        let catalog = Catalog::from_parts(Vehicle::samples(), Vec::new(), Vec::new());
        assert!(matches!(
            store.save(&catalog),
            Err(StorageError::Unavailable(_))
        ));
        assert!(store.snapshot().is_empty());
        assert_eq!(store.save_count(), 0);
    }
}
