use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use log::{debug, info, warn};
use super::source::{load_tables, LoadedTables, TableSource};
use super::tsv::MAX_ALLELES_PER_LOCUS;

#[derive(Default)]
struct CacheState {
    /// Outcome of the one load, set once even when empty.
    tables: Option<Arc<LoadedTables>>,
    in_flight: bool,
}

/// Process-wide store of loaded frequency tables with single-flight loading.
///
/// Tables are fetched at most once. Callers that arrive while the load is
/// running wait for it and observe its outcome; later callers get the
/// memoized outcome, which may be empty when every locus failed.
pub struct FrequencyCache {
    source: Box<dyn TableSource>,
    limit: usize,
    state: Mutex<CacheState>,
    finished: Condvar,
}

impl FrequencyCache {
    pub fn new(source: Box<dyn TableSource>) -> Self {
        Self::with_limit(source, MAX_ALLELES_PER_LOCUS)
    }

    pub fn with_limit(source: Box<dyn TableSource>, limit: usize) -> Self {
        let mut state = CacheState::default();
        if !source.is_configured() {
            debug!("No frequency source configured, using embedded frequencies");
            state.tables = Some(Arc::new(LoadedTables::new()));
        }

        Self {
            source,
            limit,
            state: Mutex::new(state),
            finished: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Memoized outcome if the load has finished; never blocks.
    pub fn cached(&self) -> Option<Arc<LoadedTables>> {
        self.lock().tables.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().in_flight
    }

    /// Returns the loaded tables, running the load first if nobody has.
    ///
    /// Loci that failed are absent from the map; callers fall back to the
    /// embedded tables for them.
    pub fn load(&self) -> Arc<LoadedTables> {
        let mut state = self.lock();

        if let Some(tables) = &state.tables {
            return Arc::clone(tables);
        }

        if state.in_flight {
            debug!("Frequency load already in flight, waiting");
            while state.in_flight {
                state = self.finished.wait(state).unwrap_or_else(|poisoned| poisoned.into_inner());
            }
            return state.tables.clone().unwrap_or_default();
        }

        state.in_flight = true;
        drop(state);

        info!("Loading HLA frequency tables");
        let loaded = panic::catch_unwind(AssertUnwindSafe(|| load_tables(self.source.as_ref(), self.limit)));
        let outcome = match loaded {
            Ok(tables) => Arc::new(tables),
            Err(_) => {
                warn!("Frequency loader panicked, using embedded frequencies");
                Arc::new(LoadedTables::new())
            }
        };
        if outcome.is_empty() {
            warn!("No frequency tables could be loaded, using embedded frequencies");
        }

        let mut state = self.lock();
        state.tables = Some(Arc::clone(&outcome));
        state.in_flight = false;
        drop(state);

        self.finished.notify_all();
        outcome
    }

    /// Starts the load on a background thread unless it has already run or
    /// is running. Returns whether a thread was spawned.
    pub fn load_in_background(self: &Arc<Self>) -> bool {
        {
            let state = self.lock();
            if state.tables.is_some() || state.in_flight {
                return false;
            }
        }

        let cache = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("hla-frequency-loader".to_string())
            .spawn(move || {
                let tables = cache.load();
                debug!("Background frequency load finished with {} loci", tables.len());
            });

        match spawned {
            Ok(_) => true,
            Err(e) => {
                warn!("Could not start background frequency load: {}", e);
                false
            }
        }
    }
}
