use ledger_analytics::Aggregator;
use ledger_core::config::AppConfig;
use ledger_core::lookup::LookupTables;
use ledger_core::store::{MemoryStore, SessionStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store handle shared across requests. The lock serializes writes.
pub type SharedStore = Arc<RwLock<dyn SessionStore>>;

/// Shared application state for the server.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: SharedStore,
    pub lookups: Arc<LookupTables>,
    pub aggregator: Aggregator,
}

impl AppState {
    /// Build state with an in-memory store seeded from the config.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store = MemoryStore::from_config(&config.store)?;
        Self::with_store(config, store)
    }

    /// Build state around any store implementation.
    pub fn with_store<S>(config: AppConfig, store: S) -> anyhow::Result<Self>
    where
        S: SessionStore + 'static,
    {
        let aggregator = Aggregator::new(config.stats.offset()?);
        let lookups = LookupTables::from_config(&config.lookups, &config.stats.unknown_label);
        let store: SharedStore = Arc::new(RwLock::new(store));

        Ok(Self {
            config,
            store,
            lookups: Arc::new(lookups),
            aggregator,
        })
    }
}
