// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    store::{ListingStore, MemoryStore, PgStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub listings: Arc<dyn ListingStore>,
    pub config: Config,
}

impl AppState {
    pub fn postgres(store: PgStore, config: Config) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            listings: store,
            config,
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            listings: store,
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
