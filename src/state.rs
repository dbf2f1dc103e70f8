// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::live::LiveHub;
use crate::session::SessionStore;
use crate::storage::BlobStore;
use crate::store::{DataStore, KeyValueStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub kv: Arc<dyn KeyValueStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub hub: Arc<LiveHub>,
    pub config: Config,
}

impl AppState {
    pub fn session(&self) -> SessionStore {
        SessionStore::new(Arc::clone(&self.store))
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.session()
    }
}

impl FromRef<AppState> for Arc<LiveHub> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.hub)
    }
}
