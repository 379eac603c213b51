//! Application state shared across handlers

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use crate::{
    clock::Clock,
    credentials::EmailPolicy,
    repositories::{ItemRepository, MemoryStore, UserRepository},
    services::{AssetRegistry, AssignmentEngine, UserDirectory},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: UserDirectory,
    pub registry: AssetRegistry,
    pub assignments: AssignmentEngine,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        items: Arc<dyn ItemRepository>,
        emails: EmailPolicy,
        clock: Arc<dyn Clock>,
        cookie_key: Key,
    ) -> Self {
        Self {
            directory: UserDirectory::new(users.clone(), emails, clock.clone()),
            registry: AssetRegistry::new(items.clone(), clock),
            assignments: AssignmentEngine::new(items, users),
            cookie_key,
        }
    }

    /// State backed by a fresh [`MemoryStore`]
    pub fn in_memory(emails: EmailPolicy, clock: Arc<dyn Clock>, cookie_key: Key) -> Self {
        let store = MemoryStore::new();
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store),
            emails,
            clock,
            cookie_key,
        )
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
