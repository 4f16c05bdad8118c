//! Application state shared across request handlers.

use std::sync::Arc;

use crate::db::Database;
use crate::service::{AssignmentPolicy, Services};
use crate::store::{InMemoryStore, Stores};

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Present when backed by Postgres; used by readiness checks.
    db: Option<Database>,
    services: Services,
}

impl AppState {
    /// State backed by Postgres.
    pub fn new(db: Database, policy: AssignmentPolicy) -> Self {
        let stores = Stores::from_backend(Arc::new(db.store()));
        Self::from_parts(Some(db), stores, policy)
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(policy: AssignmentPolicy) -> Self {
        Self::from_parts(None, Stores::from_backend(Arc::new(InMemoryStore::new())), policy)
    }

    pub fn from_parts(db: Option<Database>, stores: Stores, policy: AssignmentPolicy) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                services: Services::new(stores, policy),
            }),
        }
    }

    pub fn db(&self) -> Option<&Database> {
        self.inner.db.as_ref()
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }
}
