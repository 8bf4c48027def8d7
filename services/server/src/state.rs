use crate::repo::LogStore;
use std::sync::Arc;

/// Shared handler state. The store is injected so tests can substitute
/// their own backend.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }
}
