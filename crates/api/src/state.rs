use std::sync::Arc;

use campus_cms_core::{Catalog, DocumentStore, ResourceService};

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: Arc<dyn DocumentStore>,
    catalog: Catalog,
    config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Catalog, config: AppConfig) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store,
                catalog,
                config,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// One service per catalog entry, sharing the store.
    pub fn services(&self) -> impl Iterator<Item = ResourceService> + '_ {
        self.inner
            .catalog
            .iter()
            .map(|schema| ResourceService::new(schema.clone(), self.inner.store.clone()))
    }
}
