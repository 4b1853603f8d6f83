//! Application state shared across handlers.

use crate::auth::AuthService;
use crate::catalog::{CatalogGateway, CatalogView};
use crate::config::Config;
use crate::image_data::ImageEncoder;
use crate::session::SessionGate;
use crate::store::Store;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Document store.
    pub store: Store,
    /// Authentication service.
    pub auth: Arc<AuthService>,
    /// Session gate.
    pub gate: SessionGate,
    /// In-memory catalog view.
    pub view: CatalogView,
    /// Cover image encoder.
    pub encoder: ImageEncoder,
}

impl AppState {
    /// Create application state over an open store.
    pub fn new_with_store(config: Config, store: Store, auth: AuthService) -> Self {
        let gateway = CatalogGateway::new(store.clone(), config.catalog.document_id.clone());
        let view = CatalogView::new(gateway, config.catalog.placeholder_image.clone());
        let encoder = ImageEncoder::new(config.catalog.max_image_bytes);
        let gate = auth.gate().clone();

        Self {
            config: Arc::new(config),
            store,
            auth: Arc::new(auth),
            gate,
            view,
            encoder,
        }
    }
}
