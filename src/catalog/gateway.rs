//! Sole mediator of reads and writes of the singleton catalog document.

use crate::catalog::record::Record;
use crate::error::{AppError, Result};
use crate::store::Store;
use serde::{Deserialize, Serialize};

/// JSON shape of the singleton catalog document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    books: Vec<Record>,
}

/// Gateway to the singleton catalog document.
///
/// Every mutation goes through [`replace_all`](CatalogGateway::replace_all):
/// the full catalog is rewritten at document granularity, so a concurrent
/// write from another session wins or loses wholesale (last-writer-wins).
#[derive(Clone)]
pub struct CatalogGateway {
    store: Store,
    document_id: String,
}

impl CatalogGateway {
    /// Create a gateway addressing the given document.
    pub fn new(store: Store, document_id: impl Into<String>) -> Self {
        Self {
            store,
            document_id: document_id.into(),
        }
    }

    /// Create the catalog document with an empty catalog if it is absent.
    ///
    /// Idempotent; safe to call on every start.
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.store.document_exists(&self.document_id)? {
            return Ok(());
        }

        tracing::info!(document = %self.document_id, "Creating empty catalog document");
        self.write_catalog(&CatalogDocument::default())
    }

    /// Read the full catalog. An absent document is an empty catalog.
    pub fn fetch_all(&self) -> Result<Vec<Record>> {
        let body = match self.store.read_document(&self.document_id)? {
            Some(body) => body,
            None => return Ok(Vec::new()),
        };

        let document: CatalogDocument = serde_json::from_str(&body)
            .map_err(|e| AppError::Internal(format!("Malformed catalog document: {}", e)))?;

        Ok(document.books)
    }

    /// Overwrite the catalog with exactly `records`.
    pub fn replace_all(&self, records: &[Record]) -> Result<()> {
        self.write_catalog(&CatalogDocument {
            books: records.to_vec(),
        })
    }

    fn write_catalog(&self, document: &CatalogDocument) -> Result<()> {
        let body = serde_json::to_string(document)
            .map_err(|e| AppError::Internal(format!("Failed to encode catalog: {}", e)))?;

        self.store.write_document(&self.document_id, &body)
    }
}
