//! Catalog core: record model, pure editing functions, the document
//! gateway, and the in-memory view.

/// Record assembly and catalog merging.
pub mod editor;
/// Singleton catalog document gateway.
pub mod gateway;
/// Record model and date helpers.
pub mod record;
/// In-memory view and editing workflows.
pub mod view;

pub use gateway::CatalogGateway;
pub use record::{BookForm, Record};
pub use view::{CatalogView, Direction, SortKey};
