//! bookdesk: a shared book-catalog server with user accounts.
//!
//! The entire catalog lives inside one singleton document in the store and
//! every mutation is a whole-document read-modify-write: fetch the full
//! catalog, apply a pure merge or removal, write the full catalog back, then
//! re-fetch. Concurrent sessions are resolved last-writer-wins at document
//! granularity.
//!
//! # Features
//!
//! - User accounts and session authentication
//! - Shared ordered catalog of book records
//! - Inline cover images (data URIs) with size/type validation
//! - Sorted and filtered catalog projections
//! - Transient drag-reorder of the in-memory view

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and user management.
pub mod auth;
/// Catalog core: records, editor, gateway, view.
pub mod catalog;
/// Configuration and CLI.
pub mod config;
/// Error types.
pub mod error;
/// Cover image encoding.
pub mod image_data;
/// HTTP server.
pub mod server;
/// Session gate.
pub mod session;
/// Document store.
pub mod store;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use error::{AppError, Result};
pub use server::AppState;
pub use store::Store;
