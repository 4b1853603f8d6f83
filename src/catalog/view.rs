//! In-memory catalog view and editing workflows.

use crate::catalog::editor;
use crate::catalog::gateway::CatalogGateway;
use crate::catalog::record::{BookForm, Record};
use crate::error::Result;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;

/// Field to sort the catalog projection by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Sort by title.
    Title,
    /// Sort by author.
    Author,
    /// Sort by publication date.
    PublishDate,
    /// Sort by page count.
    PageCount,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// In-memory view of the catalog, kept consistent with the singleton
/// document by re-fetching after every successful mutation.
///
/// Workflows run fetch → merge/remove → replace → reload strictly in order.
/// Two sessions racing that sequence can silently lose one side's write; the
/// later replace wins at document granularity.
#[derive(Clone)]
pub struct CatalogView {
    gateway: CatalogGateway,
    records: Arc<RwLock<Vec<Record>>>,
    placeholder_image: String,
}

impl CatalogView {
    /// Create a view over the given gateway.
    pub fn new(gateway: CatalogGateway, placeholder_image: impl Into<String>) -> Self {
        Self {
            gateway,
            records: Arc::new(RwLock::new(Vec::new())),
            placeholder_image: placeholder_image.into(),
        }
    }

    /// Initialize the document if needed and synchronize the in-memory view.
    ///
    /// On failure the prior in-memory catalog is left untouched.
    pub fn load(&self) -> Result<()> {
        self.gateway.ensure_initialized()?;
        let records = self.gateway.fetch_all()?;

        tracing::debug!(records = records.len(), "Catalog loaded");
        *self.records.write() = records;
        Ok(())
    }

    /// Current in-memory catalog, in its current order.
    pub fn records(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    /// Get a record by ID from the in-memory catalog.
    pub fn get(&self, id: &str) -> Option<Record> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    /// Number of records in the in-memory catalog.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the in-memory catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Derived projection: stable sort by `sort` (current order when absent),
    /// then case-insensitive substring filter over title and author.
    pub fn sorted_filtered(
        &self,
        sort: Option<SortKey>,
        direction: Direction,
        search: &str,
    ) -> Vec<Record> {
        let mut records = self.records.read().clone();

        if let Some(key) = sort {
            records.sort_by(|a, b| {
                let ordering = match key {
                    SortKey::Title => a.title.cmp(&b.title),
                    SortKey::Author => a.author.cmp(&b.author),
                    SortKey::PublishDate => a.publish_date.cmp(&b.publish_date),
                    SortKey::PageCount => a.page_count.cmp(&b.page_count),
                };
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if search.is_empty() {
            return records;
        }

        let needle = search.to_lowercase();
        records
            .into_iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.author.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Create or update a record.
    ///
    /// Runs validate → build → fetch-merge-replace → reload. The reload
    /// discards any manual reorder done since the last load. On failure the
    /// in-memory catalog stays as of the last successful load and nothing is
    /// written remotely.
    pub fn submit(&self, form: &BookForm, editing_id: Option<&str>) -> Result<Record> {
        editor::validate(form, editing_id.is_none())?;

        let catalog = self.gateway.fetch_all()?;
        let existing = editing_id.and_then(|id| catalog.iter().find(|r| r.id == id).cloned());

        let record =
            editor::build_record(form, editing_id, existing.as_ref(), &self.placeholder_image)?;
        let merged = editor::merge_into_catalog(catalog, record.clone());

        self.gateway.replace_all(&merged)?;
        self.load()?;

        tracing::info!(id = %record.id, editing = editing_id.is_some(), "Catalog record saved");
        Ok(record)
    }

    /// Delete a record by ID.
    ///
    /// Deleting an absent ID is treated as success, not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        let catalog = self.gateway.fetch_all()?;
        let remaining = editor::remove_from_catalog(catalog, id);

        self.gateway.replace_all(&remaining)?;
        self.load()?;

        tracing::info!(id = %id, "Catalog record deleted");
        Ok(())
    }

    /// Move a record immediately before another, in memory only.
    ///
    /// Never persisted; the next `load` restores the stored order. No-op when
    /// the IDs match or either is absent.
    pub fn move_before(&self, dragged_id: &str, target_id: &str) {
        if dragged_id == target_id {
            return;
        }

        let mut records = self.records.write();

        let Some(from) = records.iter().position(|r| r.id == dragged_id) else {
            return;
        };
        if !records.iter().any(|r| r.id == target_id) {
            return;
        }

        let dragged = records.remove(from);
        // Target index recomputed after removal so insertion lands before it.
        let to = records
            .iter()
            .position(|r| r.id == target_id)
            .unwrap_or(records.len());
        records.insert(to, dragged);
    }
}
