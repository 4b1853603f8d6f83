//! Record assembly and catalog merging.
//!
//! Everything here is pure: validation and merging never touch the store, so
//! the whole-document read-modify-write cycle can be tested in isolation.

use crate::catalog::record::{BookForm, Record, canonical_date};
use crate::error::{AppError, Result};
use crate::store::now_timestamp_millis;
use std::sync::atomic::{AtomicI64, Ordering};

/// Minimum length for title and author fields.
const FIELD_MIN: usize = 2;
/// Maximum length for title and author fields.
const FIELD_MAX: usize = 100;

/// Last issued record ID, to keep IDs unique when two records are created
/// within the same millisecond.
static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Next record ID: creation-time milliseconds, bumped past the last issued
/// value so IDs stay unique and monotonic within this process.
fn next_record_id() -> String {
    let now = now_timestamp_millis();
    let issued = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(issued + 1).to_string()
}

/// Validate form input against the record constraints.
///
/// `creating` requires an uploaded image; edits keep the existing one.
pub fn validate(form: &BookForm, creating: bool) -> Result<()> {
    check_text_field("title", &form.title)?;
    check_text_field("author", &form.author)?;

    canonical_date(&form.publish_date)?;

    if form.page_count < 1 {
        return Err(AppError::validation("page_count", "too-small"));
    }

    if creating && form.image.is_none() {
        return Err(AppError::validation("image", "missing"));
    }

    Ok(())
}

fn check_text_field(field: &'static str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len < FIELD_MIN {
        return Err(AppError::validation(field, "too-short"));
    }
    if len > FIELD_MAX {
        return Err(AppError::validation(field, "too-long"));
    }
    Ok(())
}

/// Assemble a record from validated form input.
///
/// A supplied `editing_id` is always preserved, even when the record it
/// named has since vanished from the catalog (the subsequent merge appends
/// it back under the same ID). A fresh time-derived ID is assigned only on
/// creation. `existing` carries the prior image forward when the edit has
/// no new upload.
pub fn build_record(
    form: &BookForm,
    editing_id: Option<&str>,
    existing: Option<&Record>,
    placeholder_image: &str,
) -> Result<Record> {
    let id = match editing_id {
        Some(id) => id.to_string(),
        None => next_record_id(),
    };

    let image_ref = form
        .image
        .clone()
        .or_else(|| existing.map(|r| r.image_ref.clone()))
        .unwrap_or_else(|| placeholder_image.to_string());

    Ok(Record {
        id,
        title: form.title.clone(),
        author: form.author.clone(),
        publish_date: canonical_date(&form.publish_date)?,
        page_count: form.page_count,
        image_ref,
    })
}

/// Insert-or-replace a record by ID.
///
/// An existing record with the same ID is replaced in place (position
/// preserved); otherwise the record is appended at the end.
pub fn merge_into_catalog(catalog: Vec<Record>, record: Record) -> Vec<Record> {
    let mut merged = catalog;
    match merged.iter().position(|r| r.id == record.id) {
        Some(index) => merged[index] = record,
        None => merged.push(record),
    }
    merged
}

/// Exclude the record with the given ID.
///
/// Removing an absent ID returns the catalog unchanged; callers treat that
/// as success.
pub fn remove_from_catalog(catalog: Vec<Record>, id: &str) -> Vec<Record> {
    catalog.into_iter().filter(|r| r.id != id).collect()
}
