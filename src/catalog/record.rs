//! Catalog record model and date helpers.

use crate::error::{AppError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque unique identifier, assigned at creation time and immutable.
    pub id: String,

    /// Book title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Publication date as an 8-digit `YYYYMMDD` integer.
    pub publish_date: u32,

    /// Number of pages.
    pub page_count: u32,

    /// Inline-encoded cover image (data URI) or a placeholder URL.
    pub image_ref: String,
}

impl Record {
    /// Publication date rendered for editing/display (`YYYY-MM-DD`).
    pub fn publish_date_display(&self) -> String {
        display_date(self.publish_date)
    }
}

/// Transient form input for creating or editing a record. Never persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    /// Book title.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Publication date in `YYYY-MM-DD` form.
    pub publish_date: String,
    /// Number of pages.
    pub page_count: u32,
    /// Encoded cover image, if one was uploaded.
    pub image: Option<String>,
}

/// Parse a `YYYY-MM-DD` date string into the canonical 8-digit integer.
///
/// The string must name a real calendar date; "2021-02-30" is rejected.
pub fn canonical_date(display: &str) -> Result<u32> {
    let date = NaiveDate::parse_from_str(display, "%Y-%m-%d")
        .map_err(|_| AppError::validation("publish_date", "invalid-date"))?;

    let formatted = date.format("%Y%m%d").to_string();
    formatted
        .parse::<u32>()
        .map_err(|_| AppError::validation("publish_date", "invalid-date"))
}

/// Render a canonical 8-digit date integer as `YYYY-MM-DD`.
pub fn display_date(canonical: u32) -> String {
    let year = canonical / 10_000;
    let month = (canonical / 100) % 100;
    let day = canonical % 100;
    format!("{:04}-{:02}-{:02}", year, month, day)
}
