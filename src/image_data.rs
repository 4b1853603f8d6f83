//! Inline cover-image encoding.
//!
//! Covers are embedded directly in the catalog document as data URIs; they
//! are validated and encoded here, never decoded or resized.

use crate::error::{AppError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::Path;

/// Encodes user-supplied images into self-describing data URIs.
#[derive(Debug, Clone)]
pub struct ImageEncoder {
    max_bytes: usize,
}

impl ImageEncoder {
    /// Create an encoder with the given size limit.
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Encode image bytes with a declared content type.
    ///
    /// Fails with `Validation{image, "too-large"}` over the size limit and
    /// `Validation{image, "wrong-type"}` for non-image declared types.
    pub fn encode(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::validation("image", "too-large"));
        }

        if !content_type.starts_with("image/") {
            return Err(AppError::validation("image", "wrong-type"));
        }

        Ok(format!(
            "data:{};base64,{}",
            content_type,
            STANDARD.encode(bytes)
        ))
    }

    /// Read and encode an image file in one shot.
    ///
    /// The type is declared by the file extension. Exactly one outcome per
    /// call: the encoded data URI or an error.
    pub async fn encode_file(&self, path: &Path) -> Result<String> {
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_from_extension)
            .ok_or_else(|| AppError::validation("image", "wrong-type"))?;

        let bytes = tokio::fs::read(path).await?;
        self.encode(&bytes, content_type)
    }
}

/// Map an image file extension to its MIME type.
pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 5 * 1024 * 1024;

    #[test]
    fn encode_produces_data_uri() {
        let encoder = ImageEncoder::new(LIMIT);
        let uri = encoder.encode(&[0xFF, 0xD8, 0xFF], "image/jpeg").unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let encoder = ImageEncoder::new(LIMIT);
        let six_mib = vec![0u8; 6 * 1024 * 1024];

        let err = encoder.encode(&six_mib, "image/png").unwrap_err();
        match err {
            crate::error::AppError::Validation { field, reason } => {
                assert_eq!(field, "image");
                assert_eq!(reason, "too-large");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn encode_rejects_non_image_type() {
        let encoder = ImageEncoder::new(LIMIT);
        let err = encoder.encode(b"%PDF-1.4", "application/pdf").unwrap_err();
        match err {
            crate::error::AppError::Validation { reason, .. } => {
                assert_eq!(reason, "wrong-type")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mime_lookup_is_case_insensitive() {
        assert_eq!(mime_from_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_from_extension("png"), Some("image/png"));
        assert_eq!(mime_from_extension("pdf"), None);
    }

    #[tokio::test]
    async fn encode_file_reads_and_types_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        tokio::fs::write(&path, [0x89, 0x50, 0x4E, 0x47]).await.unwrap();

        let encoder = ImageEncoder::new(LIMIT);
        let uri = encoder.encode_file(&path).await.unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let txt = dir.path().join("notes.txt");
        tokio::fs::write(&txt, b"hello").await.unwrap();
        assert!(encoder.encode_file(&txt).await.is_err());
    }
}
