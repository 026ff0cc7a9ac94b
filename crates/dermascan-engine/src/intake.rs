use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dermascan_contracts::imaging::SourceImage;
use thiserror::Error;

/// Advisory upload limit shown to the operator.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Reads one local file into a [`SourceImage`].
///
/// The MIME type comes from the extension, falling back to sniffing the
/// leading bytes. Content is not validated.
pub fn read_image_file(path: &Path) -> Result<SourceImage> {
    let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    let mime = mime_for_path(path)
        .or_else(|| {
            image::guess_format(&bytes)
                .ok()
                .map(|format| format.to_mime_type())
        })
        .unwrap_or("application/octet-stream");
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(SourceImage::from_bytes(mime, &bytes).with_label(label))
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())?;
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("{mime} is not an image type")]
    NotAnImage { mime: String },
    #[error("image is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },
}

/// Restrictions the front end applies before handing a file to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, image: &SourceImage) -> Result<(), UploadRejection> {
        if !image.data_uri().is_image() {
            return Err(UploadRejection::NotAnImage {
                mime: image.mime_type().to_string(),
            });
        }
        let size = image.byte_len();
        if size > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}
