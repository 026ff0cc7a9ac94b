use std::fmt;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Base64 `data:` URI holding one image.
///
/// The payload is kept in its encoded form so that bytes returned by the
/// model can be re-wrapped without a decode/encode pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    data: String,
}

impl DataUri {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let mime_type = if mime_type.trim().is_empty() {
            DEFAULT_IMAGE_MIME.to_string()
        } else {
            mime_type.trim().to_string()
        };
        Self {
            mime_type,
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64.encode(bytes))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let Some(rest) = trimmed.strip_prefix("data:") else {
            bail!("not a data URI");
        };
        let Some((header, data)) = rest.split_once(',') else {
            bail!("data URI is missing its payload separator");
        };
        let Some(media) = header.strip_suffix(";base64") else {
            bail!("data URI payload is not base64 encoded");
        };
        let mime_type = media.split(';').next().unwrap_or_default();
        Ok(Self::new(mime_type, data))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 payload without the `data:<mime>;base64,` header.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data.as_bytes())
            .context("data URI base64 decode failed")
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Decoded size estimated from the payload length.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|byte| *byte == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}
