use anyhow::Result;
use chrono::{DateTime, Utc};

use super::DataUri;

/// Operator-selected photograph, held in memory for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    uri: DataUri,
    label: Option<String>,
}

impl SourceImage {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            uri: DataUri::from_bytes(mime_type, bytes),
            label: None,
        }
    }

    pub fn from_data_uri(raw: &str) -> Result<Self> {
        Ok(Self {
            uri: DataUri::parse(raw)?,
            label: None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = (!label.trim().is_empty()).then_some(label);
        self
    }

    pub fn data_uri(&self) -> &DataUri {
        &self.uri
    }

    pub fn mime_type(&self) -> &str {
        self.uri.mime_type()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn byte_len(&self) -> usize {
        self.uri.decoded_len()
    }
}

/// Composite image returned by a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub image: DataUri,
    pub created_at: DateTime<Utc>,
}
