mod data_uri;
mod source;

pub use data_uri::{DataUri, DEFAULT_IMAGE_MIME};
pub use source::{AnalysisResult, SourceImage};
