mod dryrun;
mod gemini;

use std::sync::Arc;

use anyhow::Result;
use dermascan_contracts::imaging::{DataUri, SourceImage};

use crate::config::AnalyzerConfig;
use crate::credentials::CredentialHost;

pub use dryrun::DryrunAnalyzer;
pub use gemini::{image_from_response, GeminiAnalyzer};

/// Turns one source photograph into one composite analysis image.
///
/// Implementations make exactly one attempt and report every failure to the
/// caller unclassified.
pub trait ImageAnalyzer: Send + Sync {
    fn name(&self) -> &str;
    fn analyze(&self, image: &SourceImage) -> Result<DataUri>;
}

pub fn build_analyzer(
    config: &AnalyzerConfig,
    host: Option<Arc<dyn CredentialHost>>,
) -> Result<Box<dyn ImageAnalyzer>> {
    if config.is_dryrun() {
        return Ok(Box::new(DryrunAnalyzer::new(&config.profile.name)));
    }
    Ok(Box::new(GeminiAnalyzer::new(config.clone(), host)?))
}
