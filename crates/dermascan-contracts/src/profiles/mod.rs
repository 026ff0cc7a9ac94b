mod prompts;
mod registry;
mod selectors;

pub use prompts::{COMPACT_GRID_PROMPT, VISIA_GRID_PROMPT};
pub use registry::{AnalysisProfile, ProfileRegistry, DEFAULT_IMAGE_MODEL, DEFAULT_PROFILE};
pub use selectors::{ProfileSelection, ProfileSelector};
