use indexmap::IndexMap;

use super::prompts::{COMPACT_GRID_PROMPT, VISIA_GRID_PROMPT};

pub const DEFAULT_PROFILE: &str = "visia-grid";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Model, instructions and output parameters for one analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisProfile {
    pub name: String,
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

impl AnalysisProfile {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model.trim().to_string();
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: IndexMap<String, AnalysisProfile>,
}

impl ProfileRegistry {
    pub fn new(profiles: Option<IndexMap<String, AnalysisProfile>>) -> Self {
        Self {
            profiles: profiles.unwrap_or_else(default_profiles),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AnalysisProfile> {
        self.profiles.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &AnalysisProfile> {
        self.profiles.values()
    }

    /// First registered profile.
    pub fn default_profile(&self) -> Option<&AnalysisProfile> {
        self.profiles.values().next()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

fn default_profiles() -> IndexMap<String, AnalysisProfile> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, prompt: &str, aspect_ratio: Option<&str>, image_size: &str| {
        map.insert(
            name.to_string(),
            AnalysisProfile {
                name: name.to_string(),
                model: DEFAULT_IMAGE_MODEL.to_string(),
                prompt: prompt.trim().to_string(),
                aspect_ratio: aspect_ratio.map(str::to_string),
                image_size: Some(image_size.to_string()),
            },
        );
    };

    insert(DEFAULT_PROFILE, VISIA_GRID_PROMPT, Some("3:4"), "2K");
    insert("compact-grid", COMPACT_GRID_PROMPT, Some("3:4"), "1K");

    map
}
