use std::fmt;

use serde::{Deserialize, Serialize};

/// Single source of truth for what the front end shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisPhase {
    #[default]
    Idle,
    Analyzing,
    Complete,
    Error,
}

impl AnalysisPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Analyzing => "ANALYZING",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        }
    }

    /// Phases from which the operator may trigger a new analysis.
    pub fn accepts_start(self) -> bool {
        !matches!(self, Self::Analyzing)
    }

    pub fn is_analyzing(self) -> bool {
        matches!(self, Self::Analyzing)
    }
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
