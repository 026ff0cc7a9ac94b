mod auth;
mod phase;

pub use auth::{
    is_authorization_error, AuthErrorPredicate, AUTHORIZATION_ERROR_MARKERS, AUTHORIZATION_NOTICE,
};
pub use phase::AnalysisPhase;
