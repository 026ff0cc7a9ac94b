/// Substrings that mark a failed request as an authorization denial.
pub const AUTHORIZATION_ERROR_MARKERS: &[&str] =
    &["403", "PERMISSION_DENIED", "caller does not have permission"];

pub const AUTHORIZATION_NOTICE: &str = "Permission Denied: Please select a valid paid API Key. \
Your previous key may lack billing or permissions.";

/// Classifier consulted by the session when an analysis request fails.
pub type AuthErrorPredicate = fn(&str) -> bool;

pub fn is_authorization_error(error_text: &str) -> bool {
    AUTHORIZATION_ERROR_MARKERS
        .iter()
        .any(|marker| error_text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::is_authorization_error;

    #[test]
    fn matches_each_marker() {
        assert!(is_authorization_error("Gemini request failed (403): {}"));
        assert!(is_authorization_error("status: PERMISSION_DENIED"));
        assert!(is_authorization_error(
            "The caller does not have permission to use this model"
        ));
        assert!(is_authorization_error("403 PERMISSION_DENIED"));
    }

    #[test]
    fn other_failures_are_not_authorization_errors() {
        assert!(!is_authorization_error("Gemini returned no image"));
        assert!(!is_authorization_error("Gemini request failed (500): internal"));
        assert!(!is_authorization_error("permission_denied"));
        assert!(!is_authorization_error(""));
    }
}
