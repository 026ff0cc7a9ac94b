use super::registry::{AnalysisProfile, ProfileRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSelection {
    pub profile: AnalysisProfile,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileSelector {
    pub registry: ProfileRegistry,
}

impl ProfileSelector {
    pub fn new(registry: Option<ProfileRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_default(),
        }
    }

    pub fn select(&self, requested: Option<&str>) -> Result<ProfileSelection, String> {
        let requested = requested.map(str::trim).filter(|value| !value.is_empty());
        let fallback_reason = if let Some(requested_value) = requested {
            if let Some(profile) = self.registry.get(requested_value) {
                return Ok(ProfileSelection {
                    profile: profile.clone(),
                    requested: Some(requested_value.to_string()),
                    fallback_reason: None,
                });
            }
            format!("Requested profile '{requested_value}' unknown; using default.")
        } else {
            "No profile specified; using default.".to_string()
        };

        let Some(profile) = self.registry.default_profile().cloned() else {
            return Err("No analysis profiles registered.".to_string());
        };
        Ok(ProfileSelection {
            profile,
            requested: requested.map(str::to_string),
            fallback_reason: Some(fallback_reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use indexmap::IndexMap;

    use super::super::registry::DEFAULT_PROFILE;
    use super::{ProfileRegistry, ProfileSelection, ProfileSelector};

    fn select(requested: &str) -> Result<ProfileSelection> {
        ProfileSelector::new(None)
            .select(Some(requested))
            .map_err(|err| anyhow!(err))
    }

    #[test]
    fn selects_requested_profile() -> Result<()> {
        let selection = select("compact-grid")?;
        assert_eq!(selection.profile.name, "compact-grid");
        assert_eq!(selection.requested.as_deref(), Some("compact-grid"));
        assert!(selection.fallback_reason.is_none());
        Ok(())
    }

    #[test]
    fn unknown_profile_falls_back_with_reason() -> Result<()> {
        let selection = select("missing")?;
        assert_eq!(selection.profile.name, DEFAULT_PROFILE);
        assert_eq!(selection.requested.as_deref(), Some("missing"));
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested profile 'missing' unknown; using default.")
        );
        Ok(())
    }

    #[test]
    fn no_request_uses_default_with_explanation() -> Result<()> {
        let selection = select("   ")?;
        assert_eq!(selection.profile.name, DEFAULT_PROFILE);
        assert!(selection.requested.is_none());
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("No profile specified; using default.")
        );
        Ok(())
    }

    #[test]
    fn empty_registry_is_an_error() {
        let err = ProfileSelector::new(Some(ProfileRegistry::new(Some(IndexMap::new()))))
            .select(None)
            .err()
            .unwrap_or_default();
        assert_eq!(err, "No analysis profiles registered.");
    }
}
