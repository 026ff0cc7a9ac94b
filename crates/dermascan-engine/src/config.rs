use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use dermascan_contracts::profiles::{AnalysisProfile, ProfileSelector};
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model id that selects the offline analyzer.
pub const DRYRUN_MODEL: &str = "dryrun";

const REQUEST_TIMEOUT_MIN_S: f64 = 5.0;
const REQUEST_TIMEOUT_MAX_S: f64 = 600.0;

/// Everything the request client needs besides the credential.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub api_base: String,
    pub profile: AnalysisProfile,
    /// `None` leaves timeouts to the transport.
    pub request_timeout: Option<Duration>,
    pub fallback_reason: Option<String>,
    /// Model pinned by `DERMASCAN_MODEL` or the operator; survives profile
    /// switches.
    pub model_override: Option<String>,
}

impl AnalyzerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty_env)
    }

    /// Resolves configuration from `GEMINI_API_BASE`, `DERMASCAN_PROFILE`,
    /// `DERMASCAN_MODEL` and `DERMASCAN_REQUEST_TIMEOUT`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base = lookup("GEMINI_API_BASE")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let config = Self {
            api_base,
            profile: select_profile(None)?.0,
            request_timeout: lookup("DERMASCAN_REQUEST_TIMEOUT")
                .as_deref()
                .and_then(parse_timeout),
            fallback_reason: None,
            model_override: None,
        }
        .with_profile(lookup("DERMASCAN_PROFILE").as_deref())?;
        Ok(match lookup("DERMASCAN_MODEL") {
            Some(model) => config.with_model(&model),
            None => config,
        })
    }

    /// Switches to the named profile, falling back to the default one.
    pub fn with_profile(mut self, name: Option<&str>) -> Result<Self> {
        let (profile, fallback_reason) = select_profile(name)?;
        if let Some(reason) = fallback_reason.as_deref() {
            debug!("{reason}");
        }
        self.profile = match self.model_override.as_deref() {
            Some(model) => profile.with_model(model),
            None => profile,
        };
        self.fallback_reason = fallback_reason.filter(|_| name.is_some());
        Ok(self)
    }

    /// Pins `model` across later profile switches. Blank input is ignored.
    pub fn with_model(mut self, model: &str) -> Self {
        let model = model.trim();
        if model.is_empty() {
            return self;
        }
        self.model_override = Some(model.to_string());
        self.profile = self.profile.with_model(model);
        self
    }

    pub fn is_dryrun(&self) -> bool {
        self.profile.model.eq_ignore_ascii_case(DRYRUN_MODEL)
    }
}

fn select_profile(name: Option<&str>) -> Result<(AnalysisProfile, Option<String>)> {
    let selection = ProfileSelector::new(None)
        .select(name)
        .map_err(|err| anyhow!(err))?;
    Ok((selection.profile, selection.fallback_reason))
}

fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(Duration::from_secs_f64(
            value.clamp(REQUEST_TIMEOUT_MIN_S, REQUEST_TIMEOUT_MAX_S),
        )),
        _ => {
            warn!("ignoring invalid DERMASCAN_REQUEST_TIMEOUT value {raw:?}");
            None
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use dermascan_contracts::profiles::{DEFAULT_IMAGE_MODEL, DEFAULT_PROFILE};

    use super::{AnalyzerConfig, DEFAULT_API_BASE};

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<AnalyzerConfig> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        AnalyzerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() -> anyhow::Result<()> {
        let config = config_from(&[])?;
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.profile.name, DEFAULT_PROFILE);
        assert_eq!(config.profile.model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.fallback_reason, None);
        assert!(!config.is_dryrun());
        Ok(())
    }

    #[test]
    fn environment_overrides_profile_model_and_base() -> anyhow::Result<()> {
        let config = config_from(&[
            ("GEMINI_API_BASE", "http://127.0.0.1:9999/v1beta/"),
            ("DERMASCAN_PROFILE", "compact-grid"),
            ("DERMASCAN_MODEL", "DryRun"),
            ("DERMASCAN_REQUEST_TIMEOUT", "120"),
        ])?;
        assert_eq!(config.api_base, "http://127.0.0.1:9999/v1beta");
        assert_eq!(config.profile.name, "compact-grid");
        assert!(config.is_dryrun());
        assert_eq!(config.request_timeout, Some(Duration::from_secs(120)));
        Ok(())
    }

    #[test]
    fn environment_model_survives_profile_switch() -> anyhow::Result<()> {
        let config = config_from(&[("DERMASCAN_MODEL", "dryrun")])?;
        assert_eq!(config.model_override.as_deref(), Some("dryrun"));

        let switched = config.with_profile(Some("compact-grid"))?;
        assert_eq!(switched.profile.name, "compact-grid");
        assert_eq!(switched.profile.model, "dryrun");
        assert!(switched.is_dryrun());

        let fallback = switched.with_profile(Some("infrared"))?;
        assert_eq!(fallback.profile.name, DEFAULT_PROFILE);
        assert!(fallback.is_dryrun());
        Ok(())
    }

    #[test]
    fn profile_switch_without_override_uses_profile_model() -> anyhow::Result<()> {
        let config = config_from(&[])?.with_model("  ");
        assert_eq!(config.model_override, None);
        let switched = config.with_profile(Some("compact-grid"))?;
        assert_eq!(switched.profile.model, DEFAULT_IMAGE_MODEL);
        Ok(())
    }

    #[test]
    fn timeout_is_clamped_and_garbage_ignored() -> anyhow::Result<()> {
        let low = config_from(&[("DERMASCAN_REQUEST_TIMEOUT", "0.5")])?;
        assert_eq!(low.request_timeout, Some(Duration::from_secs(5)));
        let high = config_from(&[("DERMASCAN_REQUEST_TIMEOUT", "9000")])?;
        assert_eq!(high.request_timeout, Some(Duration::from_secs(600)));
        let junk = config_from(&[("DERMASCAN_REQUEST_TIMEOUT", "soon")])?;
        assert_eq!(junk.request_timeout, None);
        Ok(())
    }

    #[test]
    fn unknown_profile_records_fallback_reason() -> anyhow::Result<()> {
        let config = config_from(&[("DERMASCAN_PROFILE", "infrared")])?;
        assert_eq!(config.profile.name, DEFAULT_PROFILE);
        assert_eq!(
            config.fallback_reason.as_deref(),
            Some("Requested profile 'infrared' unknown; using default.")
        );
        Ok(())
    }
}
