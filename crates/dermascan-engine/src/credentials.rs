use std::env;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

/// Environment variables consulted, in order, for a pre-selected API key.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Capability through which the hosting environment manages the API key.
pub trait CredentialHost: Send + Sync {
    fn has_selected_api_key(&self) -> Result<bool>;

    /// Presents the host's key selection affordance and returns once the
    /// operator is done with it, whether or not a key was chosen.
    fn open_select_key(&self) -> Result<()>;

    /// Key to send with the next request.
    fn api_key(&self) -> Option<String>;
}

/// Interactive affordance used by [`SessionKeyHost`] to obtain a key.
pub trait KeySelector: Send + Sync {
    /// `Ok(None)` means the operator dismissed the affordance.
    fn select_key(&self) -> Result<Option<String>>;
}

/// Host holding the key in memory for the lifetime of the process.
pub struct SessionKeyHost {
    slot: Mutex<Option<String>>,
    selector: Box<dyn KeySelector>,
}

impl SessionKeyHost {
    pub fn new(initial_key: Option<String>, selector: impl KeySelector + 'static) -> Self {
        Self {
            slot: Mutex::new(initial_key.and_then(normalize_key)),
            selector: Box::new(selector),
        }
    }

    pub fn from_env(selector: impl KeySelector + 'static) -> Self {
        Self::new(key_from_lookup(|key| env::var(key).ok()), selector)
    }
}

impl CredentialHost for SessionKeyHost {
    fn has_selected_api_key(&self) -> Result<bool> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("credential slot lock poisoned"))?;
        Ok(slot.is_some())
    }

    fn open_select_key(&self) -> Result<()> {
        let Some(key) = self.selector.select_key()?.and_then(normalize_key) else {
            debug!("key selection dismissed");
            return Ok(());
        };
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("credential slot lock poisoned"))?;
        *slot = Some(key);
        Ok(())
    }

    fn api_key(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

pub fn key_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .find_map(|name| lookup(name).and_then(normalize_key))
}

fn normalize_key(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Tracks whether a usable credential is selected and blocks the rest of
/// the session until one is.
///
/// Selection is optimistic: once the host affordance returns, the gate
/// reports the credential as available without asking the host again. An
/// operator who dismissed the affordance is caught by the next request,
/// which fails authorization and revokes availability.
pub struct CredentialGate {
    host: Option<Arc<dyn CredentialHost>>,
    available: bool,
}

impl CredentialGate {
    pub fn new(host: Option<Arc<dyn CredentialHost>>) -> Self {
        Self {
            host,
            available: false,
        }
    }

    pub fn host(&self) -> Option<Arc<dyn CredentialHost>> {
        self.host.clone()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn check_availability(&mut self) -> bool {
        self.available = match self.host.as_ref() {
            None => {
                debug!("no credential host; treating credential as unavailable");
                false
            }
            Some(host) => match host.has_selected_api_key() {
                Ok(selected) => selected,
                Err(err) => {
                    warn!("credential check failed: {err:#}");
                    false
                }
            },
        };
        self.available
    }

    pub fn request_selection(&mut self) -> bool {
        if let Some(host) = self.host.as_ref() {
            if let Err(err) = host.open_select_key() {
                warn!("credential selection failed: {err:#}");
                return self.available;
            }
        }
        info!("credential selection completed");
        self.available = true;
        self.available
    }

    pub fn revoke(&mut self) {
        self.available = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use anyhow::{bail, Result};

    use super::{key_from_lookup, CredentialGate, CredentialHost, KeySelector, SessionKeyHost};

    struct FixedSelector(Option<&'static str>);

    impl KeySelector for FixedSelector {
        fn select_key(&self) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct BrokenHost {
        checks: AtomicUsize,
    }

    impl CredentialHost for BrokenHost {
        fn has_selected_api_key(&self) -> Result<bool> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            bail!("host bridge unavailable")
        }

        fn open_select_key(&self) -> Result<()> {
            bail!("dialog failed to open")
        }

        fn api_key(&self) -> Option<String> {
            None
        }
    }

    #[test]
    fn missing_host_is_unavailable_but_selection_is_optimistic() {
        let mut gate = CredentialGate::new(None);
        assert!(!gate.check_availability());
        assert!(gate.request_selection());
        assert!(gate.is_available());
    }

    #[test]
    fn host_faults_are_treated_as_unavailable() {
        let host = Arc::new(BrokenHost {
            checks: AtomicUsize::new(0),
        });
        let mut gate = CredentialGate::new(Some(host.clone()));
        assert!(!gate.check_availability());
        assert_eq!(host.checks.load(Ordering::SeqCst), 1);
        assert!(!gate.request_selection());
        assert!(!gate.is_available());
    }

    #[test]
    fn dismissed_selection_still_unblocks_the_gate() {
        let host = Arc::new(SessionKeyHost::new(None, FixedSelector(None)));
        let mut gate = CredentialGate::new(Some(host.clone()));
        assert!(!gate.check_availability());
        assert!(gate.request_selection());
        assert_eq!(host.api_key(), None);
        assert!(!gate.check_availability());
    }

    #[test]
    fn selected_key_is_visible_to_the_host() -> Result<()> {
        let host = SessionKeyHost::new(Some("  ".to_string()), FixedSelector(Some(" key-123 ")));
        assert!(!host.has_selected_api_key()?);
        host.open_select_key()?;
        assert!(host.has_selected_api_key()?);
        assert_eq!(host.api_key().as_deref(), Some("key-123"));
        Ok(())
    }

    #[test]
    fn revoke_clears_availability() {
        let host = Arc::new(SessionKeyHost::new(
            Some("key".to_string()),
            FixedSelector(None),
        ));
        let mut gate = CredentialGate::new(Some(host));
        assert!(gate.check_availability());
        gate.revoke();
        assert!(!gate.is_available());
    }

    #[test]
    fn env_lookup_prefers_gemini_key_and_skips_blanks() {
        let vars = HashMap::from([
            ("GEMINI_API_KEY", " "),
            ("GOOGLE_API_KEY", "google-key"),
            ("API_KEY", "generic-key"),
        ]);
        let key = key_from_lookup(|name| vars.get(name).map(|value| value.to_string()));
        assert_eq!(key.as_deref(), Some("google-key"));
        assert_eq!(key_from_lookup(|_| None), None);
    }
}
