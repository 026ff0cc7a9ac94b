use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// Everything an analysis session records about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    CredentialChecked,
    CredentialSelected,
    CredentialRevoked,
    ImageSelected,
    AnalysisStarted,
    AnalysisCompleted,
    AnalysisFailed,
    SessionReset,
}

impl SessionEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CredentialChecked => "credential_checked",
            Self::CredentialSelected => "credential_selected",
            Self::CredentialRevoked => "credential_revoked",
            Self::ImageSelected => "image_selected",
            Self::AnalysisStarted => "analysis_started",
            Self::AnalysisCompleted => "analysis_completed",
            Self::AnalysisFailed => "analysis_failed",
            Self::SessionReset => "session_reset",
        }
    }
}

/// Session trail written as JSON lines.
///
/// Each record is `{type, session_id, ts, ..payload}`. Envelope keys always
/// win over payload keys of the same name. Clones share one file lock.
#[derive(Debug, Clone)]
pub struct EventWriter {
    shared: Arc<TrailFile>,
}

#[derive(Debug)]
struct TrailFile {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(TrailFile {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn emit(&self, event: SessionEvent, payload: EventPayload) -> Result<Value> {
        let mut record = payload;
        record.insert("type".to_string(), Value::from(event.as_str()));
        record.insert(
            "session_id".to_string(),
            Value::from(self.shared.session_id.as_str()),
        );
        record.insert(
            "ts".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        let line = serde_json::to_string(&record)?;

        let trail = &self.shared.path;
        if let Some(dir) = trail.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed creating {}", dir.display()))?;
        }
        let _guard = self
            .shared
            .lock
            .lock()
            .map_err(|_| anyhow!("session trail lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(trail)
            .with_context(|| format!("failed opening {}", trail.display()))?;
        writeln!(file, "{line}")?;

        Ok(Value::Object(record))
    }
}
