use anyhow::Result;
use chrono::{DateTime, Utc};
use dermascan_contracts::events::{EventPayload, EventWriter, SessionEvent};
use dermascan_contracts::imaging::{AnalysisResult, DataUri, SourceImage};
use dermascan_contracts::session::{
    is_authorization_error, AnalysisPhase, AuthErrorPredicate, AUTHORIZATION_NOTICE,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::ImageAnalyzer;
use crate::credentials::CredentialGate;

/// Why the session refused an operator action. Refusals never change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no API key is selected; connect one first")]
    CredentialUnavailable,
    #[error("no image selected")]
    NoImage,
    #[error("an analysis is already in progress")]
    AnalysisInProgress,
}

/// Proof that the session entered `Analyzing` for one request.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    request_id: u64,
    issued_at: DateTime<Utc>,
    image: SourceImage,
}

impl AnalysisTicket {
    pub fn image(&self) -> &SourceImage {
        &self.image
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed,
    /// Credential revoked; the session is back in `Idle` with its image.
    AuthorizationDenied,
    Failed(String),
    /// The ticket no longer matches the in-flight request and was ignored.
    Stale,
}

/// Session-scoped state machine driving the four analysis phases.
///
/// ```text
/// Idle ──start──▶ Analyzing ──ok──▶ Complete
///  ▲                 │  └──err──▶ Error
///  └──auth denied────┘
/// ```
///
/// `Analyzing` doubles as the lock that keeps a second request from being
/// issued while one is in flight.
pub struct AnalysisSession {
    id: String,
    gate: CredentialGate,
    phase: AnalysisPhase,
    source: Option<SourceImage>,
    result: Option<AnalysisResult>,
    auth_notice: Option<String>,
    last_error: Option<String>,
    in_flight: Option<u64>,
    next_request_id: u64,
    auth_predicate: AuthErrorPredicate,
    events: Option<EventWriter>,
}

impl AnalysisSession {
    pub fn new(gate: CredentialGate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            gate,
            phase: AnalysisPhase::Idle,
            source: None,
            result: None,
            auth_notice: None,
            last_error: None,
            in_flight: None,
            next_request_id: 1,
            auth_predicate: is_authorization_error,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_auth_predicate(mut self, predicate: AuthErrorPredicate) -> Self {
        self.auth_predicate = predicate;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.phase
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn credentials_available(&self) -> bool {
        self.gate.is_available()
    }

    /// Operator-facing message left by the last authorization failure.
    pub fn auth_notice(&self) -> Option<&str> {
        self.auth_notice.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn gate(&self) -> &CredentialGate {
        &self.gate
    }

    /// Startup credential check.
    pub fn verify_credentials(&mut self) -> bool {
        let available = self.gate.check_availability();
        self.emit(SessionEvent::CredentialChecked, json!({ "available": available }));
        available
    }

    /// Runs the host's key selection flow and unblocks the session.
    pub fn connect(&mut self) -> bool {
        let available = self.gate.request_selection();
        if available {
            self.auth_notice = None;
        }
        self.emit(SessionEvent::CredentialSelected, json!({ "available": available }));
        available
    }

    pub fn select_image(&mut self, image: SourceImage) -> Result<(), SessionError> {
        if !self.gate.is_available() {
            return Err(SessionError::CredentialUnavailable);
        }
        if self.phase.is_analyzing() {
            return Err(SessionError::AnalysisInProgress);
        }
        self.emit(
            SessionEvent::ImageSelected,
            json!({
                "label": image.label(),
                "mime_type": image.mime_type(),
                "bytes": image.byte_len(),
            }),
        );
        self.source = Some(image);
        self.result = None;
        self.last_error = None;
        self.phase = AnalysisPhase::Idle;
        Ok(())
    }

    pub fn start_analysis(&mut self) -> Result<AnalysisTicket, SessionError> {
        if !self.phase.accepts_start() {
            return Err(SessionError::AnalysisInProgress);
        }
        if !self.gate.is_available() {
            return Err(SessionError::CredentialUnavailable);
        }
        let Some(image) = self.source.clone() else {
            return Err(SessionError::NoImage);
        };

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(request_id);
        self.result = None;
        self.last_error = None;
        self.phase = AnalysisPhase::Analyzing;

        let ticket = AnalysisTicket {
            request_id,
            issued_at: Utc::now(),
            image,
        };
        info!(request_id, "analysis started");
        self.emit(
            SessionEvent::AnalysisStarted,
            json!({
                "request_id": request_id,
                "issued_at": ticket.issued_at.to_rfc3339(),
            }),
        );
        Ok(ticket)
    }

    pub fn finish_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<DataUri>,
    ) -> AnalysisOutcome {
        if self.in_flight != Some(ticket.request_id) || !self.phase.is_analyzing() {
            debug!(request_id = ticket.request_id, "ignoring stale analysis ticket");
            return AnalysisOutcome::Stale;
        }
        self.in_flight = None;

        let err = match outcome {
            Ok(image) => {
                let created_at = Utc::now().max(ticket.issued_at);
                self.emit(
                    SessionEvent::AnalysisCompleted,
                    json!({
                        "request_id": ticket.request_id,
                        "mime_type": image.mime_type(),
                        "bytes": image.decoded_len(),
                    }),
                );
                self.result = Some(AnalysisResult { image, created_at });
                self.phase = AnalysisPhase::Complete;
                info!(request_id = ticket.request_id, "analysis complete");
                return AnalysisOutcome::Completed;
            }
            Err(err) => err,
        };

        let message = error_chain_text(&err);
        if (self.auth_predicate)(&message) {
            warn!(request_id = ticket.request_id, "analysis denied: {message}");
            self.gate.revoke();
            self.auth_notice = Some(AUTHORIZATION_NOTICE.to_string());
            self.phase = AnalysisPhase::Idle;
            self.emit(
                SessionEvent::AnalysisFailed,
                json!({
                    "request_id": ticket.request_id,
                    "authorization": true,
                    "error": message,
                }),
            );
            self.emit(SessionEvent::CredentialRevoked, json!({}));
            return AnalysisOutcome::AuthorizationDenied;
        }

        warn!(request_id = ticket.request_id, "analysis failed: {message}");
        self.phase = AnalysisPhase::Error;
        self.last_error = Some(message.clone());
        self.emit(
            SessionEvent::AnalysisFailed,
            json!({
                "request_id": ticket.request_id,
                "authorization": false,
                "error": message,
            }),
        );
        AnalysisOutcome::Failed(message)
    }

    /// Starts an analysis, performs the request and applies its outcome.
    pub fn run_analysis(
        &mut self,
        analyzer: &dyn ImageAnalyzer,
    ) -> Result<AnalysisOutcome, SessionError> {
        let ticket = self.start_analysis()?;
        let outcome = analyzer.analyze(ticket.image());
        Ok(self.finish_analysis(ticket, outcome))
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.phase.is_analyzing() {
            return Err(SessionError::AnalysisInProgress);
        }
        self.emit(SessionEvent::SessionReset, json!({ "from": self.phase }));
        self.source = None;
        self.result = None;
        self.last_error = None;
        self.phase = AnalysisPhase::Idle;
        Ok(())
    }

    pub fn status(&self) -> Value {
        let image = self.source.as_ref().map(|image| {
            json!({
                "label": image.label(),
                "mime_type": image.mime_type(),
                "bytes": image.byte_len(),
            })
        });
        let result = self.result.as_ref().map(|result| {
            json!({
                "mime_type": result.image.mime_type(),
                "bytes": result.image.decoded_len(),
                "created_at": result.created_at.to_rfc3339(),
            })
        });
        json!({
            "session_id": self.id,
            "phase": self.phase,
            "credentials_available": self.gate.is_available(),
            "image": image,
            "result": result,
            "auth_notice": self.auth_notice,
            "last_error": self.last_error,
        })
    }

    fn emit(&self, event: SessionEvent, payload: Value) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        let payload = match payload {
            Value::Object(map) => map,
            _ => EventPayload::new(),
        };
        if let Err(err) = events.emit(event, payload) {
            warn!("failed to record {} event: {err:#}", event.as_str());
        }
    }
}

fn error_chain_text(err: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() || parts.last().is_some_and(|last| last == trimmed) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return err.to_string();
    }
    parts.join(" | caused by: ")
}
