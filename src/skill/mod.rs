//! Voice skill: intent routing and the band workflows.
//!
//! The voice platform delivers a classified, slot-filled intent; the
//! router picks a workflow, the workflow talks to the device shadow, and
//! a spoken [`SkillResponse`] comes back.
//!
//! ## Design
//! - [`Intent`] enum built from an [`IntentRequest`], dispatched through one `match`
//! - Workflows take the shadow client by reference; no global client handle
//! - Errors other than missing threshold slots end in one generic spoken failure
//! - Response strings are literal Spanish phrases (see [`speech`])

pub mod envelope;
pub mod intent;
pub mod router;
pub mod speech;
pub mod workflows;

use std::collections::HashMap;

pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use intent::{AlertBound, Intent};
pub use router::{IntentRouter, REQUEST_DEADLINE};
pub use workflows::{ConvergenceWait, HeartbeatPhase};

// ── Inbound request ──────────────────────────────────────────────

/// Kind of inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// The user opened the skill without an intent.
    Launch,
    /// A classified intent with slots.
    Intent,
    /// Any other platform request type (e.g. `SessionEndedRequest`).
    Other(String),
}

/// One structured request from the voice platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub kind: RequestKind,
    pub intent_name: String,
    pub slots: HashMap<String, String>,
}

impl IntentRequest {
    pub fn launch() -> Self {
        Self {
            kind: RequestKind::Launch,
            intent_name: String::new(),
            slots: HashMap::new(),
        }
    }

    pub fn intent<K, V>(name: &str, slots: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: RequestKind::Intent,
            intent_name: name.to_string(),
            slots: slots
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Slot value, or `None` when absent or blank. Non-blank values are returned verbatim.
    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

// ── Outbound response ────────────────────────────────────────────

/// Spoken reply, with an optional reprompt that keeps the session open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillResponse {
    pub speech: String,
    pub reprompt: Option<String>,
}

impl SkillResponse {
    /// Speak and keep listening, reprompting with the same text.
    pub fn ask(speech: impl Into<String>) -> Self {
        let speech = speech.into();
        Self {
            reprompt: Some(speech.clone()),
            speech,
        }
    }

    /// Speak and end the session.
    pub fn tell(speech: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            reprompt: None,
        }
    }

    pub fn ends_session(&self) -> bool {
        self.reprompt.is_none()
    }
}
