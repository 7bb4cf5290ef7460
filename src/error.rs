//! Error taxonomy for skill workflows.
//!
//! Only [`SkillError::MissingSlot`] is recovered locally (threshold
//! workflows turn it into a clarification prompt). Every other kind
//! reaches the router's fallback handler, which logs the specific error
//! and speaks one generic failure message.

use thiserror::Error;

/// Errors raised while serving a skill request.
#[derive(Debug, Error)]
pub enum SkillError {
    /// Reading the device shadow failed (unknown thing, network, permissions, bad body).
    #[error("failed to fetch shadow for '{thing}': {detail}")]
    RemoteFetch { thing: String, detail: String },

    /// Submitting a desired-state delta failed.
    #[error("failed to update shadow for '{thing}': {detail}")]
    RemoteUpdate { thing: String, detail: String },

    /// A numeric slot did not hold an integer.
    #[error("slot '{slot}' is not a valid number: '{value}'")]
    InvalidNumber { slot: String, value: String },

    /// A required slot was absent or empty.
    #[error("missing required slot '{0}'")]
    MissingSlot(String),

    /// No workflow accepts this request type or intent name.
    #[error("no handler for request '{0}'")]
    UnhandledRequest(String),

    /// The workflow did not finish before the router's deadline.
    #[error("'{intent}' did not finish within {after_ms} ms")]
    DeadlineExceeded { intent: String, after_ms: u64 },
}

impl SkillError {
    /// Stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteFetch { .. } => "remote_fetch",
            Self::RemoteUpdate { .. } => "remote_update",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::MissingSlot(_) => "missing_slot",
            Self::UnhandledRequest(_) => "unhandled_request",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }
}

pub type SkillResult<T> = Result<T, SkillError>;
