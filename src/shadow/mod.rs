//! Device shadow access for the heart-rate band.
//!
//! A shadow is a remote JSON document with two independently owned
//! sections: `desired` (written only by this service) and `reported`
//! (written only by the device). Nothing here caches a document; every
//! workflow step that needs state re-fetches it.
//!
//! ## Design
//! - [`ShadowClient`] trait injected into the router as `Arc<dyn ShadowClient>`
//! - [`HttpShadowClient`] talks to the AWS IoT data-plane REST API
//! - Requests are SigV4-signed when credentials are configured
//! - One round trip per call: no retries, no memoization

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod sigv4;

use crate::error::SkillResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use http::HttpShadowClient;
pub use sigv4::Credentials;

// ── Attributes ───────────────────────────────────────────────────

/// Shadow attributes the skill reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShadowAttribute {
    /// 0/1 flag asking the band to sample and report its pulse.
    PulseRequested,
    /// Last sampled pulse, beats per minute.
    HeartRate,
    /// Calories burned, reported continuously.
    Calories,
    /// Upper pulse alert threshold.
    MaxPulseAlert,
    /// Lower pulse alert threshold.
    MinPulseAlert,
}

impl ShadowAttribute {
    /// Key used inside the shadow document.
    pub fn key(self) -> &'static str {
        match self {
            Self::PulseRequested => "pulse_requested",
            Self::HeartRate => "heart_rate",
            Self::Calories => "calories",
            Self::MaxPulseAlert => "max_pulse_alert",
            Self::MinPulseAlert => "min_pulse_alert",
        }
    }
}

impl std::fmt::Display for ShadowAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ── State document ───────────────────────────────────────────────

type Section = serde_json::Map<String, serde_json::Value>;

/// The `state` object of a shadow document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowSections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<Section>,
}

/// A device shadow as returned by the shadow service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub state: ShadowSections,
    /// Document version, incremented by the service on every update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Epoch seconds of the last update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl StateDocument {
    /// Integer value the device last reported for `attr`, if any.
    ///
    /// Floats are truncated; strings, booleans and nulls read as absent.
    pub fn reported(&self, attr: ShadowAttribute) -> Option<i64> {
        read_integer(self.state.reported.as_ref(), attr)
    }

    /// Reported value with the zero fallback the workflows rely on.
    ///
    /// "Never reported" and "reported zero" are indistinguishable here.
    pub fn reported_or_zero(&self, attr: ShadowAttribute) -> i64 {
        self.reported(attr).unwrap_or(0)
    }

    /// Builder used by fixtures and the CLI: set a reported value.
    pub fn with_reported(mut self, attr: ShadowAttribute, value: i64) -> Self {
        self.state
            .reported
            .get_or_insert_with(Section::new)
            .insert(attr.key().to_string(), serde_json::Value::from(value));
        self
    }
}

fn read_integer(section: Option<&Section>, attr: ShadowAttribute) -> Option<i64> {
    let value = section?.get(attr.key())?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
}

// ── Desired patch ────────────────────────────────────────────────

/// Partial `desired` section submitted as a single update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredPatch {
    values: BTreeMap<ShadowAttribute, i64>,
}

impl DesiredPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `attr` to `value`, replacing any earlier value for it.
    #[must_use]
    pub fn set(mut self, attr: ShadowAttribute, value: i64) -> Self {
        self.values.insert(attr, value);
        self
    }

    /// Update request body: `{"state":{"desired":{...}}}`.
    pub fn to_payload(&self) -> serde_json::Value {
        let desired: Section = self
            .values
            .iter()
            .map(|(attr, value)| (attr.key().to_string(), serde_json::Value::from(*value)))
            .collect();
        serde_json::json!({ "state": { "desired": desired } })
    }
}

/// Acknowledgement of an accepted update. The device may not have applied it yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateAck {
    /// Shadow version after the update, when the service echoes it.
    pub version: Option<u64>,
}

// ── Client trait ─────────────────────────────────────────────────

/// Remote shadow operations, keyed by thing name.
///
/// Implementations perform exactly one round trip per call.
#[async_trait]
pub trait ShadowClient: Send + Sync {
    /// Fetch the current shadow document.
    async fn fetch_state(&self, thing: &str) -> SkillResult<StateDocument>;

    /// Submit `patch` as a delta to the `desired` section.
    async fn request_state_change(&self, thing: &str, patch: &DesiredPatch)
        -> SkillResult<UpdateAck>;
}
