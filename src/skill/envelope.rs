//! Alexa-compatible JSON request/response envelopes.
//!
//! Only the fields the skill reads are modelled; everything else in the
//! platform envelope (session, context, attributes) is ignored.

use super::{IntentRequest, RequestKind, SkillResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const LAUNCH_REQUEST: &str = "LaunchRequest";
pub const INTENT_REQUEST: &str = "IntentRequest";

// ── Request ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub version: Option<String>,
    pub request: RequestBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentBody {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<HashMap<String, SlotBody>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl RequestEnvelope {
    pub fn request_id(&self) -> Option<&str> {
        self.request.request_id.as_deref()
    }

    /// Flatten into the router's request shape. Slots without a value are dropped.
    pub fn into_intent_request(self) -> IntentRequest {
        let kind = if self.request.kind == LAUNCH_REQUEST {
            RequestKind::Launch
        } else if self.request.kind == INTENT_REQUEST {
            RequestKind::Intent
        } else {
            RequestKind::Other(self.request.kind)
        };

        let (intent_name, slots) = match self.request.intent {
            Some(intent) => {
                let slots = intent
                    .slots
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|(name, slot)| slot.value.map(|value| (name, value)))
                    .collect();
                (intent.name, slots)
            }
            None => (String::new(), HashMap::new()),
        };

        IntentRequest {
            kind,
            intent_name,
            slots,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub version: String,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(rename = "outputSpeech")]
    pub output_speech: OutputSpeech,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(rename = "shouldEndSession")]
    pub should_end_session: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: String,
    pub ssml: String,
}

impl OutputSpeech {
    pub fn ssml(text: &str) -> Self {
        Self {
            kind: "SSML".into(),
            ssml: format!("<speak>{}</speak>", escape_ssml(text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reprompt {
    #[serde(rename = "outputSpeech")]
    pub output_speech: OutputSpeech,
}

impl From<&SkillResponse> for ResponseEnvelope {
    fn from(response: &SkillResponse) -> Self {
        Self {
            version: "1.0".into(),
            response: ResponseBody {
                output_speech: OutputSpeech::ssml(&response.speech),
                reprompt: response.reprompt.as_deref().map(|text| Reprompt {
                    output_speech: OutputSpeech::ssml(text),
                }),
                should_end_session: response.ends_session(),
            },
        }
    }
}

fn escape_ssml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
