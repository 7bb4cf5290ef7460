//! Intent classification from platform requests.

use super::{IntentRequest, RequestKind};
use crate::shadow::ShadowAttribute;

pub const CHECK_HEARTBEAT: &str = "CheckHeartbeatIntent";
pub const CHECK_CALORIES: &str = "CheckCaloriesIntent";
pub const CHANGE_MAX_HEARTBEAT: &str = "ChangeMaxHeartbeatIntent";
pub const CHANGE_MIN_HEARTBEAT: &str = "ChangeMinHeartbeatIntent";
pub const HELP: &str = "AMAZON.HelpIntent";

/// Slot carrying the device (thing) name.
pub const THING_SLOT: &str = "thingName";

/// Which pulse alert threshold a configuration intent writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertBound {
    Max,
    Min,
}

impl AlertBound {
    pub fn attribute(self) -> ShadowAttribute {
        match self {
            Self::Max => ShadowAttribute::MaxPulseAlert,
            Self::Min => ShadowAttribute::MinPulseAlert,
        }
    }

    pub fn slot(self) -> &'static str {
        match self {
            Self::Max => "maxPulseValue",
            Self::Min => "minPulseValue",
        }
    }

    pub fn intent_name(self) -> &'static str {
        match self {
            Self::Max => CHANGE_MAX_HEARTBEAT,
            Self::Min => CHANGE_MIN_HEARTBEAT,
        }
    }

    pub(crate) fn adjective(self) -> &'static str {
        match self {
            Self::Max => "máximo",
            Self::Min => "mínimo",
        }
    }
}

/// A request classified into one of the skill's workflows.
///
/// Slot values are kept as `Option` so each workflow decides what a
/// missing slot means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Launch,
    CheckHeartbeat {
        thing: Option<String>,
    },
    CheckCalories {
        thing: Option<String>,
    },
    ChangePulseAlert {
        bound: AlertBound,
        thing: Option<String>,
        value: Option<String>,
    },
    Help,
    /// Unknown intent name or request type; only the fallback handles it.
    Unrecognized(String),
}

impl Intent {
    pub fn from_request(request: &IntentRequest) -> Self {
        let owned = |name: &str| request.slot(name).map(str::to_string);

        match &request.kind {
            RequestKind::Launch => Self::Launch,
            RequestKind::Other(kind) => Self::Unrecognized(kind.clone()),
            RequestKind::Intent => match request.intent_name.as_str() {
                CHECK_HEARTBEAT => Self::CheckHeartbeat {
                    thing: owned(THING_SLOT),
                },
                CHECK_CALORIES => Self::CheckCalories {
                    thing: owned(THING_SLOT),
                },
                CHANGE_MAX_HEARTBEAT | CHANGE_MIN_HEARTBEAT => {
                    let bound = if request.intent_name == CHANGE_MAX_HEARTBEAT {
                        AlertBound::Max
                    } else {
                        AlertBound::Min
                    };
                    Self::ChangePulseAlert {
                        bound,
                        thing: owned(THING_SLOT),
                        value: owned(bound.slot()),
                    }
                }
                HELP => Self::Help,
                other => Self::Unrecognized(other.to_string()),
            },
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        match self {
            Self::Launch => "LaunchRequest",
            Self::CheckHeartbeat { .. } => CHECK_HEARTBEAT,
            Self::CheckCalories { .. } => CHECK_CALORIES,
            Self::ChangePulseAlert { bound, .. } => bound.intent_name(),
            Self::Help => HELP,
            Self::Unrecognized(name) => name.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_intents() {
        let heartbeat = IntentRequest::intent(CHECK_HEARTBEAT, [(THING_SLOT, "band-1")]);
        assert_eq!(
            Intent::from_request(&heartbeat),
            Intent::CheckHeartbeat {
                thing: Some("band-1".into())
            }
        );

        let calories = IntentRequest::intent(CHECK_CALORIES, [(THING_SLOT, "band-2")]);
        assert_eq!(
            Intent::from_request(&calories),
            Intent::CheckCalories {
                thing: Some("band-2".into())
            }
        );

        let help = IntentRequest::intent(HELP, Vec::<(String, String)>::new());
        assert_eq!(Intent::from_request(&help), Intent::Help);
        assert_eq!(Intent::from_request(&IntentRequest::launch()), Intent::Launch);
    }

    #[test]
    fn threshold_intents_read_their_own_slot() {
        let max = IntentRequest::intent(
            CHANGE_MAX_HEARTBEAT,
            [(THING_SLOT, "band-1"), ("maxPulseValue", "150"), ("minPulseValue", "40")],
        );
        assert_eq!(
            Intent::from_request(&max),
            Intent::ChangePulseAlert {
                bound: AlertBound::Max,
                thing: Some("band-1".into()),
                value: Some("150".into()),
            }
        );

        let min = IntentRequest::intent(CHANGE_MIN_HEARTBEAT, [("maxPulseValue", "150")]);
        assert_eq!(
            Intent::from_request(&min),
            Intent::ChangePulseAlert {
                bound: AlertBound::Min,
                thing: None,
                value: None,
            }
        );
    }

    #[test]
    fn unknown_names_and_request_types_are_unrecognized() {
        let unknown = IntentRequest::intent("AMAZON.StopIntent", Vec::<(String, String)>::new());
        assert_eq!(
            Intent::from_request(&unknown),
            Intent::Unrecognized("AMAZON.StopIntent".into())
        );

        let ended = IntentRequest {
            kind: RequestKind::Other("SessionEndedRequest".into()),
            ..IntentRequest::launch()
        };
        assert_eq!(Intent::from_request(&ended).name(), "SessionEndedRequest");
    }

    #[test]
    fn bounds_map_to_shadow_attributes() {
        assert_eq!(AlertBound::Max.attribute(), ShadowAttribute::MaxPulseAlert);
        assert_eq!(AlertBound::Min.attribute(), ShadowAttribute::MinPulseAlert);
        assert_eq!(AlertBound::Min.intent_name(), CHANGE_MIN_HEARTBEAT);
    }
}
