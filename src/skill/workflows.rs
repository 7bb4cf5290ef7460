//! The band workflows.
//!
//! The heartbeat query is the only one with ordering: the band samples its
//! pulse on demand, so the workflow asks for a reading, waits for the band
//! to converge, then reads what it reported.
//!
//! ```text
//! REQUESTING ──▸ WAITING ──▸ POLLING ──▸ DONE
//!  desired.pulse_requested = 1   sleep   read reported.heart_rate
//! ```

use super::{speech, AlertBound, SkillResponse};
use crate::error::{SkillError, SkillResult};
use crate::shadow::{DesiredPatch, ShadowAttribute, ShadowClient};
use std::time::Duration;

/// How long to let the band converge before reading `reported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceWait {
    /// One unconditional delay followed by exactly one read.
    Fixed(Duration),
    /// An initial delay, then up to `max_polls` reads `interval` apart,
    /// stopping at the first positive reading.
    Poll {
        initial: Duration,
        interval: Duration,
        max_polls: u32,
    },
}

impl ConvergenceWait {
    fn initial(&self) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Poll { initial, .. } => initial,
        }
    }

    /// Longest total time spent sleeping, excluding the shadow calls themselves.
    pub fn max_sleep(&self) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Poll {
                initial,
                interval,
                max_polls,
            } => initial.saturating_add(interval.saturating_mul(max_polls.max(1) - 1)),
        }
    }
}

impl Default for ConvergenceWait {
    fn default() -> Self {
        Self::Fixed(Duration::from_secs(3))
    }
}

/// Heartbeat workflow states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatPhase {
    Requesting,
    Waiting,
    Polling,
    Done,
}

impl HeartbeatPhase {
    fn next(self) -> Self {
        match self {
            Self::Requesting => Self::Waiting,
            Self::Waiting => Self::Polling,
            Self::Polling | Self::Done => Self::Done,
        }
    }
}

fn advance(thing: &str, phase: &mut HeartbeatPhase) {
    *phase = phase.next();
    tracing::debug!(thing, phase = ?*phase, "Heartbeat workflow transition");
}

/// Ask the band for a pulse reading, wait, then read it back.
///
/// A failed request propagates (the caller speaks the generic error). A
/// failed read is logged and spoken exactly like a zero reading.
pub async fn check_heartbeat(
    client: &dyn ShadowClient,
    wait: &ConvergenceWait,
    thing: &str,
) -> SkillResult<SkillResponse> {
    let mut phase = HeartbeatPhase::Requesting;
    tracing::debug!(thing, phase = ?phase, "Heartbeat workflow started");

    let request = DesiredPatch::new().set(ShadowAttribute::PulseRequested, 1);
    client.request_state_change(thing, &request).await?;
    advance(thing, &mut phase);

    tokio::time::sleep(wait.initial()).await;
    advance(thing, &mut phase);

    let bpm = match *wait {
        ConvergenceWait::Fixed(_) => read_heart_rate(client, thing).await,
        ConvergenceWait::Poll {
            interval,
            max_polls,
            ..
        } => {
            let polls = max_polls.max(1);
            let mut bpm = 0;
            for attempt in 1..=polls {
                bpm = read_heart_rate(client, thing).await;
                if bpm > 0 || attempt == polls {
                    break;
                }
                tracing::debug!(thing, attempt, "No pulse reported yet, polling again");
                tokio::time::sleep(interval).await;
            }
            bpm
        }
    };
    advance(thing, &mut phase);

    if bpm > 0 {
        tracing::info!(thing, bpm, "Heartbeat reading retrieved");
        Ok(SkillResponse::ask(speech::heartbeat(thing, bpm)))
    } else {
        tracing::info!(thing, "No heartbeat reading available");
        Ok(SkillResponse::ask(speech::HEARTBEAT_UNAVAILABLE))
    }
}

async fn read_heart_rate(client: &dyn ShadowClient, thing: &str) -> i64 {
    match client.fetch_state(thing).await {
        Ok(doc) => doc.reported_or_zero(ShadowAttribute::HeartRate),
        Err(e) => {
            tracing::warn!(thing, "Heartbeat read failed, treating as no reading: {e}");
            0
        }
    }
}

/// Read the calories the band has been reporting. No request phase.
pub async fn check_calories(
    client: &dyn ShadowClient,
    thing: &str,
) -> SkillResult<SkillResponse> {
    let doc = client.fetch_state(thing).await?;
    let calories = doc.reported_or_zero(ShadowAttribute::Calories);

    if calories > 0 {
        Ok(SkillResponse::ask(speech::calories(thing, calories)))
    } else {
        Ok(SkillResponse::ask(speech::CALORIES_UNAVAILABLE))
    }
}

/// Write a pulse alert threshold.
///
/// Missing slots are answered with a clarification prompt and no remote
/// call. The confirmation echoes the thing and the threshold as spoken.
pub async fn change_pulse_alert(
    client: &dyn ShadowClient,
    bound: AlertBound,
    thing: Option<&str>,
    value: Option<&str>,
) -> SkillResult<SkillResponse> {
    let (thing, raw) = match require_slots(bound, thing, value) {
        Ok(slots) => slots,
        Err(SkillError::MissingSlot(slot)) => {
            tracing::info!(slot = %slot, intent = bound.intent_name(), "Asking user for missing slot");
            return Ok(SkillResponse::ask(speech::alert_missing_slots(bound)));
        }
        Err(e) => return Err(e),
    };

    let threshold = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| SkillError::InvalidNumber {
            slot: bound.slot().to_string(),
            value: raw.to_string(),
        })?;

    let patch = DesiredPatch::new().set(bound.attribute(), threshold);
    client.request_state_change(thing, &patch).await?;
    tracing::info!(thing, attribute = %bound.attribute(), threshold, "Pulse alert updated");

    Ok(SkillResponse::tell(speech::alert_configured(bound, thing, raw)))
}

fn require_slots<'a>(
    bound: AlertBound,
    thing: Option<&'a str>,
    value: Option<&'a str>,
) -> SkillResult<(&'a str, &'a str)> {
    let thing = thing.ok_or_else(|| SkillError::MissingSlot(super::intent::THING_SLOT.into()))?;
    let value = value.ok_or_else(|| SkillError::MissingSlot(bound.slot().into()))?;
    Ok((thing, value))
}

pub fn launch() -> SkillResponse {
    SkillResponse::ask(speech::LAUNCH)
}

pub fn help() -> SkillResponse {
    SkillResponse::ask(speech::HELP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::mock::{FetchOutcome, RecordingShadowClient, ShadowCall};
    use crate::shadow::StateDocument;

    fn no_wait() -> ConvergenceWait {
        ConvergenceWait::Fixed(Duration::ZERO)
    }

    #[test]
    fn max_sleep_counts_initial_delay_and_poll_gaps() {
        assert_eq!(
            ConvergenceWait::default().max_sleep(),
            Duration::from_secs(3)
        );
        let poll = ConvergenceWait::Poll {
            initial: Duration::from_millis(3000),
            interval: Duration::from_millis(1000),
            max_polls: 3,
        };
        assert_eq!(poll.max_sleep(), Duration::from_millis(5000));
        let single = ConvergenceWait::Poll {
            initial: Duration::from_millis(500),
            interval: Duration::from_secs(60),
            max_polls: 0,
        };
        assert_eq!(single.max_sleep(), Duration::from_millis(500));
    }

    fn reporting(attr: ShadowAttribute, value: i64) -> StateDocument {
        StateDocument::default().with_reported(attr, value)
    }

    #[tokio::test]
    async fn heartbeat_requests_then_waits_then_reads_once() {
        let client = RecordingShadowClient::returning(reporting(ShadowAttribute::HeartRate, 72));
        let wait = ConvergenceWait::Fixed(Duration::from_millis(40));

        let response = check_heartbeat(&client, &wait, "band-1").await.unwrap();

        let calls = client.timed_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].0,
            ShadowCall::Update(
                "band-1".into(),
                DesiredPatch::new().set(ShadowAttribute::PulseRequested, 1)
            )
        );
        assert_eq!(calls[1].0, ShadowCall::Fetch("band-1".into()));
        assert!(calls[1].1.duration_since(calls[0].1) >= Duration::from_millis(40));

        assert!(response.speech.contains("72"));
        assert!(response.speech.contains("band-1"));
    }

    #[tokio::test]
    async fn heartbeat_zero_and_fetch_failure_sound_the_same() {
        let zero = RecordingShadowClient::returning(reporting(ShadowAttribute::HeartRate, 0));
        let failing = RecordingShadowClient::new().then_fetch(FetchOutcome::Fail);

        let from_zero = check_heartbeat(&zero, &no_wait(), "band-1").await.unwrap();
        let from_error = check_heartbeat(&failing, &no_wait(), "band-1").await.unwrap();

        assert_eq!(from_zero.speech, speech::HEARTBEAT_UNAVAILABLE);
        assert_eq!(from_zero, from_error);
    }

    #[tokio::test]
    async fn heartbeat_missing_reading_is_unavailable() {
        let client = RecordingShadowClient::returning(StateDocument::default());
        let response = check_heartbeat(&client, &no_wait(), "band-1").await.unwrap();
        assert_eq!(response.speech, speech::HEARTBEAT_UNAVAILABLE);
    }

    #[tokio::test]
    async fn heartbeat_request_failure_propagates_without_reading() {
        let client = RecordingShadowClient::returning(reporting(ShadowAttribute::HeartRate, 72))
            .failing_updates();

        let result = check_heartbeat(&client, &no_wait(), "band-1").await;

        assert!(matches!(result, Err(SkillError::RemoteUpdate { .. })));
        assert!(client
            .calls()
            .iter()
            .all(|call| !matches!(call, ShadowCall::Fetch(_))));
    }

    #[tokio::test]
    async fn heartbeat_poll_mode_stops_at_first_reading() {
        let client = RecordingShadowClient::new()
            .then_fetch(FetchOutcome::Document(StateDocument::default()))
            .then_fetch(FetchOutcome::Fail)
            .then_fetch(FetchOutcome::Document(reporting(ShadowAttribute::HeartRate, 88)));
        let wait = ConvergenceWait::Poll {
            initial: Duration::ZERO,
            interval: Duration::from_millis(1),
            max_polls: 5,
        };

        let response = check_heartbeat(&client, &wait, "band-1").await.unwrap();

        let fetches = client
            .calls()
            .iter()
            .filter(|call| matches!(call, ShadowCall::Fetch(_)))
            .count();
        assert_eq!(fetches, 3);
        assert!(response.speech.contains("88"));
    }

    #[tokio::test]
    async fn heartbeat_poll_mode_gives_up_after_max_polls() {
        let client = RecordingShadowClient::returning(StateDocument::default());
        let wait = ConvergenceWait::Poll {
            initial: Duration::ZERO,
            interval: Duration::from_millis(1),
            max_polls: 2,
        };

        let response = check_heartbeat(&client, &wait, "band-1").await.unwrap();

        assert_eq!(client.calls().len(), 3);
        assert_eq!(response.speech, speech::HEARTBEAT_UNAVAILABLE);
    }

    #[tokio::test]
    async fn calories_reads_without_requesting() {
        let client = RecordingShadowClient::returning(reporting(ShadowAttribute::Calories, 450));

        let response = check_calories(&client, "band-1").await.unwrap();

        assert_eq!(client.calls(), vec![ShadowCall::Fetch("band-1".into())]);
        assert!(response.speech.contains("450"));
        assert!(response.speech.contains("band-1"));
    }

    #[tokio::test]
    async fn calories_zero_or_missing_is_unavailable() {
        let zero = RecordingShadowClient::returning(reporting(ShadowAttribute::Calories, 0));
        let missing = RecordingShadowClient::returning(StateDocument::default());

        for client in [zero, missing] {
            let response = check_calories(&client, "band-1").await.unwrap();
            assert_eq!(response.speech, speech::CALORIES_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn calories_fetch_failure_propagates() {
        let client = RecordingShadowClient::new().then_fetch(FetchOutcome::Fail);
        let result = check_calories(&client, "band-1").await;
        assert!(matches!(result, Err(SkillError::RemoteFetch { .. })));
    }

    #[tokio::test]
    async fn threshold_writes_exactly_one_patch_and_confirms() {
        for (bound, attr) in [
            (AlertBound::Max, ShadowAttribute::MaxPulseAlert),
            (AlertBound::Min, ShadowAttribute::MinPulseAlert),
        ] {
            let client = RecordingShadowClient::new();

            let response = change_pulse_alert(&client, bound, Some("band-9"), Some("135"))
                .await
                .unwrap();

            assert_eq!(
                client.calls(),
                vec![ShadowCall::Update(
                    "band-9".into(),
                    DesiredPatch::new().set(attr, 135)
                )]
            );
            assert!(response.speech.contains("band-9"));
            assert!(response.speech.contains("135"));
            assert!(response.ends_session());
        }
    }

    #[tokio::test]
    async fn threshold_missing_slots_prompt_without_remote_call() {
        let cases = [
            (None, Some("120")),
            (Some("band-1"), None),
            (None, None),
        ];
        for (thing, value) in cases {
            let client = RecordingShadowClient::new();

            let response = change_pulse_alert(&client, AlertBound::Max, thing, value)
                .await
                .unwrap();

            assert!(client.calls().is_empty());
            assert_eq!(response.speech, speech::alert_missing_slots(AlertBound::Max));
            assert!(!response.ends_session());
        }
    }

    #[tokio::test]
    async fn threshold_rejects_non_numeric_value() {
        let client = RecordingShadowClient::new();

        let result = change_pulse_alert(&client, AlertBound::Min, Some("band-1"), Some("cien")).await;

        match result {
            Err(SkillError::InvalidNumber { slot, value }) => {
                assert_eq!(slot, "minPulseValue");
                assert_eq!(value, "cien");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn threshold_update_failure_propagates() {
        let client = RecordingShadowClient::new().failing_updates();
        let result = change_pulse_alert(&client, AlertBound::Max, Some("band-1"), Some("150")).await;
        assert!(matches!(result, Err(SkillError::RemoteUpdate { .. })));
    }

    #[test]
    fn static_workflows_reprompt() {
        assert_eq!(launch().speech, speech::LAUNCH);
        assert_eq!(help().reprompt.as_deref(), Some(speech::HELP));
    }

    #[test]
    fn phases_advance_in_order() {
        let mut phase = HeartbeatPhase::Requesting;
        let mut seen = vec![phase];
        while phase != HeartbeatPhase::Done {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                HeartbeatPhase::Requesting,
                HeartbeatPhase::Waiting,
                HeartbeatPhase::Polling,
                HeartbeatPhase::Done,
            ]
        );
    }
}
