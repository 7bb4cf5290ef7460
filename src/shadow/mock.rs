//! Recording shadow client for workflow, router and gateway tests.

use super::{DesiredPatch, ShadowClient, StateDocument, UpdateAck};
use crate::error::{SkillError, SkillResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowCall {
    Fetch(String),
    Update(String, DesiredPatch),
}

/// Scripted outcome for the next `fetch_state` call.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Document(StateDocument),
    Fail,
}

#[derive(Default)]
pub struct RecordingShadowClient {
    calls: Mutex<Vec<(ShadowCall, Instant)>>,
    fetches: Mutex<VecDeque<FetchOutcome>>,
    fail_updates: bool,
}

impl RecordingShadowClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch returns `doc`.
    pub fn returning(doc: StateDocument) -> Self {
        Self::new().then_fetch(FetchOutcome::Document(doc))
    }

    /// Queue a fetch outcome. The last queued outcome repeats once the queue drains.
    pub fn then_fetch(self, outcome: FetchOutcome) -> Self {
        self.fetches.lock().push_back(outcome);
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn calls(&self) -> Vec<ShadowCall> {
        self.calls.lock().iter().map(|(call, _)| call.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(ShadowCall, Instant)> {
        self.calls.lock().clone()
    }

    fn next_fetch(&self) -> FetchOutcome {
        let mut fetches = self.fetches.lock();
        if fetches.len() > 1 {
            fetches.pop_front().unwrap_or(FetchOutcome::Fail)
        } else {
            fetches
                .front()
                .cloned()
                .unwrap_or_else(|| FetchOutcome::Document(StateDocument::default()))
        }
    }
}

#[async_trait]
impl ShadowClient for RecordingShadowClient {
    async fn fetch_state(&self, thing: &str) -> SkillResult<StateDocument> {
        self.calls
            .lock()
            .push((ShadowCall::Fetch(thing.to_string()), Instant::now()));
        match self.next_fetch() {
            FetchOutcome::Document(doc) => Ok(doc),
            FetchOutcome::Fail => Err(SkillError::RemoteFetch {
                thing: thing.to_string(),
                detail: "scripted failure".into(),
            }),
        }
    }

    async fn request_state_change(
        &self,
        thing: &str,
        patch: &DesiredPatch,
    ) -> SkillResult<UpdateAck> {
        self.calls.lock().push((
            ShadowCall::Update(thing.to_string(), patch.clone()),
            Instant::now(),
        ));
        if self.fail_updates {
            return Err(SkillError::RemoteUpdate {
                thing: thing.to_string(),
                detail: "scripted failure".into(),
            });
        }
        Ok(UpdateAck { version: Some(1) })
    }
}
