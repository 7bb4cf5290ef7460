//! Intent router with the catch-all error handler.

use super::intent::THING_SLOT;
use super::{speech, workflows, ConvergenceWait, Intent, IntentRequest, SkillResponse};
use crate::config::HeartbeatConfig;
use crate::error::{SkillError, SkillResult};
use crate::shadow::ShadowClient;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on one request, shadow calls and convergence wait included.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(25);

/// Routes each request to its workflow and never lets an error escape.
pub struct IntentRouter {
    client: Arc<dyn ShadowClient>,
    wait: ConvergenceWait,
    deadline: Duration,
}

impl IntentRouter {
    pub fn new(client: Arc<dyn ShadowClient>, wait: ConvergenceWait) -> Self {
        Self {
            client,
            wait,
            deadline: REQUEST_DEADLINE,
        }
    }

    /// Override the per-request deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Create from a `[heartbeat]` config section.
    pub fn from_config(client: Arc<dyn ShadowClient>, config: &HeartbeatConfig) -> Self {
        Self::new(client, config.convergence_wait())
    }

    pub fn convergence_wait(&self) -> &ConvergenceWait {
        &self.wait
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Handle one request. Unrecovered errors, including running past the
    /// deadline, become the generic spoken failure.
    pub async fn handle(&self, request: &IntentRequest) -> SkillResponse {
        let intent = Intent::from_request(request);
        let name = intent.name().to_string();
        tracing::info!(intent = %name, "Routing skill request");

        let result = match tokio::time::timeout(self.deadline, self.dispatch(intent)).await {
            Ok(result) => result,
            Err(_) => Err(SkillError::DeadlineExceeded {
                intent: name,
                after_ms: u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        match result {
            Ok(response) => response,
            Err(e) => Self::fallback(&e),
        }
    }

    async fn dispatch(&self, intent: Intent) -> SkillResult<SkillResponse> {
        let client = self.client.as_ref();

        match intent {
            Intent::Launch => Ok(workflows::launch()),
            Intent::Help => Ok(workflows::help()),
            Intent::CheckHeartbeat { thing } => {
                let thing = thing.ok_or_else(|| SkillError::MissingSlot(THING_SLOT.into()))?;
                workflows::check_heartbeat(client, &self.wait, &thing).await
            }
            Intent::CheckCalories { thing } => {
                let thing = thing.ok_or_else(|| SkillError::MissingSlot(THING_SLOT.into()))?;
                workflows::check_calories(client, &thing).await
            }
            Intent::ChangePulseAlert {
                bound,
                thing,
                value,
            } => {
                workflows::change_pulse_alert(client, bound, thing.as_deref(), value.as_deref())
                    .await
            }
            Intent::Unrecognized(name) => Err(SkillError::UnhandledRequest(name)),
        }
    }

    fn fallback(error: &SkillError) -> SkillResponse {
        tracing::error!(kind = error.kind(), "Error handled: {error}");
        SkillResponse::ask(speech::GENERIC_ERROR)
    }
}
