//! Submit-then-poll export client
//!
//! Drives one job through `Built → Submitting → Submitted → Polling →
//! Done | Failed`. Submission failures are returned as errors. Polling
//! failures are logged and reported in the [`PollOutcome`]; the job stays
//! submitted.

use super::ExportApi;
use crate::config::ExportApiConfig;
use crate::core::job::{ExportJobSpec, JobResult, JobState};
use crate::domain::{CourierError, ExportApiError, JobId, Result};
use crate::log_retry_attempt;
use std::sync::Arc;
use std::time::Duration;

/// Bounded retry policy for the final-message poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of GETs
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `n * backoff_unit` after a 425
    pub backoff_unit: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_unit: Duration::from_secs(5),
        }
    }
}

impl From<&ExportApiConfig> for PollPolicy {
    fn from(config: &ExportApiConfig) -> Self {
        Self {
            max_attempts: config.max_poll_attempts,
            backoff_unit: Duration::from_secs(config.poll_backoff_seconds),
        }
    }
}

/// An accepted submission
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub job_id: JobId,
    /// Full submission response
    pub response: serde_json::Value,
}

/// How polling ended
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// `Done` or `Failed`
    pub state: JobState,
    /// GETs issued
    pub attempts: u32,
    /// Delays slept between attempts
    pub delays: Vec<Duration>,
    /// Final message, when `Done`
    pub result: Option<JobResult>,
    /// Why polling failed, when `Failed`
    pub failure: Option<String>,
}

impl PollOutcome {
    fn failed(attempts: u32, delays: Vec<Duration>, failure: String) -> Self {
        Self {
            state: JobState::Failed,
            attempts,
            delays,
            result: None,
            failure: Some(failure),
        }
    }

    /// Whether the final message was received
    pub fn is_done(&self) -> bool {
        self.state == JobState::Done
    }
}

/// A submitted job and its poll outcome
#[derive(Debug, Clone)]
pub struct ExportRun {
    pub submitted: SubmittedJob,
    /// `None` when polling was not requested
    pub poll: Option<PollOutcome>,
}

impl ExportRun {
    /// State the job ended in
    pub fn state(&self) -> JobState {
        match &self.poll {
            Some(outcome) => outcome.state.clone(),
            None => JobState::Submitted(self.submitted.job_id.clone()),
        }
    }

    /// Final message, if polling completed
    pub fn result(&self) -> Option<&JobResult> {
        self.poll.as_ref().and_then(|p| p.result.as_ref())
    }
}

/// Export job client over any [`ExportApi`]
pub struct ExportClient {
    api: Arc<dyn ExportApi>,
    policy: PollPolicy,
}

impl ExportClient {
    /// Create a client with the default poll policy
    pub fn new(api: Arc<dyn ExportApi>) -> Self {
        Self {
            api,
            policy: PollPolicy::default(),
        }
    }

    /// Replace the poll policy
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit a job spec
    ///
    /// # Errors
    ///
    /// Returns an [`ExportApiError`] on transport failure, a non-2xx status,
    /// a non-JSON body, or a response without a string `job_id`.
    pub async fn submit(&self, spec: &ExportJobSpec) -> Result<SubmittedJob> {
        transition(&JobState::Built, &JobState::Submitting);

        let response = match self.api.submit(spec).await {
            Ok(response) => response,
            Err(e) => {
                transition(&JobState::Submitting, &JobState::Failed);
                tracing::error!(
                    base_url = self.api.base_url(),
                    project = %spec.project_name,
                    error = %e,
                    "Export job submission failed"
                );
                return Err(e);
            }
        };

        let job_id = response
            .get("job_id")
            .and_then(serde_json::Value::as_str)
            .and_then(|id| JobId::new(id).ok());
        let Some(job_id) = job_id else {
            transition(&JobState::Submitting, &JobState::Failed);
            tracing::error!(response = %response, "Export API response missing job_id");
            return Err(ExportApiError::MissingJobId.into());
        };

        let submitted = JobState::Submitted(job_id.clone());
        transition(&JobState::Submitting, &submitted);
        tracing::info!(
            job_id = %job_id,
            project = %spec.project_name,
            entries = spec.export_list.len(),
            "Export job submitted"
        );

        Ok(SubmittedJob { job_id, response })
    }

    /// Poll the final message of a submitted job
    ///
    /// An HTTP 425 is retried after `attempt * backoff_unit` while attempts
    /// remain. Any other failure ends polling; it is logged and reported in
    /// the outcome, never returned as an error.
    pub async fn poll_final_message(&self, job_id: &JobId) -> PollOutcome {
        let max_attempts = self.policy.max_attempts;
        let mut delays = Vec::new();
        transition(&JobState::Submitted(job_id.clone()), &JobState::Polling);

        for attempt in 1..=max_attempts {
            let failure = match self.api.final_message(job_id).await {
                Ok(body) => match JobResult::from_json(body) {
                    Ok(result) => {
                        transition(&JobState::Polling, &JobState::Done);
                        tracing::info!(
                            job_id = %job_id,
                            attempt,
                            status = result.status.as_deref().unwrap_or("unknown"),
                            "Final message received"
                        );
                        return PollOutcome {
                            state: JobState::Done,
                            attempts: attempt,
                            delays,
                            result: Some(result),
                            failure: None,
                        };
                    }
                    Err(e) => e.to_string(),
                },
                Err(CourierError::ExportApi(e)) if e.is_too_early() => {
                    if attempt < max_attempts {
                        let wait = self.policy.backoff_unit * attempt;
                        log_retry_attempt!(attempt, max_attempts, "final message not ready");
                        tracing::info!(
                            job_id = %job_id,
                            wait_secs = wait.as_secs_f64(),
                            "Final message not ready (HTTP 425), waiting"
                        );
                        tokio::time::sleep(wait).await;
                        delays.push(wait);
                        continue;
                    }
                    ExportApiError::NotReady { attempts: attempt }.to_string()
                }
                Err(e) => e.to_string(),
            };

            transition(&JobState::Polling, &JobState::Failed);
            tracing::warn!(
                job_id = %job_id,
                attempt,
                error = %failure,
                "Unable to fetch final message"
            );
            return PollOutcome::failed(attempt, delays, failure);
        }

        transition(&JobState::Polling, &JobState::Failed);
        PollOutcome::failed(
            0,
            delays,
            ExportApiError::NotReady { attempts: 0 }.to_string(),
        )
    }

    /// Submit and, when `poll` is set, wait for the final message
    pub async fn run(&self, spec: &ExportJobSpec, poll: bool) -> Result<ExportRun> {
        let submitted = self.submit(spec).await?;
        let poll = if poll {
            Some(self.poll_final_message(&submitted.job_id).await)
        } else {
            None
        };
        Ok(ExportRun { submitted, poll })
    }

    /// Current status of a job
    pub async fn status(&self, job_id: &JobId) -> Result<serde_json::Value> {
        self.api.status(job_id).await
    }

    /// Fetch the final message once, without retrying
    pub async fn fetch_final_message(&self, job_id: &JobId) -> Result<JobResult> {
        let body = self.api.final_message(job_id).await?;
        Ok(JobResult::from_json(body)?)
    }

    /// Delete an exported project
    pub async fn delete_project(&self, project_id: &str) -> Result<serde_json::Value> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(CourierError::Validation(
                "project id must not be empty".to_string(),
            ));
        }
        let response = self.api.delete_project(project_id).await?;
        tracing::info!(project_id, "Deleted exported project");
        Ok(response)
    }
}

fn transition(from: &JobState, to: &JobState) {
    tracing::debug!(from = %from, to = %to, "Export job state transition");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::{JobParams, JobSpecBuilder};
    use crate::domain::ProjectState;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order
    struct ScriptedApi {
        submit: Mutex<VecDeque<Result<serde_json::Value>>>,
        final_message: Mutex<VecDeque<Result<serde_json::Value>>>,
        polls: Mutex<u32>,
    }

    impl ScriptedApi {
        fn new(
            submit: Vec<Result<serde_json::Value>>,
            final_message: Vec<Result<serde_json::Value>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                submit: Mutex::new(submit.into()),
                final_message: Mutex::new(final_message.into()),
                polls: Mutex::new(0),
            })
        }

        fn polls(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ExportApi for ScriptedApi {
        async fn submit(&self, _spec: &ExportJobSpec) -> Result<serde_json::Value> {
            self.submit.lock().unwrap().pop_front().unwrap()
        }

        async fn final_message(&self, _job_id: &JobId) -> Result<serde_json::Value> {
            *self.polls.lock().unwrap() += 1;
            self.final_message.lock().unwrap().pop_front().unwrap()
        }

        async fn status(&self, _job_id: &JobId) -> Result<serde_json::Value> {
            Ok(json!({"status": "running"}))
        }

        async fn delete_project(&self, project_id: &str) -> Result<serde_json::Value> {
            Ok(json!({"deleted": project_id}))
        }

        fn base_url(&self) -> &str {
            "scripted://engine"
        }
    }

    fn too_early() -> Result<serde_json::Value> {
        Err(ExportApiError::HttpStatus {
            status: 425,
            body: "too early".to_string(),
        }
        .into())
    }

    fn spec() -> ExportJobSpec {
        let project = ProjectState {
            name: "P1".to_string(),
            ..Default::default()
        };
        JobSpecBuilder::build(vec![], &project, JobParams::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_retries_too_early_with_linear_backoff() {
        let api = ScriptedApi::new(
            vec![],
            vec![
                too_early(),
                too_early(),
                too_early(),
                Ok(json!({"status": "done", "job_id": "J1"})),
            ],
        );
        let client = ExportClient::new(api.clone());
        let started = tokio::time::Instant::now();

        let outcome = client.poll_final_message(&JobId::new("J1").unwrap()).await;

        assert_eq!(outcome.state, JobState::Done);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(
            outcome.delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(15)
            ]
        );
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        assert_eq!(outcome.result.unwrap().status.as_deref(), Some("done"));
        assert_eq!(api.polls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_gives_up_after_max_attempts() {
        let api = ScriptedApi::new(vec![], vec![too_early(), too_early(), too_early(), too_early()]);
        let client = ExportClient::new(api.clone());

        let outcome = client.poll_final_message(&JobId::new("J1").unwrap()).await;

        assert_eq!(outcome.state, JobState::Failed);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.delays.len(), 3);
        assert!(outcome.failure.unwrap().contains("not ready after 4 attempts"));
        assert_eq!(api.polls(), 4);
    }

    #[tokio::test]
    async fn test_poll_stops_on_other_errors() {
        let api = ScriptedApi::new(
            vec![],
            vec![Err(ExportApiError::HttpStatus {
                status: 500,
                body: "boom".to_string(),
            }
            .into())],
        );
        let client = ExportClient::new(api.clone());

        let outcome = client.poll_final_message(&JobId::new("J1").unwrap()).await;
        assert_eq!(outcome.state, JobState::Failed);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.delays.is_empty());
        assert!(outcome.failure.unwrap().contains("boom"));
        assert_eq!(api.polls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_final_message_does_not_retry() {
        let api = ScriptedApi::new(vec![], vec![too_early(), Ok(json!({"status": "ok"}))]);
        let client = ExportClient::new(api.clone());
        let job_id = JobId::new("J1").unwrap();

        let err = client.fetch_final_message(&job_id).await.unwrap_err();
        assert!(matches!(err, CourierError::ExportApi(ref e) if e.is_too_early()));
        assert_eq!(api.polls(), 1);

        let result = client.fetch_final_message(&job_id).await.unwrap();
        assert_eq!(result.status.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_poll_non_object_fails() {
        let api = ScriptedApi::new(vec![], vec![Ok(json!([1, 2]))]);
        let outcome = ExportClient::new(api)
            .poll_final_message(&JobId::new("J1").unwrap())
            .await;
        assert_eq!(outcome.state, JobState::Failed);
    }

    #[tokio::test]
    async fn test_submit_requires_job_id() {
        let api = ScriptedApi::new(vec![Ok(json!({"status": "queued"}))], vec![]);
        let err = ExportClient::new(api).submit(&spec()).await.unwrap_err();
        assert!(matches!(
            err,
            CourierError::ExportApi(ExportApiError::MissingJobId)
        ));
        assert!(err.to_string().contains("missing job_id"));
    }

    #[tokio::test]
    async fn test_submit_rejects_non_string_job_id() {
        let api = ScriptedApi::new(vec![Ok(json!({"job_id": 17}))], vec![]);
        assert!(ExportClient::new(api).submit(&spec()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_without_poll() {
        let api = ScriptedApi::new(vec![Ok(json!({"job_id": "J5"}))], vec![]);
        let run = ExportClient::new(api.clone()).run(&spec(), false).await.unwrap();
        assert_eq!(run.state(), JobState::Submitted(JobId::new("J5").unwrap()));
        assert!(run.result().is_none());
        assert_eq!(api.polls(), 0);
    }

    #[tokio::test]
    async fn test_run_with_poll() {
        let api = ScriptedApi::new(
            vec![Ok(json!({"job_id": "J5"}))],
            vec![Ok(json!({"type": "done", "message": "ok"}))],
        );
        let run = ExportClient::new(api).run(&spec(), true).await.unwrap();
        assert_eq!(run.state(), JobState::Done);
        assert_eq!(run.result().unwrap().message.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_custom_policy_and_zero_attempts() {
        let api = ScriptedApi::new(vec![], vec![]);
        let client = ExportClient::new(api.clone()).with_policy(PollPolicy {
            max_attempts: 0,
            backoff_unit: Duration::from_millis(1),
        });
        let outcome = client.poll_final_message(&JobId::new("J1").unwrap()).await;
        assert_eq!(outcome.state, JobState::Failed);
        assert_eq!(api.polls(), 0);
    }

    #[tokio::test]
    async fn test_delete_requires_project_id() {
        let api = ScriptedApi::new(vec![], vec![]);
        let client = ExportClient::new(api);
        assert!(client.delete_project(" ").await.is_err());
        assert_eq!(client.delete_project("P1").await.unwrap()["deleted"], "P1");
    }

    #[test]
    fn test_policy_from_config() {
        let config = ExportApiConfig {
            max_poll_attempts: 6,
            poll_backoff_seconds: 2,
            ..Default::default()
        };
        let policy = PollPolicy::from(&config);
        assert_eq!(policy.max_attempts, 6);
        assert_eq!(policy.backoff_unit, Duration::from_secs(2));
        assert_eq!(PollPolicy::default().max_attempts, 4);
    }
}
