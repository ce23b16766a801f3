//! Fixed-interval status polling for submitted generation jobs.
//!
//! ```text
//! Submitted -> Pending -> Pending -> ... -> Succeeded | Failed
//!                                       \-> TimedOut (attempts exhausted)
//! ```
//!
//! The first status check runs as soon as [`JobPoller::poll`] is called; every
//! later check is preceded by one `interval` of sleep. A failing check counts
//! as an attempt, and `max_consecutive_failures` failures in a row end the
//! loop with [`PollError::StatusCheckFailed`]. The [`CancellationToken`] is
//! honoured at the top of every pass and while sleeping, but a status call
//! that is already in flight is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::job::{JobHandle, JobOutcome};
use crate::services::providers::{GenerationProvider, ProviderError};

/// Tunable parameters for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Upper bound on status checks, failed ones included.
    pub max_attempts: u32,
    /// Failed checks in a row tolerated before giving up.
    pub max_consecutive_failures: u32,
    /// Ceiling for a single status call.
    pub call_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
            max_consecutive_failures: 3,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Invoked with the progress hint of every Pending check.
pub type ProgressCallback = Arc<dyn Fn(Option<u8>) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Status check failed {failures} times in a row: {source}")]
    StatusCheckFailed {
        failures: u32,
        #[source]
        source: ProviderError,
    },

    #[error("Polling cancelled")]
    Cancelled,
}

#[derive(Clone)]
pub struct JobPoller {
    config: PollConfig,
    on_progress: Option<ProgressCallback>,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            on_progress: None,
        }
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Drive `handle` to a terminal outcome.
    ///
    /// Returns `Succeeded`, `Failed` or `TimedOut`; never `Pending`.
    pub async fn poll(
        &self,
        provider: &dyn GenerationProvider,
        handle: &JobHandle,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, PollError> {
        let started = Instant::now();
        let failure_budget = self.config.max_consecutive_failures.max(1);
        let mut consecutive_failures = 0u32;

        for attempt in 1..=self.config.max_attempts {
            if cancel.is_cancelled() {
                return Err(self.cancelled(handle, attempt - 1));
            }

            if attempt > 1 {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(self.cancelled(handle, attempt - 1)),
                    _ = tokio::time::sleep(self.config.interval) => {}
                }
            }

            let checked = match tokio::time::timeout(
                self.config.call_timeout,
                provider.query_status(handle),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::status(format!(
                    "no answer within {}s",
                    self.config.call_timeout.as_secs()
                ))),
            };

            // TimedOut is the loop's own verdict, not something a provider can say.
            let checked = checked.map(|outcome| match outcome {
                JobOutcome::TimedOut => JobOutcome::Pending(None),
                other => other,
            });

            match checked {
                Ok(JobOutcome::Pending(progress)) => {
                    consecutive_failures = 0;
                    tracing::debug!(
                        job_id = %handle.external_job_id,
                        provider = %handle.provider_id,
                        attempt,
                        progress = ?progress,
                        "Job still pending"
                    );
                    if let Some(callback) = &self.on_progress {
                        callback(progress);
                    }
                }
                Ok(outcome) => {
                    tracing::info!(
                        job_id = %handle.external_job_id,
                        provider = %handle.provider_id,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        succeeded = matches!(outcome, JobOutcome::Succeeded(_)),
                        "Job reached terminal state"
                    );
                    self.record(attempt, started);
                    return Ok(outcome);
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        job_id = %handle.external_job_id,
                        provider = %handle.provider_id,
                        attempt,
                        consecutive_failures,
                        error = %e,
                        "Status check failed"
                    );
                    if consecutive_failures >= failure_budget {
                        self.record(attempt, started);
                        return Err(PollError::StatusCheckFailed {
                            failures: consecutive_failures,
                            source: e,
                        });
                    }
                }
            }
        }

        tracing::warn!(
            job_id = %handle.external_job_id,
            provider = %handle.provider_id,
            attempts = self.config.max_attempts,
            "Job did not finish before the attempt limit"
        );
        self.record(self.config.max_attempts, started);
        Ok(JobOutcome::TimedOut)
    }

    fn cancelled(&self, handle: &JobHandle, attempts: u32) -> PollError {
        tracing::info!(
            job_id = %handle.external_job_id,
            provider = %handle.provider_id,
            attempts,
            "Polling cancelled"
        );
        PollError::Cancelled
    }

    fn record(&self, attempts: u32, started: Instant) {
        metrics::histogram!("generation_poll_attempts").record(attempts as f64);
        metrics::histogram!("generation_poll_seconds").record(started.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockProvider;
    use std::sync::Mutex;

    fn config(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(10),
            max_attempts,
            max_consecutive_failures: 3,
            call_timeout: Duration::from_secs(30),
        }
    }

    fn handle() -> JobHandle {
        JobHandle::new("mock", "job-1")
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_k_pending_checks() {
        let k = 4;
        let provider = MockProvider::new()
            .pending_times(k)
            .then(JobOutcome::Succeeded("https://cdn.example.com/out.mp4".into()));
        let poller = JobPoller::new(config(30));

        let start = Instant::now();
        let outcome = poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Succeeded("https://cdn.example.com/out.mp4".into())
        );
        assert_eq!(provider.get_status_count(), k + 1);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(40), "waited {waited:?}");
        assert!(waited < Duration::from_secs(41), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_max_attempts() {
        let provider = MockProvider::new();
        let poller = JobPoller::new(config(7));

        let outcome = poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, JobOutcome::TimedOut);
        assert_eq!(provider.get_status_count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_outcome_returns_immediately() {
        let provider = MockProvider::new()
            .then(JobOutcome::Pending(None))
            .then(JobOutcome::Failed("no face found".into()));
        let poller = JobPoller::new(config(30));

        let outcome = poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, JobOutcome::Failed("no face found".into()));
        assert_eq!(provider.get_status_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn three_consecutive_failures_stop_the_loop() {
        let provider = MockProvider::new()
            .then_error("502 from provider")
            .then_error("connection reset")
            .then_error("502 from provider")
            .then(JobOutcome::Succeeded("https://never.example.com".into()));
        let poller = JobPoller::new(config(30));

        let err = poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::StatusCheckFailed { failures: 3, .. }));
        assert_eq!(provider.get_status_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn a_good_check_resets_the_failure_budget() {
        let provider = MockProvider::new()
            .then_error("blip")
            .then_error("blip")
            .then(JobOutcome::Pending(Some(50)))
            .then_error("blip")
            .then_error("blip")
            .then(JobOutcome::Succeeded("https://cdn.example.com/out.mp4".into()));
        let poller = JobPoller::new(config(30));

        let outcome = poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Succeeded(_)));
        assert_eq!(provider.get_status_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_checks_count_toward_attempts() {
        let provider = MockProvider::new()
            .then_error("blip")
            .then(JobOutcome::Pending(None))
            .then_error("blip");
        let poller = JobPoller::new(config(3));

        let outcome = poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, JobOutcome::TimedOut);
        assert_eq!(provider.get_status_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_callback_sees_every_pending_hint() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let provider = MockProvider::new()
            .then(JobOutcome::Pending(Some(20)))
            .then(JobOutcome::Pending(None))
            .then(JobOutcome::Pending(Some(80)))
            .then(JobOutcome::Succeeded("https://cdn.example.com/out.mp4".into()));
        let poller = JobPoller::new(config(30))
            .on_progress(Arc::new(move |progress| sink.lock().unwrap().push(progress)));

        poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some(20), None, Some(80)]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_makes_no_calls() {
        let provider = MockProvider::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = JobPoller::new(config(30))
            .poll(&provider, &handle(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled));
        assert_eq!(provider.get_status_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_sleep() {
        let provider = MockProvider::new();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let err = JobPoller::new(config(30))
            .poll(&provider, &handle(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled));
        assert_eq!(provider.get_status_count(), 2);
        assert!(start.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_check_finishes_before_cancellation_applies() {
        let provider = MockProvider::new().with_status_delay(Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let err = JobPoller::new(config(30))
            .poll(&provider, &handle(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled));
        assert_eq!(provider.get_status_count(), 1);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_calls_are_bounded_by_call_timeout() {
        let provider = MockProvider::new().with_status_delay(Duration::from_secs(600));
        let poller = JobPoller::new(PollConfig {
            max_consecutive_failures: 2,
            ..config(30)
        });

        let start = Instant::now();
        let err = poller
            .poll(&provider, &handle(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::StatusCheckFailed { failures: 2, .. }));
        // two 30s call ceilings plus one 10s interval
        assert!(start.elapsed() < Duration::from_secs(71));
    }
}
