use super::{GenerationProvider, ProviderError};
use crate::models::job::{GenerationRequest, JobHandle, JobOutcome};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Scripted {
    Outcome(JobOutcome),
    Error(String),
}

/// Provider whose status checks follow a script, for tests.
///
/// Once the script runs out every further check returns the fallback
/// outcome (Pending by default).
#[derive(Clone)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: JobOutcome,
    submit_error: Option<String>,
    status_delay: Option<Duration>,
    configured: bool,
    submitted: Arc<Mutex<Vec<GenerationRequest>>>,
    status_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: JobOutcome::Pending(None),
            submit_error: None,
            status_delay: None,
            configured: true,
            submitted: Arc::new(Mutex::new(Vec::new())),
            status_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue the outcome of the next status check.
    pub fn then(self, outcome: JobOutcome) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Outcome(outcome));
        self
    }

    /// Queue a failing status check.
    pub fn then_error(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Error(message.to_string()));
        self
    }

    /// Queue `count` pending checks with rising progress.
    pub fn pending_times(mut self, count: usize) -> Self {
        for i in 0..count {
            let progress = ((i + 1) * 100 / (count + 1)) as u8;
            self = self.then(JobOutcome::Pending(Some(progress)));
        }
        self
    }

    pub fn with_fallback(mut self, outcome: JobOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn rejecting_submissions(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    /// Make every status check take this long before answering.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn get_submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn get_submitted_requests(&self) -> Vec<GenerationRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn get_status_count(&self) -> usize {
        *self.status_count.lock().unwrap()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ProviderError> {
        if !self.configured {
            return Err(ProviderError::Unconfigured("mock provider"));
        }
        let job_number = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(request.clone());
            submitted.len()
        };
        if let Some(message) = &self.submit_error {
            return Err(ProviderError::SubmissionRejected(message.clone()));
        }

        Ok(JobHandle::new(self.id(), format!("mock-job-{}", job_number)))
    }

    async fn query_status(&self, _handle: &JobHandle) -> Result<JobOutcome, ProviderError> {
        *self.status_count.lock().unwrap() += 1;

        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Outcome(outcome)) => Ok(outcome),
            Some(Scripted::Error(message)) => Err(ProviderError::StatusCheckFailed(message)),
            None => Ok(self.fallback.clone()),
        }
    }
}
