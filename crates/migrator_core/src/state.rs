use bytes::Bytes;

use crate::artifact::{Artifact, ArtifactHandle, ArtifactStore};
use crate::locator::derive_project_name;
use crate::view_model::{AppViewModel, ArtifactView};

pub type JobId = u64;

/// Shown for every transport or service failure; detail goes to the log only.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Migration failed. Check the repository URL and try again.";

/// Shown when a submission is attempted with no URL.
pub const VALIDATION_MESSAGE: &str = "Please enter a GitHub repository URL.";

/// Lifecycle of the single job this client manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Idle, JobState::Submitting)
                | (JobState::Submitting, JobState::Succeeded)
                | (JobState::Submitting, JobState::Failed)
                | (JobState::Succeeded, JobState::Submitting)
                | (JobState::Failed, JobState::Submitting)
        )
    }
}

/// The accepted submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub job_id: JobId,
    pub repository_url: String,
    pub project_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFailure {
    Transport,
    Service { status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { payload: Bytes },
    Failed { failure: JobFailure },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    job_state: JobState,
    input: String,
    request: Option<MigrationRequest>,
    artifact: Option<Artifact>,
    artifacts: ArtifactStore,
    error_message: Option<String>,
    validation_message: Option<String>,
    next_job_id: JobId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            job_state: self.job_state,
            input: self.input.clone(),
            project_name: self.request.as_ref().map(|r| r.project_name.clone()),
            artifact: self.artifact.as_ref().map(|artifact| ArtifactView {
                handle: artifact.handle,
                suggested_filename: artifact.suggested_filename.clone(),
                byte_len: artifact.byte_len,
            }),
            error_message: self.error_message.clone(),
            validation_message: self.validation_message.clone(),
            can_submit: self.job_state != JobState::Submitting,
            dirty: self.dirty,
        }
    }

    pub fn job_state(&self) -> JobState {
        self.job_state
    }

    pub fn request(&self) -> Option<&MigrationRequest> {
        self.request.as_ref()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Bytes behind `handle`, or `None` once the artifact has been retired.
    pub fn resolve_artifact(&self, handle: ArtifactHandle) -> Option<&Bytes> {
        self.artifacts.resolve(handle)
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.dirty = true;
        }
        if self.validation_message.take().is_some() {
            self.dirty = true;
        }
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn reject_empty_input(&mut self) {
        self.validation_message = Some(VALIDATION_MESSAGE.to_string());
        self.dirty = true;
    }

    /// Accept the current input as a new job and move to `Submitting`.
    ///
    /// Any artifact from an earlier job is retired here.
    pub(crate) fn begin_submission(&mut self) -> MigrationRequest {
        self.retire_current_artifact();
        self.error_message = None;
        self.validation_message = None;

        self.next_job_id += 1;
        let request = MigrationRequest {
            job_id: self.next_job_id,
            repository_url: self.input.clone(),
            project_name: derive_project_name(self.input.trim()),
        };
        self.request = Some(request.clone());
        self.transition(JobState::Submitting);
        request
    }

    /// Apply a completion for the in-flight job. Stale or unexpected completions
    /// are ignored and `None` is returned.
    pub(crate) fn complete(&mut self, job_id: JobId, outcome: JobOutcome) -> Option<&Artifact> {
        if self.job_state != JobState::Submitting {
            return None;
        }
        let project_name = match &self.request {
            Some(request) if request.job_id == job_id => request.project_name.clone(),
            _ => return None,
        };

        match outcome {
            JobOutcome::Succeeded { payload } => {
                self.retire_current_artifact();
                let artifact = self.artifacts.materialize(payload, &project_name);
                self.artifact = Some(artifact);
                self.transition(JobState::Succeeded);
                self.artifact.as_ref()
            }
            JobOutcome::Failed { .. } => {
                self.error_message = Some(GENERIC_FAILURE_MESSAGE.to_string());
                self.transition(JobState::Failed);
                None
            }
        }
    }

    fn retire_current_artifact(&mut self) {
        if let Some(previous) = self.artifact.take() {
            self.artifacts.retire(previous.handle);
            self.dirty = true;
        }
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.job_state.can_transition_to(next),
            "illegal job transition {:?} -> {:?}",
            self.job_state,
            next
        );
        self.job_state = next;
        self.dirty = true;
    }
}
