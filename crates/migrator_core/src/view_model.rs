use crate::{ArtifactHandle, JobState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub job_state: JobState,
    pub input: String,
    pub project_name: Option<String>,
    pub artifact: Option<ArtifactView>,
    pub error_message: Option<String>,
    pub validation_message: Option<String>,
    pub can_submit: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactView {
    pub handle: ArtifactHandle,
    pub suggested_filename: String,
    pub byte_len: u64,
}
