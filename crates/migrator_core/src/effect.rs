#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the migration request to the remote service.
    SubmitJob { job_id: crate::JobId, url: String },
    /// A new artifact is available for download.
    ArtifactReady(crate::Artifact),
}
