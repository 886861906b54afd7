#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the repository URL input.
    InputChanged(String),
    /// User asked to submit the current input.
    SubmitClicked,
    /// Engine completion for a submitted job.
    JobDone {
        job_id: crate::JobId,
        outcome: crate::JobOutcome,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
}
