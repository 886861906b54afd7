use crate::{AppState, Effect, JobState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::SubmitClicked => {
            // At most one job in flight; extra submits are dropped, not queued.
            if state.job_state() == JobState::Submitting {
                return (state, Vec::new());
            }
            if state.input().trim().is_empty() {
                state.reject_empty_input();
                return (state, Vec::new());
            }
            let request = state.begin_submission();
            vec![Effect::SubmitJob {
                job_id: request.job_id,
                url: request.repository_url,
            }]
        }
        Msg::JobDone { job_id, outcome } => match state.complete(job_id, outcome) {
            Some(artifact) => vec![Effect::ArtifactReady(artifact.clone())],
            None => Vec::new(),
        },
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}
