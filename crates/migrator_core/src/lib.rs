//! Migrator core: pure job state machine, locator parsing and artifact lifecycle.
mod artifact;
mod effect;
mod locator;
mod msg;
mod state;
mod update;
mod view_model;

pub use artifact::{suggested_filename, Artifact, ArtifactHandle, ArtifactStore};
pub use effect::Effect;
pub use locator::{derive_project_name, FALLBACK_PROJECT_NAME};
pub use msg::Msg;
pub use state::{
    AppState, JobFailure, JobId, JobOutcome, JobState, MigrationRequest,
    GENERIC_FAILURE_MESSAGE, VALIDATION_MESSAGE,
};
pub use update::update;
pub use view_model::{AppViewModel, ArtifactView};
