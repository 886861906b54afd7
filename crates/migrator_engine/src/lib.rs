//! Migrator engine: remote submission and artifact persistence.
mod client;
mod engine;
mod filename;
mod persist;
mod types;

pub use client::{MigrationClient, ReqwestMigrationClient, SubmitSettings, DEFAULT_ENDPOINT};
pub use engine::EngineHandle;
pub use filename::safe_filename;
pub use persist::{ensure_output_dir, ArtifactWriter, ExistingFilePolicy, PersistError};
pub use types::{
    EngineError, EngineEvent, FailureKind, JobId, SubmitError, SubmitMetadata, SubmitOutput,
};
