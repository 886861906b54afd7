use std::panic::AssertUnwindSafe;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use futures_util::FutureExt;
use migrator_logging::{job_error, job_info, job_warn};

use crate::client::{MigrationClient, ReqwestMigrationClient, SubmitSettings};
use crate::{EngineError, EngineEvent, FailureKind, JobId, SubmitError};

enum EngineCommand {
    Submit { job_id: JobId, url: String },
}

/// Runs submissions on a dedicated thread with a single-threaded runtime and
/// reports completions over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: SubmitSettings) -> Result<Self, EngineError> {
        Self::with_client(Arc::new(ReqwestMigrationClient::new(settings)))
    }

    pub fn with_client(client: Arc<dyn MigrationClient>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("migrator-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    runtime.block_on(handle_command(client.as_ref(), command, &event_tx));
                }
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    /// Queue a job. Fails only if the engine thread is gone.
    pub fn submit(&self, job_id: JobId, url: impl Into<String>) -> Result<(), EngineError> {
        self.cmd_tx
            .send(EngineCommand::Submit {
                job_id,
                url: url.into(),
            })
            .map_err(|_| EngineError::Stopped)
    }

    /// Wait up to `timeout` for an event. `Ok(None)` means nothing arrived in time;
    /// `Err(Stopped)` means no event will ever arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineError::Stopped),
        }
    }
}

async fn handle_command(
    client: &dyn MigrationClient,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit { job_id, url } => {
            let result = AssertUnwindSafe(client.submit(job_id, &url))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    job_error!("Job {} panicked in the migration client", job_id);
                    Err(SubmitError::new(FailureKind::Internal, "client panicked"))
                });
            match &result {
                Ok(output) => job_info!(
                    "Job {} completed: status {} ({} bytes)",
                    job_id,
                    output.metadata.status,
                    output.metadata.byte_len
                ),
                Err(err) => job_warn!("Job {} failed: {}", job_id, err),
            }
            let _ = event_tx.send(EngineEvent::JobCompleted { job_id, result });
        }
    }
}
