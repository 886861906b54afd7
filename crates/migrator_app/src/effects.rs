use std::collections::VecDeque;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use migrator_core::{AppState, Artifact, Effect, JobFailure, JobId, JobOutcome, Msg};
use migrator_engine::{ArtifactWriter, EngineEvent, EngineHandle};
use migrator_logging::{job_error, job_info, job_warn};

/// Executes effects produced by `update` and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    writer: ArtifactWriter,
    last_saved: Option<PathBuf>,
    in_flight: Option<JobId>,
    pending: VecDeque<Msg>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, writer: ArtifactWriter) -> Self {
        Self {
            engine,
            writer,
            last_saved: None,
            in_flight: None,
            pending: VecDeque::new(),
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>, state: &AppState) {
        for effect in effects {
            match effect {
                Effect::SubmitJob { job_id, url } => {
                    job_info!("SubmitJob job_id={} url={}", job_id, url);
                    self.last_saved = None;
                    match self.engine.submit(job_id, url) {
                        Ok(()) => self.in_flight = Some(job_id),
                        Err(err) => {
                            job_error!("Job {} could not be queued: {}", job_id, err);
                            self.pending.push_back(transport_failure(job_id));
                        }
                    }
                }
                Effect::ArtifactReady(artifact) => self.save(&artifact, state),
            }
        }
    }

    /// Wait up to `timeout` for the next engine event.
    ///
    /// A stopped engine fails the in-flight job so the submit guard is released.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        if let Some(msg) = self.pending.pop_front() {
            return Some(msg);
        }
        match self.engine.recv_timeout(timeout) {
            Ok(Some(event)) => {
                let msg = map_event(event);
                if let Msg::JobDone { job_id, .. } = &msg {
                    if self.in_flight == Some(*job_id) {
                        self.in_flight = None;
                    }
                }
                Some(msg)
            }
            Ok(None) => None,
            Err(err) => match self.in_flight.take() {
                Some(job_id) => {
                    job_error!("Job {} lost: {}", job_id, err);
                    Some(transport_failure(job_id))
                }
                None => {
                    // Nothing to fail; keep the caller's poll interval.
                    thread::sleep(timeout);
                    None
                }
            },
        }
    }

    pub fn last_saved(&self) -> Option<&PathBuf> {
        self.last_saved.as_ref()
    }

    fn save(&mut self, artifact: &Artifact, state: &AppState) {
        let Some(payload) = state.resolve_artifact(artifact.handle) else {
            job_warn!("Artifact {:?} retired before it could be saved", artifact.handle);
            return;
        };
        match self.writer.write(&artifact.suggested_filename, payload) {
            Ok(path) => self.last_saved = Some(path),
            Err(err) => job_error!(
                "Failed to save {}: {}",
                artifact.suggested_filename,
                err
            ),
        }
    }
}

fn transport_failure(job_id: JobId) -> Msg {
    Msg::JobDone {
        job_id,
        outcome: JobOutcome::Failed {
            failure: JobFailure::Transport,
        },
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::JobCompleted { job_id, result } => {
            let outcome = match result {
                Ok(output) => {
                    if let Some(name) = output.metadata.server_filename.as_deref() {
                        job_info!("Job {} service named the archive {}", job_id, name);
                    }
                    JobOutcome::Succeeded {
                        payload: output.bytes,
                    }
                }
                Err(err) => JobOutcome::Failed {
                    failure: match err.kind.http_status() {
                        Some(status) => JobFailure::Service { status },
                        None => JobFailure::Transport,
                    },
                },
            };
            Msg::JobDone { job_id, outcome }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use migrator_engine::{FailureKind, SubmitError, SubmitMetadata, SubmitOutput};

    fn failed_with(kind: FailureKind) -> Msg {
        map_event(EngineEvent::JobCompleted {
            job_id: 3,
            result: Err(SubmitError {
                kind,
                message: String::new(),
            }),
        })
    }

    #[test]
    fn status_failures_map_to_service() {
        assert_eq!(
            failed_with(FailureKind::HttpStatus(502)),
            Msg::JobDone {
                job_id: 3,
                outcome: JobOutcome::Failed {
                    failure: JobFailure::Service { status: 502 }
                },
            }
        );
    }

    #[test]
    fn everything_else_maps_to_transport() {
        for kind in [
            FailureKind::Network,
            FailureKind::Timeout,
            FailureKind::InvalidEndpoint,
            FailureKind::Internal,
            FailureKind::TooLarge {
                max_bytes: 1,
                actual: None,
            },
        ] {
            assert_eq!(
                failed_with(kind),
                Msg::JobDone {
                    job_id: 3,
                    outcome: JobOutcome::Failed {
                        failure: JobFailure::Transport
                    },
                }
            );
        }
    }

    #[test]
    fn success_carries_payload() {
        let msg = map_event(EngineEvent::JobCompleted {
            job_id: 1,
            result: Ok(SubmitOutput {
                bytes: Bytes::from_static(b"PK"),
                metadata: SubmitMetadata {
                    endpoint: "http://localhost/process-github".into(),
                    status: 200,
                    content_type: Some("application/zip".into()),
                    server_filename: None,
                    byte_len: 2,
                },
            }),
        });
        assert_eq!(
            msg,
            Msg::JobDone {
                job_id: 1,
                outcome: JobOutcome::Succeeded {
                    payload: Bytes::from_static(b"PK")
                },
            }
        );
    }
}
