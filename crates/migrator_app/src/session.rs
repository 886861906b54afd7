use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use migrator_core::{update, AppState, Effect, JobState, Msg};
use migrator_logging::{job_debug, job_info};

use crate::effects::EffectRunner;
use crate::render::render;

const POLL_INTERVAL: Duration = Duration::from_millis(75);

/// Exit code when the archive was saved.
pub const EXIT_SAVED: u8 = 0;
/// Exit code when the job failed or the archive could not be saved.
pub const EXIT_FAILED: u8 = 1;
/// Exit code when the input was rejected before anything was sent.
pub const EXIT_INVALID_INPUT: u8 = 2;

/// Owns the job state and drives it with user input and engine events.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
}

impl Session {
    pub fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    pub fn last_saved(&self) -> Option<&PathBuf> {
        self.runner.last_saved()
    }

    /// Submit `url`, wait for the result and report it as a process exit code.
    pub fn run_once(&mut self, url: &str) -> u8 {
        if !self.submit(url) {
            return EXIT_INVALID_INPUT;
        }
        self.wait_for_completion();

        match self.state.job_state() {
            JobState::Succeeded if self.last_saved().is_some() => EXIT_SAVED,
            _ => EXIT_FAILED,
        }
    }

    /// Submit `url` as if typed and confirmed. Returns whether a job was started.
    pub fn submit(&mut self, url: &str) -> bool {
        self.dispatch(Msg::InputChanged(url.to_string()));
        let started = self.dispatch(Msg::SubmitClicked);
        self.render_if_dirty();
        started
    }

    /// Block until the in-flight job resolves. No timeout: the service decides.
    pub fn wait_for_completion(&mut self) {
        while self.state.job_state() == JobState::Submitting {
            let msg = self.runner.next_msg(POLL_INTERVAL).unwrap_or(Msg::Tick);
            self.dispatch(msg);
            self.render_if_dirty();
        }
    }

    /// Read one URL per stdin line until EOF, then let any running job finish.
    pub fn run_interactive(&mut self) {
        let lines = spawn_stdin_reader();
        let mut input_closed = false;

        loop {
            match lines.try_recv() {
                Ok(line) => {
                    self.submit_line(&line);
                }
                Err(TryRecvError::Disconnected) => input_closed = true,
                Err(TryRecvError::Empty) => {}
            }

            if input_closed && self.state.job_state() != JobState::Submitting {
                break;
            }

            let msg = self.runner.next_msg(POLL_INTERVAL).unwrap_or(Msg::Tick);
            self.dispatch(msg);
            self.render_if_dirty();
        }
    }

    fn submit_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if self.state.job_state() == JobState::Submitting {
            println!("A migration is already running; ignoring {line:?}");
            return false;
        }
        self.submit(line)
    }

    /// Apply `msg` and execute its effects. Returns whether a job was submitted.
    fn dispatch(&mut self, msg: Msg) -> bool {
        job_debug!("dispatch {:?}", msg_label(&msg));
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        let submitted = effects
            .iter()
            .any(|effect| matches!(effect, Effect::SubmitJob { .. }));
        self.runner.run(effects, &self.state);
        submitted
    }

    fn render_if_dirty(&mut self) {
        if !self.state.consume_dirty() {
            return;
        }
        for line in render(&self.state.view()) {
            println!("{line}");
        }
        if self.state.job_state() == JobState::Succeeded {
            if let Some(path) = self.runner.last_saved() {
                println!("Saved to {}", path.display());
            }
        }
    }
}

fn msg_label(msg: &Msg) -> &'static str {
    match msg {
        Msg::InputChanged(_) => "InputChanged",
        Msg::SubmitClicked => "SubmitClicked",
        Msg::JobDone { .. } => "JobDone",
        Msg::Tick => "Tick",
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
        job_info!("stdin closed");
    });
    rx
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, Once};

    use bytes::Bytes;
    use migrator_core::GENERIC_FAILURE_MESSAGE;
    use migrator_engine::{
        ArtifactWriter, EngineHandle, FailureKind, MigrationClient, SubmitError, SubmitMetadata,
        SubmitOutput,
    };
    use tempfile::TempDir;

    use super::*;

    const ARCHIVE: &[u8] = &[0x50, 0x4B, 0x03, 0x04, 0x2A];
    const WIDGET: &str = "https://github.com/acme/widget";

    fn init_logging() {
        static INIT: Once = Once::new();
        INIT.call_once(migrator_logging::initialize_for_tests);
    }

    #[derive(Clone, Copy)]
    enum Reply {
        Archive,
        Status(u16),
        Panic,
    }

    struct FakeService {
        reply: Reply,
        calls: AtomicUsize,
        gate: Option<Mutex<mpsc::Receiver<()>>>,
    }

    impl FakeService {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                gate: None,
            })
        }

        /// Each call blocks until the returned sender releases it.
        fn gated(reply: Reply) -> (Arc<Self>, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let service = Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                gate: Some(Mutex::new(rx)),
            });
            (service, tx)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MigrationClient for FakeService {
        async fn submit(
            &self,
            _job_id: u64,
            repository_url: &str,
        ) -> Result<SubmitOutput, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap().recv();
            }
            match self.reply {
                Reply::Archive => Ok(SubmitOutput {
                    bytes: Bytes::from_static(ARCHIVE),
                    metadata: SubmitMetadata {
                        endpoint: "http://fake/process-github".into(),
                        status: 200,
                        content_type: Some("application/zip".into()),
                        server_filename: None,
                        byte_len: ARCHIVE.len() as u64,
                    },
                }),
                Reply::Status(status) => Err(SubmitError {
                    kind: FailureKind::HttpStatus(status),
                    message: format!("service rejected {repository_url}"),
                }),
                Reply::Panic => panic!("client crashed on {repository_url}"),
            }
        }
    }

    fn session_with(service: &Arc<FakeService>, dir: &Path) -> Session {
        let engine = EngineHandle::with_client(service.clone()).unwrap();
        Session::new(EffectRunner::new(engine, ArtifactWriter::new(dir.to_path_buf())))
    }

    fn files_in(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn saved_archive_exits_zero_with_exact_bytes() {
        init_logging();
        let temp = TempDir::new().unwrap();
        let service = FakeService::new(Reply::Archive);
        let mut session = session_with(&service, temp.path());

        assert_eq!(session.run_once(WIDGET), EXIT_SAVED);

        let expected = temp.path().join("widget_migration.zip");
        assert_eq!(session.last_saved(), Some(&expected));
        assert_eq!(fs::read(&expected).unwrap(), ARCHIVE);
        assert_eq!(session.state.job_state(), JobState::Succeeded);
        assert_eq!(service.calls(), 1);
    }

    #[test]
    fn service_failure_exits_one_and_saves_nothing() {
        init_logging();
        let temp = TempDir::new().unwrap();
        let service = FakeService::new(Reply::Status(502));
        let mut session = session_with(&service, temp.path());

        assert_eq!(session.run_once(WIDGET), EXIT_FAILED);

        assert_eq!(session.state.job_state(), JobState::Failed);
        assert_eq!(
            session.state.view().error_message.as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
        assert_eq!(session.last_saved(), None);
        assert_eq!(files_in(temp.path()), 0);
        assert_eq!(service.calls(), 1);
    }

    #[test]
    fn empty_url_exits_two_without_calling_the_service() {
        init_logging();
        let temp = TempDir::new().unwrap();
        let service = FakeService::new(Reply::Archive);
        let mut session = session_with(&service, temp.path());

        assert!(!session.submit(""));
        assert_eq!(session.run_once("   "), EXIT_INVALID_INPUT);

        assert_eq!(session.state.job_state(), JobState::Idle);
        assert_eq!(files_in(temp.path()), 0);
        assert_eq!(service.calls(), 0);
    }

    #[test]
    fn panicking_client_exits_one_and_session_recovers() {
        init_logging();
        let temp = TempDir::new().unwrap();
        let service = FakeService::new(Reply::Panic);
        let mut session = session_with(&service, temp.path());

        assert_eq!(session.run_once(WIDGET), EXIT_FAILED);
        assert_eq!(session.state.job_state(), JobState::Failed);

        // The guard was released, so a retry reaches the client again.
        assert_eq!(session.run_once(WIDGET), EXIT_FAILED);
        assert_eq!(service.calls(), 2);
    }

    #[test]
    fn unwritable_output_dir_exits_one() {
        init_logging();
        let temp = TempDir::new().unwrap();
        let not_a_dir = temp.path().join("downloads");
        fs::write(&not_a_dir, b"x").unwrap();
        let service = FakeService::new(Reply::Archive);
        let mut session = session_with(&service, &not_a_dir);

        assert_eq!(session.run_once(WIDGET), EXIT_FAILED);

        assert_eq!(session.state.job_state(), JobState::Succeeded);
        assert_eq!(session.last_saved(), None);
    }

    #[test]
    fn line_arriving_while_busy_is_ignored() {
        init_logging();
        let temp = TempDir::new().unwrap();
        let (service, release) = FakeService::gated(Reply::Archive);
        let mut session = session_with(&service, temp.path());

        assert!(session.submit_line(&format!("  {WIDGET}  ")));
        assert_eq!(session.state.job_state(), JobState::Submitting);
        assert!(!session.submit_line("https://github.com/acme/gadget"));
        assert_eq!(
            session.state.request().map(|r| r.project_name.as_str()),
            Some("widget")
        );

        release.send(()).unwrap();
        session.wait_for_completion();

        assert_eq!(session.state.job_state(), JobState::Succeeded);
        assert_eq!(service.calls(), 1);
        assert_eq!(files_in(temp.path()), 1);
        assert_eq!(
            fs::read(temp.path().join("widget_migration.zip")).unwrap(),
            ARCHIVE
        );
    }
}
