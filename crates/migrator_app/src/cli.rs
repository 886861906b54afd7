use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use migrator_engine::{
    ArtifactWriter, EngineHandle, ExistingFilePolicy, SubmitSettings, DEFAULT_ENDPOINT,
};

use crate::effects::EffectRunner;
use crate::logging::{LogDestination, DEFAULT_LOG_FILE};
use crate::session::Session;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "repo-migrator",
    version,
    about = "Submit a repository to the migration service and save the converted archive"
)]
pub struct Cli {
    /// Repository URL, e.g. https://github.com/acme/widget
    pub url: Option<String>,

    /// Migration service endpoint
    #[arg(long, env = "REPO_MIGRATOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Directory the archive is saved into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Keep an existing archive and save the new one as "name (1).zip"
    #[arg(long)]
    pub keep_existing: bool,

    /// Connection timeout
    #[arg(long, default_value = "10s")]
    pub connect_timeout: humantime::Duration,

    /// Whole-request timeout (none by default; conversions are slow)
    #[arg(long)]
    pub request_timeout: Option<humantime::Duration>,

    /// Reject archives larger than this many bytes
    #[arg(long)]
    pub max_bytes: Option<u64>,

    /// Also write logs to this file
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_LOG_FILE)]
    pub log_file: Option<PathBuf>,

    /// Log only to the file given by --log-file
    #[arg(long, requires = "log_file")]
    pub log_file_only: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Read one repository URL per line from stdin
    #[arg(short, long)]
    pub interactive: bool,
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) if self.log_file_only => LogDestination::File(path.clone()),
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}

pub fn build_settings(args: &Cli) -> SubmitSettings {
    SubmitSettings {
        endpoint: args.endpoint.clone(),
        connect_timeout: Duration::from(args.connect_timeout),
        request_timeout: args.request_timeout.map(Duration::from),
        max_bytes: args.max_bytes,
        ..SubmitSettings::default()
    }
}

fn build_writer(args: &Cli) -> ArtifactWriter {
    let policy = if args.keep_existing {
        ExistingFilePolicy::KeepBoth
    } else {
        ExistingFilePolicy::Replace
    };
    ArtifactWriter::new(args.output_dir.clone()).with_policy(policy)
}

pub fn run(args: Cli) -> Result<ExitCode> {
    let engine = EngineHandle::new(build_settings(&args)).context("starting engine")?;
    let mut session = Session::new(EffectRunner::new(engine, build_writer(&args)));

    if args.interactive {
        if let Some(url) = args.url.as_deref() {
            session.submit(url);
        }
        session.run_interactive();
        return Ok(ExitCode::SUCCESS);
    }

    let code = session.run_once(args.url.as_deref().unwrap_or_default());
    Ok(ExitCode::from(code))
}
