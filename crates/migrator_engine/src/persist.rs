use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use migrator_logging::job_info;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::safe_filename;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("no free filename for {0} in output directory")]
    NameExhausted(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingFilePolicy {
    #[default]
    Replace,
    /// Write `name (1).zip`, `name (2).zip`, ... instead.
    KeepBoth,
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Saves artifact payloads into a directory under a sanitized filename.
///
/// Writes go to a temp file in the same directory which is synced and renamed
/// into place, so a reader never sees a partial archive.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    policy: ExistingFilePolicy,
}

impl ArtifactWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            policy: ExistingFilePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExistingFilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn write(
        &self,
        suggested_filename: &str,
        payload: &[u8],
    ) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let filename = safe_filename(suggested_filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(payload)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        let target = match self.policy {
            ExistingFilePolicy::Replace => {
                let target = self.dir.join(&filename);
                tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
                target
            }
            ExistingFilePolicy::KeepBoth => self.persist_beside(tmp, &filename)?,
        };
        job_info!("Saved {} bytes to {:?}", payload.len(), target);
        Ok(target)
    }

    /// Persist under `filename`, or the first free `stem (N).ext`, never replacing anything.
    fn persist_beside(
        &self,
        mut tmp: NamedTempFile,
        filename: &str,
    ) -> Result<PathBuf, PersistError> {
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{ext}")),
            None => (filename, String::new()),
        };
        let candidates = std::iter::once(filename.to_string())
            .chain((1..1000).map(|n| format!("{stem} ({n}){ext}")));

        for name in candidates {
            let candidate = self.dir.join(name);
            match tmp.persist_noclobber(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => tmp = e.file,
                Err(e) => return Err(PersistError::Io(e.error)),
            }
        }
        Err(PersistError::NameExhausted(filename.to_string()))
    }
}
