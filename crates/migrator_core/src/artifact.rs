use std::collections::BTreeMap;

use bytes::Bytes;

const ARCHIVE_SUFFIX: &str = "_migration.zip";

/// Process-local reference to an artifact payload held by an [`ArtifactStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactHandle(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub handle: ArtifactHandle,
    pub suggested_filename: String,
    pub byte_len: u64,
}

/// `<project_name>_migration.zip`
pub fn suggested_filename(project_name: &str) -> String {
    format!("{project_name}{ARCHIVE_SUFFIX}")
}

/// Owns artifact payloads and hands out revocable handles to them.
///
/// Handles are never reused. A retired handle resolves to `None`, and dropping
/// the store releases every payload it still holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactStore {
    live: BTreeMap<ArtifactHandle, Bytes>,
    next_handle: u64,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `payload` in a fresh handle. The bytes are not inspected.
    pub fn materialize(&mut self, payload: Bytes, project_name: &str) -> Artifact {
        self.next_handle += 1;
        let handle = ArtifactHandle(self.next_handle);
        let byte_len = payload.len() as u64;
        self.live.insert(handle, payload);
        Artifact {
            handle,
            suggested_filename: suggested_filename(project_name),
            byte_len,
        }
    }

    pub fn resolve(&self, handle: ArtifactHandle) -> Option<&Bytes> {
        self.live.get(&handle)
    }

    /// Release the payload behind `handle`. Returns `false` if it was already retired.
    pub fn retire(&mut self, handle: ArtifactHandle) -> bool {
        self.live.remove(&handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
