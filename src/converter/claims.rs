use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Run-wide registry of output paths handed out so far
///
/// File names are compared ASCII case-insensitively so a run behaves the
/// same on case-insensitive file systems.
#[derive(Debug, Default)]
pub struct OutputClaims {
    claimed: Mutex<HashSet<(PathBuf, String)>>,
}

impl OutputClaims {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`; `false` when it was already claimed
    pub fn claim(&self, path: &Path) -> bool {
        let key = claim_key(path);
        // A panic while holding the lock cannot leave the set half-updated
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        claimed.insert(key)
    }

    /// Number of claimed paths
    pub fn len(&self) -> usize {
        self.claimed.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing has been claimed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn claim_key(path: &Path) -> (PathBuf, String) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    (dir, name)
}
