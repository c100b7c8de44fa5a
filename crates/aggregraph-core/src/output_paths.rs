//! Claimed output paths.
//!
//! Renderers may run concurrently against one resolved graph. Each output file
//! is claimed here before it is written; a second claim on the same path is a
//! renderer bug and fails immediately instead of overwriting.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputPathError {
    #[error("output path `{}` claimed by both `{first}` and `{second}`", .path.display())]
    AlreadyClaimed {
        path: PathBuf,
        first: String,
        second: String,
    },
}

#[derive(Debug, Default)]
pub struct OutputPathRegistry {
    claimed: Mutex<HashMap<PathBuf, String>>,
}

/// Lexical normalization only: `a/./b` and `a/b` are the same claim.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl OutputPathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self, path: impl AsRef<Path>, claimant: &str) -> Result<(), OutputPathError> {
        let path = normalize(path.as_ref());
        let mut claimed = self.claimed.lock();
        if let Some(first) = claimed.get(&path) {
            return Err(OutputPathError::AlreadyClaimed {
                path,
                first: first.clone(),
                second: claimant.to_string(),
            });
        }
        tracing::debug!(path = %path.display(), claimant, "output path claimed");
        claimed.insert(path, claimant.to_string());
        Ok(())
    }

    pub fn is_claimed(&self, path: impl AsRef<Path>) -> bool {
        self.claimed.lock().contains_key(&normalize(path.as_ref()))
    }

    pub fn claimant(&self, path: impl AsRef<Path>) -> Option<String> {
        self.claimed.lock().get(&normalize(path.as_ref())).cloned()
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.lock().is_empty()
    }

    /// Claimed paths, sorted.
    pub fn claimed_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.claimed.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}
