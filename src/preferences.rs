//! The "remember me" preference, the only state kept across restarts.

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RememberMe {
    pub remember_me: bool,
    #[serde(default)]
    pub email: Option<String>,
}

pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing or unreadable file means nothing was remembered.
    pub async fn load(&self) -> RememberMe {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %self.path.display(), error = %err, "ignoring corrupt preferences");
                RememberMe::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => RememberMe::default(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read preferences");
                RememberMe::default()
            }
        }
    }

    pub async fn save(&self, prefs: &RememberMe) -> AppResult<()> {
        let stored = if prefs.remember_me {
            prefs.clone()
        } else {
            RememberMe::default()
        };

        let bytes = serde_json::to_vec_pretty(&stored)
            .map_err(|err| AppError::Internal(format!("failed to encode preferences: {err}")))?;
        tokio::fs::write(&self.path, bytes).await.map_err(|err| {
            AppError::Internal(format!(
                "failed to write preferences to {}: {err}",
                self.path.display()
            ))
        })
    }
}
