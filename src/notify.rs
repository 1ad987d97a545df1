//! Transient user-facing notices, fanned out to every connected screen.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Error, message.into());
    }

    /// Surfaces a failed action. Local validation failures are shown inline
    /// by the form and are not broadcast.
    pub fn failure(&self, action: &str, err: &AppError) {
        if matches!(err, AppError::Validation(_)) {
            return;
        }
        self.error(format!("{action} failed: {err}"));
    }

    fn publish(&self, level: NoticeLevel, message: String) {
        // Nobody listening is fine; notices are fire and forget.
        let _ = self.tx.send(Notice {
            id: Uuid::new_v4(),
            level,
            message,
            at: Utc::now(),
        });
    }
}
