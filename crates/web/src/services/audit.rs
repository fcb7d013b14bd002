//! Audit trail writer.
//!
//! Handlers call [`AuditSink::emit`] and move on. A background task drains
//! the channel into the [`AuditLogRepository`]; failures there are logged and
//! never reach the request that caused the entry.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::db::AuditLogRepository;
use crate::models::AuditEntry;

/// Entries buffered before `emit` starts dropping.
const CHANNEL_CAPACITY: usize = 1024;

/// Fire-and-forget handle to the audit writer task.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<AuditEntry>,
}

impl AuditSink {
    /// Spawn the writer task on the current runtime.
    #[must_use]
    pub fn spawn(repository: Arc<dyn AuditLogRepository>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(e) = repository.append(&entry).await {
                    warn!(action = entry.action.as_str(), error = %e, "Failed to write audit entry");
                }
            }
            debug!("Audit writer stopped");
        });

        Self { tx }
    }

    /// Queue an entry. Never blocks and never fails the caller.
    pub fn emit(&self, entry: AuditEntry) {
        if let Err(mpsc::error::TrySendError::Full(entry)) = self.tx.try_send(entry) {
            warn!(action = entry.action.as_str(), "Audit channel full, dropping entry");
        }
    }
}
