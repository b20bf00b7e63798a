//! Fire-and-forget audit trail.
//!
//! [`AuditLogger`] hands entries to a bounded queue drained by a background
//! task. Recording never waits and never fails: a full or closed queue, or a
//! sink error, is logged and the entry dropped.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::AuditEntry;
use crate::storage::AuditSink;

/// Cloneable handle on the audit queue.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    sender: mpsc::Sender<AuditEntry>,
}

impl AuditLogger {
    /// Starts the worker on the current tokio runtime.
    ///
    /// The worker exits once every handle is dropped and the queue is drained.
    pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(drain(receiver, sink));
        (Self { sender }, worker)
    }

    /// Queues an entry without waiting.
    pub fn record(&self, entry: AuditEntry) {
        match self.sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => warn!(
                user_id = %entry.user_id,
                action = %entry.action,
                resource = %entry.resource,
                "Audit queue full, entry dropped"
            ),
            Err(TrySendError::Closed(entry)) => warn!(
                user_id = %entry.user_id,
                action = %entry.action,
                resource = %entry.resource,
                "Audit worker stopped, entry dropped"
            ),
        }
    }
}

async fn drain(mut receiver: mpsc::Receiver<AuditEntry>, sink: Arc<dyn AuditSink>) {
    while let Some(entry) = receiver.recv().await {
        let id = entry.id;
        if let Err(err) = sink.write(entry) {
            warn!(audit_id = %id, error = %err, "Failed to write audit entry");
        }
    }
    debug!("Audit worker stopped");
}
