//! Envelope plumbing for explicit request/response between agents.
//!
//! Every request carries a fresh correlation id and a oneshot reply slot,
//! and waits under an explicit timeout — there are no ambient channels and
//! no fire-and-forget requests. A peer that is gone or slow surfaces as a
//! typed error, not a hang.

use crate::agent::messages::{Message, Reply};
use crate::error::SnapError;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Default time a requester waits for a peer's reply. Agents acknowledge
/// before doing long work, so replies are fast even when runs are not.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// One message in flight to an agent, tagged with its correlation id.
#[derive(Debug)]
pub struct Envelope {
    pub id: Uuid,
    pub message: Message,
    /// Present for requests; the agent must send exactly one reply.
    pub reply: Option<oneshot::Sender<Reply>>,
}

/// Cloneable sending side of an agent's mailbox.
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<Envelope>,
    timeout_ms: u64,
}

/// Create an agent mailbox: the handle peers use to reach it, plus the
/// receiving end the agent task drains.
pub fn mailbox(timeout_ms: u64) -> (AgentHandle, mpsc::Receiver<Envelope>) {
    let (tx, rx) = mpsc::channel(32);
    (AgentHandle { tx, timeout_ms }, rx)
}

impl AgentHandle {
    /// Send a request and await its reply under the handle's timeout.
    pub async fn request(&self, message: Message) -> Result<Reply, SnapError> {
        let id = Uuid::new_v4();
        let (reply_tx, reply_rx) = oneshot::channel();
        tracing::debug!(%id, ?message, "agent request");

        self.tx
            .send(Envelope {
                id,
                message,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| SnapError::AgentUnavailable)?;

        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), reply_rx).await {
            Err(_) => Err(SnapError::RequestTimeout {
                timeout_ms: self.timeout_ms,
            }),
            // Agent dropped the reply slot without answering.
            Ok(Err(_)) => Err(SnapError::AgentUnavailable),
            Ok(Ok(reply)) => {
                tracing::debug!(%id, ?reply, "agent reply");
                Ok(reply)
            }
        }
    }

    /// Send a notification that expects no reply.
    pub async fn notify(&self, message: Message) -> Result<(), SnapError> {
        self.tx
            .send(Envelope {
                id: Uuid::new_v4(),
                message,
                reply: None,
            })
            .await
            .map_err(|_| SnapError::AgentUnavailable)
    }
}

/// Answer an envelope's reply slot, if it has one. Dropped receivers are
/// ignored — the requester may have timed out already.
pub fn respond(reply_slot: Option<oneshot::Sender<Reply>>, reply: Reply) {
    if let Some(slot) = reply_slot {
        let _ = slot.send(reply);
    }
}
