//! In-process agents mirroring the three execution contexts of the
//! extraction pipeline.
//!
//! The *page agent* owns a snapshot of one page and does detection and
//! collection. The *privileged agent* owns the detection cache and the
//! save-file capability. The UI (CLI frontend) drives both over explicit
//! request/response envelopes and listens on broadcast channels for
//! streamed progress and terminal outcomes.

mod messages;
mod page;
mod privileged;
mod runtime;

pub use messages::{Message, Reply, TabId};
pub use page::PageAgent;
pub use privileged::PrivilegedAgent;
pub use runtime::{mailbox, respond, AgentHandle, Envelope, DEFAULT_REQUEST_TIMEOUT_MS};

use crate::http::HttpClient;
use crate::progress::{self, ProgressReceiver, ProgressSender};
use crate::snapshot::PageSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Terminal outcome of a run, streamed to whoever is watching. Dropped
/// silently when nobody subscribes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The archive was generated and saved.
    Complete {
        file_name: String,
        saved_to: PathBuf,
    },
    /// The run ended with a terminal error; the UI may retry.
    Failure { message: String },
}

pub type EventSender = broadcast::Sender<SessionEvent>;
pub type EventReceiver = broadcast::Receiver<SessionEvent>;

/// Both agents wired together for one page, plus the channels the UI
/// consumes.
pub struct Session {
    pub page: AgentHandle,
    pub privileged: AgentHandle,
    progress: ProgressSender,
    events: EventSender,
}

impl Session {
    /// Spawn a privileged agent and a page agent for `snapshot`, saving
    /// archives into `out_dir`.
    pub fn spawn(
        snapshot: PageSnapshot,
        client: HttpClient,
        out_dir: &Path,
        fetch_timeout_ms: u64,
        tab: TabId,
    ) -> Self {
        let (progress_tx, _) = progress::channel();
        let (events_tx, _) = broadcast::channel(16);

        let privileged = PrivilegedAgent::spawn(out_dir.to_path_buf(), events_tx.clone());
        let page = PageAgent::spawn(
            snapshot,
            client,
            privileged.clone(),
            progress_tx.clone(),
            events_tx.clone(),
            fetch_timeout_ms,
            tab,
        );

        Self {
            page,
            privileged,
            progress: progress_tx,
            events: events_tx,
        }
    }

    /// Subscribe to progress updates for this session.
    pub fn subscribe_progress(&self) -> ProgressReceiver {
        self.progress.subscribe()
    }

    /// Subscribe to terminal completion/failure events.
    pub fn subscribe_events(&self) -> EventReceiver {
        self.events.subscribe()
    }
}
