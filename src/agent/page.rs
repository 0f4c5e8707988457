//! The page agent: detection and collection over one page snapshot.
//!
//! One agent is spawned per page load. An `extracting` flag guards against
//! overlapping runs — a second begin-extraction request while one is in
//! flight is rejected, and the agent keeps answering pings and detection
//! requests while a run proceeds in the background.

use crate::agent::messages::{Message, Reply, TabId};
use crate::agent::runtime::{self, AgentHandle, Envelope, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::agent::{EventSender, SessionEvent};
use crate::collect;
use crate::detect;
use crate::error::SnapError;
use crate::http::HttpClient;
use crate::progress::{ProgressSender, ProgressTracker};
use crate::snapshot::PageSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct PageAgent {
    snapshot: PageSnapshot,
    client: HttpClient,
    privileged: AgentHandle,
    progress: ProgressSender,
    events: EventSender,
    fetch_timeout_ms: u64,
    tab: TabId,
    extracting: Arc<AtomicBool>,
}

impl PageAgent {
    /// Spawn the agent task and return the handle peers use to reach it.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        snapshot: PageSnapshot,
        client: HttpClient,
        privileged: AgentHandle,
        progress: ProgressSender,
        events: EventSender,
        fetch_timeout_ms: u64,
        tab: TabId,
    ) -> AgentHandle {
        let (handle, rx) = runtime::mailbox(DEFAULT_REQUEST_TIMEOUT_MS);
        let agent = Self {
            snapshot,
            client,
            privileged,
            progress,
            events,
            fetch_timeout_ms,
            tab,
            extracting: Arc::new(AtomicBool::new(false)),
        };
        tokio::spawn(agent.run(rx));
        handle
    }

    async fn run(self, mut rx: mpsc::Receiver<Envelope>) {
        while let Some(env) = rx.recv().await {
            self.handle(env).await;
        }
        debug!(tab = self.tab, "page agent mailbox closed");
    }

    async fn handle(&self, env: Envelope) {
        match env.message {
            Message::Ping => runtime::respond(env.reply, Reply::Pong),

            Message::DetectFramework { .. } => {
                let result = detect::detect(&self.snapshot);
                // Best-effort cache write; a missing cache never fails
                // the detection request itself.
                if let Err(e) = self
                    .privileged
                    .request(Message::DetectionReport {
                        tab: self.tab,
                        result: result.clone(),
                    })
                    .await
                {
                    warn!(error = %e, "could not cache detection result");
                }
                runtime::respond(env.reply, Reply::Detection { result });
            }

            Message::BeginExtraction {
                include_companion_files,
            } => {
                if self.extracting.swap(true, Ordering::SeqCst) {
                    runtime::respond(
                        env.reply,
                        Reply::Rejected {
                            reason: "an extraction is already running for this page".to_string(),
                        },
                    );
                    return;
                }

                // Acknowledge first, then work: the requester must not wait
                // out the whole run.
                runtime::respond(env.reply, Reply::Ack);

                let worker = Extraction {
                    snapshot: self.snapshot.clone(),
                    client: self.client.clone(),
                    privileged: self.privileged.clone(),
                    progress: self.progress.clone(),
                    events: self.events.clone(),
                    fetch_timeout_ms: self.fetch_timeout_ms,
                    extracting: self.extracting.clone(),
                };
                tokio::spawn(worker.run(include_companion_files));
            }

            other => runtime::respond(
                env.reply,
                Reply::Rejected {
                    reason: format!("page agent cannot handle {other:?}"),
                },
            ),
        }
    }
}

/// State cloned out for one extraction run.
struct Extraction {
    snapshot: PageSnapshot,
    client: HttpClient,
    privileged: AgentHandle,
    progress: ProgressSender,
    events: EventSender,
    fetch_timeout_ms: u64,
    extracting: Arc<AtomicBool>,
}

impl Extraction {
    async fn run(self, include_companions: bool) {
        let outcome = self.extract(include_companions).await;
        if let Err(e) = outcome {
            warn!(error = %e, "extraction failed");
            let _ = self.events.send(SessionEvent::Failure {
                message: e.to_string(),
            });
        }
        self.extracting.store(false, Ordering::SeqCst);
    }

    async fn extract(&self, include_companions: bool) -> Result<(), SnapError> {
        let mut tracker = ProgressTracker::new(Some(self.progress.clone()));
        tracker.emit(5, "Finding bundle files...");

        let paths = collect::collect_asset_paths(&self.snapshot.html);
        if paths.is_empty() {
            return Err(SnapError::NoAssetsFound);
        }
        debug!(count = paths.len(), "collected bundle paths");
        tracker.emit(
            20,
            format!("Found {} files, preparing to download...", paths.len()),
        );

        let refs = collect::prepare_file_urls(&paths, &self.snapshot.origin, include_companions);
        let files =
            collect::download_all(&self.client, &refs, self.fetch_timeout_ms, &mut tracker).await?;

        tracker.emit(80, "Creating ZIP archive...");
        let reply = self
            .privileged
            .request(Message::BuildArchive {
                files,
                site_name: self.snapshot.host.clone(),
            })
            .await?;

        match reply {
            Reply::Processing => Ok(()),
            Reply::Rejected { reason } => Err(SnapError::Encode(reason)),
            other => Err(SnapError::Encode(format!(
                "unexpected packager reply: {other:?}"
            ))),
        }
    }
}
