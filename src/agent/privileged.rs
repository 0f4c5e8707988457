//! The privileged agent: detection cache and the save-file capability.
//!
//! This is the only component allowed to touch the filesystem. Archive
//! requests are acknowledged as processing immediately; the build and save
//! then run to completion and the outcome streams out on the event bus.

use crate::agent::messages::{Message, Reply, TabId};
use crate::agent::runtime::{self, AgentHandle, Envelope, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::agent::{EventSender, SessionEvent};
use crate::archive;
use crate::collect::FileContentMap;
use crate::detect::DetectionResult;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct PrivilegedAgent {
    /// Last detection result per tab; overwritten by re-detection,
    /// dropped when the tab navigates.
    detections: HashMap<TabId, DetectionResult>,
    out_dir: PathBuf,
    events: EventSender,
}

impl PrivilegedAgent {
    /// Spawn the agent task and return the handle peers use to reach it.
    pub fn spawn(out_dir: PathBuf, events: EventSender) -> AgentHandle {
        let (handle, rx) = runtime::mailbox(DEFAULT_REQUEST_TIMEOUT_MS);
        let agent = Self {
            detections: HashMap::new(),
            out_dir,
            events,
        };
        tokio::spawn(agent.run(rx));
        handle
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Envelope>) {
        while let Some(env) = rx.recv().await {
            self.handle(env).await;
        }
        debug!("privileged agent mailbox closed");
    }

    async fn handle(&mut self, env: Envelope) {
        match env.message {
            Message::Ping => runtime::respond(env.reply, Reply::Pong),

            Message::DetectionReport { tab, result } => {
                debug!(tab, framework = %result.framework, "caching detection result");
                self.detections.insert(tab, result);
                runtime::respond(env.reply, Reply::Ack);
            }

            Message::DetectFramework { tab } => {
                let result = self
                    .detections
                    .get(&tab)
                    .cloned()
                    .unwrap_or_else(DetectionResult::not_yet_run);
                runtime::respond(env.reply, Reply::Detection { result });
            }

            Message::PageLoaded { tab } => {
                self.detections.remove(&tab);
                runtime::respond(env.reply, Reply::Ack);
            }

            Message::BuildArchive { files, site_name } => {
                if files.is_empty() {
                    runtime::respond(
                        env.reply,
                        Reply::Rejected {
                            reason: "refusing to build an empty archive".to_string(),
                        },
                    );
                    return;
                }
                // Ack before building so the requester is not held for the
                // encode/transcode step.
                runtime::respond(env.reply, Reply::Processing);
                self.build_and_save(&files, &site_name);
            }

            other => runtime::respond(
                env.reply,
                Reply::Rejected {
                    reason: format!("privileged agent cannot handle {other:?}"),
                },
            ),
        }
    }

    fn build_and_save(&self, files: &FileContentMap, site_name: &str) {
        let event = match archive::build_archive(files, site_name, Utc::now()) {
            Ok(payload) => match archive::save_archive(&payload, &self.out_dir) {
                Ok(path) => {
                    info!(file = %payload.file_name, bytes = payload.size, "archive saved");
                    SessionEvent::Complete {
                        file_name: payload.file_name,
                        saved_to: path,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "archive save failed");
                    SessionEvent::Failure {
                        message: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "archive build failed");
                SessionEvent::Failure {
                    message: e.to_string(),
                }
            }
        };
        let _ = self.events.send(event);
    }
}
