//! The message contract between the UI frontend, the page agent, and the
//! privileged agent.
//!
//! Serde-tagged so the contract survives serialization, even though the
//! agents currently live in one process. Requests always pair with a
//! [`Reply`]; streamed progress/completion travel on the session event bus
//! instead.

use crate::collect::FileContentMap;
use crate::detect::DetectionResult;
use serde::{Deserialize, Serialize};

/// Identifier of one browsing context. Detection results are cached per tab.
pub type TabId = u32;

/// Requests and notifications exchanged between agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Liveness probe.
    Ping,
    /// Run (or re-run) framework detection for a tab.
    DetectFramework { tab: TabId },
    /// Report a finished detection pass for caching.
    DetectionReport { tab: TabId, result: DetectionResult },
    /// Kick off an extraction run.
    BeginExtraction { include_companion_files: bool },
    /// Hand the downloaded file map to the packager.
    BuildArchive {
        files: FileContentMap,
        site_name: String,
    },
    /// A tab finished loading a new document; cached detection is stale.
    PageLoaded { tab: TabId },
}

/// Responses to [`Message`] requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Pong,
    /// Request accepted; work started.
    Ack,
    /// Archive accepted; packaging proceeds asynchronously.
    Processing,
    /// Detection outcome (possibly the cached one).
    Detection { result: DetectionResult },
    /// Request refused, with the reason.
    Rejected { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Framework;

    #[test]
    fn test_message_wire_format() {
        let msg = Message::BeginExtraction {
            include_companion_files: true,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("begin_extraction"));
        assert!(json.contains("include_companion_files"));

        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            parsed,
            Message::BeginExtraction {
                include_companion_files: true
            }
        ));
    }

    #[test]
    fn test_reply_wire_format() {
        let reply = Reply::Detection {
            result: DetectionResult {
                framework: Framework::NextJs,
                router: None,
            },
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains("detection"));
        assert!(json.contains("nextjs"));
    }
}
