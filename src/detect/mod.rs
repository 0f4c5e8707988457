//! Front-end framework detection over a page snapshot.
//!
//! Heuristics are evaluated in a fixed priority order and the first match
//! wins. Every check is independently guarded: a malformed JSON block, a
//! missing key, or an unparseable selector degrades to "no result from this
//! check", never to a failed detection pass.

mod markers;
mod router;

pub use router::RouteEntry;

use crate::snapshot::PageSnapshot;
use serde::{Deserialize, Serialize};

/// The closed set of frameworks the detector can report.
///
/// `None` means detection has not run for this tab yet (the cache-miss
/// default); `Unknown` means a scan completed and nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[serde(rename = "nextjs")]
    NextJs,
    Vue,
    React,
    Angular,
    Unknown,
    None,
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NextJs => write!(f, "Next.js"),
            Self::Vue => write!(f, "Vue"),
            Self::React => write!(f, "React"),
            Self::Angular => write!(f, "Angular"),
            Self::Unknown => write!(f, "unknown"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Routing metadata, populated for the two frameworks that expose it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouterInfo {
    /// Next.js build/page identifiers lifted directly from `__NEXT_DATA__`.
    NextJs {
        build_id: String,
        current_page: String,
        pages: Vec<String>,
    },
    /// Flattened Vue route table recovered from a state dump.
    Vue {
        paths: Vec<RouteEntry>,
        auth_route_count: u32,
    },
}

/// The outcome of one detection pass. Produced once per pass, cached per
/// tab, overwritten by re-detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub framework: Framework,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterInfo>,
}

impl DetectionResult {
    /// The result rendered before any detection pass has run.
    pub fn not_yet_run() -> Self {
        Self {
            framework: Framework::None,
            router: None,
        }
    }
}

/// Classify the snapshot's framework. First matching heuristic wins.
pub fn detect(snapshot: &PageSnapshot) -> DetectionResult {
    // 1. The Next.js data object, with routing metadata when it carries
    //    build/page identifiers.
    if let Some(data) = markers::next_data(snapshot) {
        let router = next_router_info(&data);
        tracing::debug!(has_router = router.is_some(), "detected Next.js via __NEXT_DATA__");
        return DetectionResult {
            framework: Framework::NextJs,
            router,
        };
    }

    // 2. Next.js meta/script markers, no routing metadata.
    if markers::has_next_markers(&snapshot.html) {
        tracing::debug!("detected Next.js via tag markers");
        return DetectionResult {
            framework: Framework::NextJs,
            router: None,
        };
    }

    // 3. Vue globals or DOM instance markers, then a best-effort router
    //    search over the state dump.
    if markers::has_vue_markers(snapshot) {
        let router = snapshot
            .state
            .as_ref()
            .and_then(router::extract_vue_router);
        tracing::debug!(has_router = router.is_some(), "detected Vue");
        return DetectionResult {
            framework: Framework::Vue,
            router,
        };
    }

    // 4. React globals or instance-property name prefixes.
    if markers::has_react_markers(snapshot) {
        tracing::debug!("detected React");
        return DetectionResult {
            framework: Framework::React,
            router: None,
        };
    }

    // 5. Angular globals or the ng-version attribute.
    if markers::has_angular_markers(snapshot) {
        tracing::debug!("detected Angular");
        return DetectionResult {
            framework: Framework::Angular,
            router: None,
        };
    }

    DetectionResult {
        framework: Framework::Unknown,
        router: None,
    }
}

/// Lift router metadata out of a `__NEXT_DATA__` object. Requires both
/// `buildId` and `page`; a data object without them still detects as
/// Next.js, just without routing metadata.
fn next_router_info(data: &serde_json::Value) -> Option<RouterInfo> {
    let build_id = data.get("buildId")?.as_str()?.to_string();
    let current_page = data.get("page")?.as_str()?.to_string();
    let pages = data
        .get("pages")
        .and_then(|p| p.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    Some(RouterInfo::NextJs {
        build_id,
        current_page,
        pages,
    })
}
