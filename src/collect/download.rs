//! Sequential asset downloader.
//!
//! Fetches proceed strictly one at a time so progress can be reported after
//! every item and behavior stays predictable. A failing item is logged and
//! dropped; the loop continues unconditionally.

use crate::collect::AssetReference;
use crate::error::SnapError;
use crate::http::HttpClient;
use crate::progress::ProgressTracker;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Archive-relative path → downloaded text content. Built incrementally,
/// handed whole to the packager, never mutated after handoff.
pub type FileContentMap = BTreeMap<String, String>;

/// Progress sub-range reserved for the download phase.
const PROGRESS_BASE: u32 = 20;
const PROGRESS_SPAN: u32 = 60;

/// Download every referenced asset in order, one request in flight at a
/// time. Returns the content map, or `NoFilesDownloaded` if nothing
/// succeeded — an empty map is never returned.
pub async fn download_all(
    client: &HttpClient,
    refs: &[AssetReference],
    timeout_ms: u64,
    tracker: &mut ProgressTracker,
) -> Result<FileContentMap, SnapError> {
    let mut contents = FileContentMap::new();
    let total = refs.len();
    let mut completed = 0u32;

    for asset in refs {
        match client.get(&asset.url, timeout_ms).await {
            Ok(resp) if resp.is_success() => {
                debug!(path = %asset.path, bytes = resp.body.len(), "downloaded");
                contents.insert(asset.path.clone(), resp.body);
            }
            Ok(resp) => {
                warn!(url = %asset.url, status = resp.status, "skipping asset: non-success status");
            }
            Err(e) => {
                warn!(url = %asset.url, error = %e, "skipping asset: fetch failed");
            }
        }

        completed += 1;
        let percent = PROGRESS_BASE + (completed * PROGRESS_SPAN) / total.max(1) as u32;
        tracker.emit(percent as u8, format!("Downloading: {completed}/{total}"));
    }

    if contents.is_empty() {
        return Err(SnapError::NoFilesDownloaded);
    }
    Ok(contents)
}
