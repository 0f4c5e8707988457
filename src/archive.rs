//! Archive packaging: file map in, downloadable ZIP payload out.
//!
//! Entry paths are made archive-root-relative by stripping leading
//! separators. Compression is fixed at Deflate level 6. Because the payload
//! crosses the agent boundary inside a JSON message, archives below a fixed
//! ceiling are transcoded to a base64 data URL; anything at or above the
//! ceiling is rejected with a size-exceeded error — a documented limit, see
//! DESIGN.md.

use crate::collect::FileContentMap;
use crate::error::SnapError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archives at or above this size cannot ride the message envelope.
pub const MAX_ARCHIVE_BYTES: usize = 10 * 1024 * 1024;

/// Fixed Deflate level: a speed/size tradeoff, deliberately not configurable.
const COMPRESSION_LEVEL: i64 = 6;

const DATA_URL_PREFIX: &str = "data:application/zip;base64,";

/// A generated archive, transcoded for transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivePayload {
    /// Deterministic output filename.
    pub file_name: String,
    /// The ZIP bytes as a base64 data URL.
    pub data_url: String,
    /// Raw (pre-transcode) archive size in bytes.
    pub size: usize,
}

/// Build a ZIP archive from the downloaded file map.
///
/// Fails with `EntryCollision` when two input paths normalize to the same
/// archive entry name, and with `ArchiveTooLarge` when the result is at or
/// above [`MAX_ARCHIVE_BYTES`].
pub fn build_archive(
    files: &FileContentMap,
    site_name: &str,
    generated_at: DateTime<Utc>,
) -> Result<ArchivePayload, SnapError> {
    // Normalize first so collisions surface before any bytes are written.
    let mut entries: BTreeMap<String, &str> = BTreeMap::new();
    for (path, content) in files {
        let name = path.trim_start_matches('/').to_string();
        if entries.insert(name.clone(), content).is_some() {
            return Err(SnapError::EntryCollision { path: name });
        }
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in &entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(content.as_bytes())?;
    }
    let bytes = writer.finish()?.into_inner();

    debug!(
        entries = entries.len(),
        bytes = bytes.len(),
        "archive generated"
    );

    ensure_within_ceiling(bytes.len())?;

    Ok(ArchivePayload {
        file_name: archive_file_name(site_name, generated_at),
        data_url: format!("{DATA_URL_PREFIX}{}", BASE64.encode(&bytes)),
        size: bytes.len(),
    })
}

/// The ceiling is inclusive: an archive of exactly [`MAX_ARCHIVE_BYTES`]
/// is already too large to transfer.
fn ensure_within_ceiling(size: usize) -> Result<(), SnapError> {
    if size >= MAX_ARCHIVE_BYTES {
        return Err(SnapError::ArchiveTooLarge {
            size,
            max: MAX_ARCHIVE_BYTES,
        });
    }
    Ok(())
}

/// `{site}-nextjs-source-{timestamp}.zip`, with `:` and `.` in the ISO-8601
/// timestamp replaced by `-`. Deterministic given site name and instant.
pub fn archive_file_name(site_name: &str, generated_at: DateTime<Utc>) -> String {
    let timestamp = generated_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{site_name}-nextjs-source-{timestamp}.zip")
}

/// Recover raw ZIP bytes from a transfer payload.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, SnapError> {
    let encoded = data_url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| SnapError::Encode("payload is not a zip data URL".to_string()))?;
    BASE64
        .decode(encoded)
        .map_err(|e| SnapError::Encode(format!("base64 decode failed: {e}")))
}

/// Decode the payload and write the archive into `dir`. Returns the full
/// path written.
pub fn save_archive(payload: &ArchivePayload, dir: &Path) -> Result<PathBuf, SnapError> {
    let bytes = decode_data_url(&payload.data_url)?;
    let target = dir.join(&payload.file_name);
    std::fs::write(&target, bytes)?;
    Ok(target)
}
