//! Terminal error taxonomy for the extraction pipeline.
//!
//! Only conditions that end a run and reach the user live here. Failures that
//! are recovered locally — a detection heuristic that throws, a single asset
//! fetch that 404s — are swallowed at the site of the failure and never
//! become a `SnapError`.

/// Errors that terminate an extraction or packaging run.
#[derive(thiserror::Error, Debug)]
pub enum SnapError {
    /// The page yielded no bundle asset paths at all.
    #[error("no bundle files found on this page")]
    NoAssetsFound,

    /// Assets were found but none downloaded successfully.
    #[error("failed to download any files")]
    NoFilesDownloaded,

    /// Two input paths normalize to the same archive entry name.
    #[error("archive entry collision: '{path}' appears with and without a leading separator")]
    EntryCollision { path: String },

    /// The generated archive is at or above the transfer ceiling.
    #[error("archive is too large: {size} bytes (limit {max}); try extracting fewer files")]
    ArchiveTooLarge { size: usize, max: usize },

    /// Archive generation or transcoding failed.
    #[error("archive encoding failed: {0}")]
    Encode(String),

    /// A request to a peer agent timed out.
    #[error("agent request timed out after {timeout_ms}ms")]
    RequestTimeout { timeout_ms: u64 },

    /// The peer agent's channel is closed (task gone).
    #[error("agent is no longer running")]
    AgentUnavailable,

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
