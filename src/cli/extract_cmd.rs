//! `bundlesnap extract <url>` — run the full extraction pipeline.
//!
//! Captures a snapshot, spawns the agent pair, kicks off extraction, and
//! renders streamed progress until the session reports completion or
//! failure.

use crate::agent::{Message, Reply, Session, SessionEvent};
use crate::cli::output;
use crate::http::HttpClient;
use crate::snapshot::PageSnapshot;
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;

/// Run the extract command.
pub async fn run(
    url: &str,
    include_sourcemaps: bool,
    state_file: Option<&Path>,
    out_dir: &Path,
    timeout_ms: u64,
) -> Result<()> {
    let state = crate::cli::load_state(state_file)?;
    let client = HttpClient::new(timeout_ms);

    output::say(format!("Fetching {url} ..."));
    let snapshot = PageSnapshot::capture(&client, url, timeout_ms, state).await?;

    std::fs::create_dir_all(out_dir)?;
    let session = Session::spawn(snapshot, client, out_dir, timeout_ms, 1);
    let mut progress_rx = session.subscribe_progress();
    let mut events_rx = session.subscribe_events();

    // Liveness check before asking for work.
    session.page.request(Message::Ping).await?;

    match session
        .page
        .request(Message::BeginExtraction {
            include_companion_files: include_sourcemaps,
        })
        .await?
    {
        Reply::Ack => {}
        Reply::Rejected { reason } => bail!("extraction refused: {reason}"),
        other => bail!("unexpected reply from page agent: {other:?}"),
    }

    let bar = progress_bar();

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Ok(SessionEvent::Complete { file_name, saved_to }) => {
                    if let Some(bar) = &bar {
                        bar.set_position(100);
                        bar.finish_with_message("done");
                    }
                    if output::is_json() {
                        output::print_json(&serde_json::json!({
                            "file": file_name,
                            "saved_to": saved_to,
                        }));
                    } else {
                        output::say(format!("Saved {}", saved_to.display()));
                    }
                    return Ok(());
                }
                Ok(SessionEvent::Failure { message }) => {
                    if let Some(bar) = &bar {
                        bar.abandon();
                    }
                    bail!("{message}");
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => bail!("session ended without a result"),
            },
            update = progress_rx.recv() => {
                if let (Ok(update), Some(bar)) = (update, &bar) {
                    bar.set_position(u64::from(update.percent));
                    bar.set_message(update.status);
                }
            }
        }
    }
}

/// Progress bar for interactive runs; none in quiet/JSON mode.
fn progress_bar() -> Option<ProgressBar> {
    if output::is_quiet() || output::is_json() {
        return None;
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    Some(bar)
}
