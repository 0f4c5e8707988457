//! `bundlesnap detect <url>` — classify the page's front-end framework.

use crate::agent::{Message, Reply, Session};
use crate::cli::output;
use crate::detect::{DetectionResult, Framework, RouterInfo};
use crate::http::HttpClient;
use crate::snapshot::PageSnapshot;
use anyhow::{bail, Result};
use std::path::Path;

/// Run the detect command.
pub async fn run(url: &str, state_file: Option<&Path>, timeout_ms: u64) -> Result<()> {
    let state = crate::cli::load_state(state_file)?;
    let client = HttpClient::new(timeout_ms);
    let snapshot = PageSnapshot::capture(&client, url, timeout_ms, state).await?;

    // Detection runs in the page agent and lands in the privileged agent's
    // per-tab cache, same as a full extraction session would.
    let out_dir = std::env::temp_dir();
    let session = Session::spawn(snapshot, client, &out_dir, timeout_ms, 1);
    let reply = session
        .page
        .request(Message::DetectFramework { tab: 1 })
        .await?;

    let result = match reply {
        Reply::Detection { result } => result,
        other => bail!("unexpected reply from page agent: {other:?}"),
    };

    if output::is_json() {
        output::print_json(&serde_json::to_value(&result)?);
        return Ok(());
    }
    print_pretty(&result);
    Ok(())
}

fn print_pretty(result: &DetectionResult) {
    match result.framework {
        Framework::Unknown => output::say("No known framework detected."),
        fw => output::say(format!("Framework: {fw}")),
    }

    match &result.router {
        Some(RouterInfo::NextJs {
            build_id,
            current_page,
            pages,
        }) => {
            output::say(format!("  build id:     {build_id}"));
            output::say(format!("  current page: {current_page}"));
            if !pages.is_empty() {
                output::say(format!("  pages:        {}", pages.join(", ")));
            }
        }
        Some(RouterInfo::Vue {
            paths,
            auth_route_count,
        }) => {
            output::say(format!("  routes ({}):", paths.len()));
            for route in paths {
                let name = route.name.as_deref().unwrap_or("-");
                let auth = if route.auth_required { " [auth]" } else { "" };
                output::say(format!("    {}  ({name}){auth}", route.path));
            }
            if *auth_route_count > 0 {
                output::say(format!("  auth-gated routes: {auth_route_count}"));
            }
        }
        None => {}
    }
}
