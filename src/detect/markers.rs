//! Per-framework marker heuristics.
//!
//! Each function answers one question about the snapshot and fails closed:
//! anything unparseable counts as "marker absent".

use crate::snapshot::PageSnapshot;
use scraper::{Html, Selector};
use serde_json::Value;

/// Locate the Next.js data object: the inline
/// `<script id="__NEXT_DATA__">` JSON block, or a `__NEXT_DATA__` key in
/// the state dump.
pub fn next_data(snapshot: &PageSnapshot) -> Option<Value> {
    if let Some(data) = inline_next_data(&snapshot.html) {
        return Some(data);
    }
    snapshot
        .state
        .as_ref()
        .and_then(|s| s.get("__NEXT_DATA__"))
        .filter(|v| v.is_object())
        .cloned()
}

fn inline_next_data(html: &str) -> Option<Value> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse(r#"script[id="__NEXT_DATA__"]"#).ok()?;
    let script = doc.select(&selector).next()?;
    let text: String = script.text().collect();
    serde_json::from_str(text.trim()).ok()
}

/// Next.js tag markers: a `next-head` meta tag or any `/_next/` script.
pub fn has_next_markers(html: &str) -> bool {
    let doc = Html::parse_document(html);

    if let Ok(sel) = Selector::parse(r#"meta[name="next-head"]"#) {
        if doc.select(&sel).next().is_some() {
            return true;
        }
    }
    if let Ok(sel) = Selector::parse(r#"script[src^="/_next/"]"#) {
        if doc.select(&sel).next().is_some() {
            return true;
        }
    }
    false
}

/// Vue: known globals in the state dump, or instance/scoped-style markers
/// in the markup.
pub fn has_vue_markers(snapshot: &PageSnapshot) -> bool {
    if has_state_key(snapshot, &["__VUE__", "Vue"]) {
        return true;
    }

    let html = &snapshot.html;
    if html.contains("__vue__") || html.contains("__vue_app__") {
        return true;
    }
    if let Ok(sel) = Selector::parse("[data-server-rendered]") {
        if Html::parse_document(html).select(&sel).next().is_some() {
            return true;
        }
    }
    // Scoped-style attributes stamped by the Vue compiler: data-v-<hash>.
    html.contains("data-v-")
}

/// React: known globals in the state dump, or instance-property name
/// prefixes stamped on DOM nodes.
pub fn has_react_markers(snapshot: &PageSnapshot) -> bool {
    if has_state_key(
        snapshot,
        &["React", "__REACT__", "__REACT_DEVTOOLS_GLOBAL_HOOK__"],
    ) {
        return true;
    }

    let html = &snapshot.html;
    html.contains("__reactFiber$")
        || html.contains("__reactProps$")
        || html.contains("data-reactroot")
}

/// Angular: known globals in the state dump, or the ng-version attribute.
pub fn has_angular_markers(snapshot: &PageSnapshot) -> bool {
    if has_state_key(snapshot, &["angular", "ng"]) {
        return true;
    }
    if let Ok(sel) = Selector::parse("[ng-version]") {
        if Html::parse_document(&snapshot.html)
            .select(&sel)
            .next()
            .is_some()
        {
            return true;
        }
    }
    false
}

fn has_state_key(snapshot: &PageSnapshot, keys: &[&str]) -> bool {
    match snapshot.state.as_ref() {
        Some(Value::Object(map)) => keys.iter().any(|k| {
            // Present and non-null: mirrors a `typeof x !== 'undefined'` probe.
            map.get(*k).is_some_and(|v| !v.is_null())
        }),
        _ => false,
    }
}
