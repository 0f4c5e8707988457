//! Best-effort router recovery from a window-state dump.
//!
//! The dump is an arbitrary object graph; somewhere in it there may be a
//! router-like object exposing a routes table. The search is a depth-bounded
//! DFS with every property access failure-guarded — a dead end yields
//! "not found", never an error.

use crate::detect::RouterInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How deep the object-graph search descends before giving up.
const MAX_SEARCH_DEPTH: usize = 3;

/// One flattened route definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Full path, parent and child segments concatenated.
    pub path: String,
    /// Route name, when the definition carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether any `meta` key containing "auth" is set to true.
    pub auth_required: bool,
}

/// Search the state dump for a Vue router and flatten its routes table.
pub fn extract_vue_router(state: &Value) -> Option<RouterInfo> {
    // Direct hit first: a top-level `$router`, as when the dump was taken
    // from `window`.
    let router = state
        .get("$router")
        .filter(|v| routes_of(v).is_some())
        .or_else(|| find_router(state, 0));

    let routes = routes_of(router?)?;
    let paths = flatten_routes(routes, "");
    if paths.is_empty() {
        return None;
    }

    let auth_route_count = paths.iter().filter(|r| r.auth_required).count() as u32;
    Some(RouterInfo::Vue {
        paths,
        auth_route_count,
    })
}

/// Depth-bounded DFS for an object holding a usable `$router`, or any
/// object that itself looks like a router.
fn find_router(value: &Value, depth: usize) -> Option<&Value> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    let obj = value.as_object()?;

    if let Some(candidate) = obj.get("$router") {
        if routes_of(candidate).is_some() {
            return Some(candidate);
        }
    }

    for child in obj.values() {
        if child.is_object() {
            if routes_of(child).is_some() && looks_like_router(child) {
                return Some(child);
            }
            if let Some(found) = find_router(child, depth + 1) {
                return Some(found);
            }
        }
    }
    None
}

/// A router-like object exposes a routes table either directly or under
/// `options` (the static definition the app was constructed with).
fn routes_of(router: &Value) -> Option<&Vec<Value>> {
    if let Some(routes) = router.get("routes").and_then(|r| r.as_array()) {
        return Some(routes);
    }
    router
        .get("options")
        .and_then(|o| o.get("routes"))
        .and_then(|r| r.as_array())
}

fn looks_like_router(value: &Value) -> bool {
    // Routes alone can be any config array; require a second routing hint.
    value.get("currentRoute").is_some()
        || value.get("options").is_some()
        || value.get("mode").is_some()
        || value.get("history").is_some()
}

/// Flatten a nested routes table into full-path entries, concatenating
/// parent and child segments. Absolute child paths stand alone.
fn flatten_routes(routes: &[Value], parent_path: &str) -> Vec<RouteEntry> {
    let mut result = Vec::new();

    for route in routes {
        let Some(obj) = route.as_object() else {
            continue;
        };

        let current_path = match obj.get("path").and_then(|p| p.as_str()) {
            Some(p) if p.starts_with('/') => p.to_string(),
            Some(p) => format!("{parent_path}/{p}"),
            None => parent_path.to_string(),
        };

        result.push(RouteEntry {
            path: current_path.clone(),
            name: obj.get("name").and_then(|n| n.as_str()).map(String::from),
            auth_required: meta_requires_auth(obj.get("meta")),
        });

        if let Some(children) = obj.get("children").and_then(|c| c.as_array()) {
            result.extend(flatten_routes(children, &current_path));
        }
    }

    result
}

fn meta_requires_auth(meta: Option<&Value>) -> bool {
    let Some(Value::Object(map)) = meta else {
        return false;
    };
    map.iter()
        .any(|(k, v)| k.to_lowercase().contains("auth") && v == &Value::Bool(true))
}
