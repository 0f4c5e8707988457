//! Output helpers honoring the global CLI flags.
//!
//! Flags are exported through environment variables so any module can check
//! them without threading a config value everywhere.

/// Whether `--json` was passed: machine-readable output only.
pub fn is_json() -> bool {
    std::env::var("BUNDLESNAP_JSON").is_ok()
}

/// Whether `--quiet` was passed: suppress non-essential output.
pub fn is_quiet() -> bool {
    std::env::var("BUNDLESNAP_QUIET").is_ok()
}

/// Print a JSON value to stdout, pretty-printed.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

/// Print a human-facing line unless quiet or JSON mode is active.
pub fn say(line: impl AsRef<str>) {
    if !is_quiet() && !is_json() {
        println!("{}", line.as_ref());
    }
}
