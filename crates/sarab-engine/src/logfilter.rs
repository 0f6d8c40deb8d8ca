//! Diagnostic-output filter for the supervised process.
//!
//! `cloudflared` prefixes every line with a timestamp and level and emits a
//! large amount of startup chatter. The filter strips the prefix and drops
//! known noise; everything else is forwarded verbatim. Purely a
//! presentation concern.

use std::sync::LazyLock;

use regex::Regex;

/// Leading `2024-01-02T03:04:05Z INF ` style prefix.
static LOG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z?\s+(?:INF|WRN|ERR|DBG|INFO|WARN|ERROR|DEBUG)\s+")
        .expect("static regex is valid")
});

/// Substrings marking a line as startup/marketing noise.
const NOISE: &[&str] = &[
    "Version ",
    "GOOS:",
    "GOARCH:",
    "GoVersion:",
    "Runtime:",
    "Settings:",
    "Generated Connector ID",
    "Initial protocol",
    "ICMP proxy",
    "Starting metrics server",
    "cloudflared will not automatically update",
    "update check",
    "Thank you for trying Cloudflare Tunnel",
    "https://developers.cloudflare.com/argo-tunnel",
];

/// Render one diagnostic line for the user, or `None` to drop it.
pub fn render_line(line: &str) -> Option<String> {
    let stripped = LOG_PREFIX.replace(line, "");
    if stripped.trim().is_empty() {
        return None;
    }
    if NOISE.iter().any(|needle| stripped.contains(needle)) {
        return None;
    }
    Some(stripped.into_owned())
}
