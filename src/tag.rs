//! Version tag model and name-shape helpers

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Names must be one to three dot-separated numeric segments, e.g. "1", "1.21"
/// or "1.21.3". Anything else ("latest", "1.21rc1", "windowsservercore") is
/// not a version tag.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}\.)?(\d{1,2}\.)?(\d{1,2})$").unwrap());

/// A version tag observed on the upstream registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    /// Opaque numeric id assigned by the upstream registry
    pub id: i64,
    /// Tag name, e.g. "1.21" or "1.21.3-alpine"
    pub name: String,
    /// When the upstream registry last pushed this tag
    pub last_pushed: DateTime<Utc>,
    /// Whether an existing tag ref should be deleted and recreated
    pub force: bool,
}

/// Returns true if the name is exactly a 1-3 segment numeric version.
pub fn matches_version_pattern(name: &str) -> bool {
    VERSION_PATTERN.is_match(name)
}

/// Number of dot-separated segments. Counts on the full name, so
/// "1.21.3-alpine" has 3 segments just like "1.21.3".
pub fn segment_count(name: &str) -> usize {
    name.split('.').count()
}

/// A pinned name carries all three segments and is immutable once published.
/// Names with fewer segments are floating aliases that track the latest patch.
pub fn is_pinned(name: &str) -> bool {
    segment_count(name) >= 3
}

/// Filters out end-of-life 1.x lines: "1.14" and below are dropped, "1.15"
/// and later are kept. Names without a "1." prefix (a bare major like "1",
/// or a future "2.x") pass through.
pub fn is_supported(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("1.") else {
        return true;
    };
    let minor = rest.split('.').next().unwrap_or("");
    match minor.parse::<u32>() {
        Ok(minor) => minor >= crate::config::MIN_SUPPORTED_MINOR,
        Err(_) => false,
    }
}
