//! Decides whether an upstream tag needs publishing

use crate::config::GRACE_WINDOW_HOURS;
use crate::tag::{self, VersionTag};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Outcome for a single upstream tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Publish a release; `force` recreates an existing tag ref
    Create { force: bool },
    /// Leave the tag alone
    Skip,
}

/// Pure decision over one upstream tag and the mirror state.
///
/// A tag missing from the mirror is always created, forced. Dotted names
/// already present in the mirror are left alone. The remaining names (bare
/// majors like "1") are refreshed unless the mirror copy is over the grace
/// window fresher than the upstream push: the mirror time, shifted back by
/// the window, must still be after the upstream push time to skip.
pub fn decide(tag: &VersionTag, mirror: &HashMap<String, DateTime<Utc>>) -> Decision {
    let Some(&mirror_time) = mirror.get(&tag.name) else {
        return Decision::Create { force: true };
    };

    // once mirrored, anything with a dot in it is never touched again
    if tag::segment_count(&tag.name) >= 2 {
        return Decision::Skip;
    }

    if mirror_time - Duration::hours(GRACE_WINDOW_HOURS) > tag.last_pushed {
        return Decision::Skip;
    }

    Decision::Create { force: tag.force }
}
