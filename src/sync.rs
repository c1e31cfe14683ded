//! Single-pass sync run

use crate::config::SyncConfig;
use crate::publish::GitHubPublisher;
use crate::reconcile::{self, Decision};
use crate::registry::{AcrRegistry, DockerHubRegistry};
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Runs one sync pass: collect upstream tags, collect the mirror state,
/// publish whatever the reconciler selects.
///
/// An upstream collection failure is fatal. A mirror collection failure
/// degrades to an empty mirror map, which forces every upstream tag to be
/// republished. Per-tag publish failures are logged and skipped.
pub async fn run(config: &SyncConfig) -> anyhow::Result<()> {
    let upstream = DockerHubRegistry::new(
        &config.upstream.base_url,
        &config.upstream.repository,
        &config.upstream.username,
        &config.upstream.password,
    );

    let tags = upstream.fetch_tags().await?;
    info!("Found {} upstream version tags", tags.len());

    let mirror = AcrRegistry::new(
        &config.mirror.base_url,
        &config.mirror.owner,
        &config.mirror.repo,
        &config.mirror.access_key_id,
        &config.mirror.access_key_secret,
    );

    let mirror_tags = match mirror.fetch_tags().await {
        Ok(tags) => tags,
        Err(e) => {
            warn!("Failed to fetch mirror tags, treating mirror as empty: {}", e);
            HashMap::new()
        }
    };

    let publisher = GitHubPublisher::new(
        &config.github.base_url,
        &config.github.owner,
        &config.github.repo,
        &config.github.token,
        &config.github.tagger_email,
    );

    for tag in &tags {
        match reconcile::decide(tag, &mirror_tags) {
            Decision::Skip => continue,
            Decision::Create { force } => {
                if let Err(e) = publisher.publish(&tag.name, force).await {
                    error!("Failed to publish {}: {}", tag.name, e);
                }
            }
        }
    }

    Ok(())
}
