//! Docker Hub tag collector

use crate::config::UPSTREAM_PAGE_SIZE;
use crate::registry::error::RegistryError;
use crate::tag::{self, VersionTag};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

/// Response from the Docker Hub login endpoint
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: String,
}

/// One page of the Docker Hub tag listing
#[derive(Debug, Deserialize)]
struct TagPage {
    results: Vec<TagEntry>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    id: i64,
    name: String,
    #[serde(default)]
    tag_status: String,
    tag_last_pushed: Option<DateTime<Utc>>,
}

/// Collector for the upstream Docker Hub tag listing.
///
/// Authenticates once per run (anonymous listing is rate-limited much more
/// aggressively) and pages through the tag API until no next page is
/// returned. Any failure aborts the whole collection.
pub struct DockerHubRegistry {
    client: reqwest::Client,
    base_url: String,
    repository: String,
    username: String,
    password: String,
}

impl DockerHubRegistry {
    pub fn new(base_url: &str, repository: &str, username: &str, password: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("tagsync")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            repository: repository.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Exchanges username/password for a bearer token.
    async fn login(&self) -> Result<String, RegistryError> {
        let url = format!("{}/v2/users/login", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await?;

        let login: LoginResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Docker Hub login response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        if login.token.is_empty() {
            return Err(RegistryError::Authentication(
                "Docker Hub returned no token".to_string(),
            ));
        }

        Ok(login.token)
    }

    /// Fetches every active version tag of the repository.
    ///
    /// Each surviving name is emitted twice: once bare and once with the
    /// "-alpine" suffix, sharing id, push time and force flag. The force
    /// flag is set for floating names with fewer than 3 segments.
    pub async fn fetch_tags(&self) -> Result<Vec<VersionTag>, RegistryError> {
        let token = self.login().await?;

        let mut list = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = format!(
                "{}/v2/repositories/{}/tags/?page_size={}&page={}",
                self.base_url, self.repository, UPSTREAM_PAGE_SIZE, page
            );

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", token))
                .send()
                .await?;

            let status = response.status();

            if !status.is_success() {
                warn!("Docker Hub returned status {}: {}", status, url);
                return Err(RegistryError::InvalidResponse(format!(
                    "Unexpected status: {}",
                    status
                )));
            }

            let tag_page: TagPage = response.json().await.map_err(|e| {
                warn!("Failed to parse Docker Hub tags response: {}", e);
                RegistryError::InvalidResponse(e.to_string())
            })?;

            for entry in &tag_page.results {
                if entry.tag_status != "active" {
                    continue;
                }

                if !tag::matches_version_pattern(&entry.name) {
                    continue;
                }

                if !tag::is_supported(&entry.name) {
                    continue;
                }

                let last_pushed = entry.tag_last_pushed.unwrap_or(DateTime::UNIX_EPOCH);
                let force = !tag::is_pinned(&entry.name);

                for suffix in ["", "-alpine"] {
                    list.push(VersionTag {
                        id: entry.id,
                        name: format!("{}{}", entry.name, suffix),
                        last_pushed,
                        force,
                    });
                }
            }

            match tag_page.next {
                Some(ref next) if !next.is_empty() => page += 1,
                _ => break,
            }
        }

        debug!("Collected {} upstream version tags", list.len());

        Ok(list)
    }
}
