//! GitHub release publisher
//!
//! Publishing a version rewrites the Dockerfile in the release repository,
//! commits it, and points an annotated `release-v<version>` tag at the new
//! commit. CI on the release repository builds and pushes the image from
//! there.

use crate::config::{DOCKERFILE_PATH, IMAGE_NAME};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    sha: String,
}

#[derive(Debug, Serialize)]
struct UpdateFileRequest {
    message: String,
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct UpdateFileResponse {
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateTagRequest {
    tag: String,
    message: String,
    object: String,
    #[serde(rename = "type")]
    object_type: String,
    tagger: Tagger,
    verification: Verification,
}

#[derive(Debug, Serialize)]
struct Tagger {
    name: String,
    email: String,
    date: String,
}

#[derive(Debug, Serialize)]
struct Verification {
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct TagObjectResponse {
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateRefRequest {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: String,
}

/// Publishes release commits and tags to the GitHub repository.
pub struct GitHubPublisher {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    token: String,
    tagger_email: String,
}

impl GitHubPublisher {
    pub fn new(base_url: &str, owner: &str, repo: &str, token: &str, tagger_email: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("tagsync")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
            tagger_email: tagger_email.to_string(),
        }
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.owner, self.repo, suffix
        )
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Publishes one version: commit the Dockerfile, create the annotated
    /// tag object, then recreate the tag ref.
    ///
    /// The ref delete (when forced) and the ref create are best-effort:
    /// their failures are logged and swallowed. Everything before them
    /// aborts this version's publication.
    pub async fn publish(&self, version: &str, force: bool) -> Result<(), PublishError> {
        info!("Publishing version {}", version);

        // a missing Dockerfile just means this is the first commit
        let sha = match self.current_file_sha().await {
            Ok(sha) => sha,
            Err(e) => {
                debug!("No previous Dockerfile content: {}", e);
                String::new()
            }
        };

        let commit_sha = self.commit_dockerfile(version, sha).await?;
        let tag_sha = self.create_tag_object(version, &commit_sha).await?;

        let ref_name = format!("refs/tags/release-v{}", version);

        if force {
            if let Err(e) = self.delete_ref(&ref_name).await {
                warn!("Ignoring failed ref delete for {}: {}", ref_name, e);
            }
        }

        if let Err(e) = self.create_ref(&ref_name, &tag_sha).await {
            warn!("Ignoring failed ref create for {}: {}", ref_name, e);
        }

        Ok(())
    }

    /// Blob SHA of the current Dockerfile, required by the contents API to
    /// overwrite it.
    async fn current_file_sha(&self) -> Result<String, PublishError> {
        let response = self
            .client
            .get(self.repo_url(&format!("contents/{}", DOCKERFILE_PATH)))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            return Err(PublishError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        Ok(contents.sha)
    }

    /// Overwrites the Dockerfile with a single FROM line and returns the
    /// new commit SHA.
    async fn commit_dockerfile(&self, version: &str, sha: String) -> Result<String, PublishError> {
        let body = UpdateFileRequest {
            message: format!("auto-{}", version),
            content: STANDARD.encode(format!("FROM {}:{}\n", IMAGE_NAME, version)),
            sha,
        };

        let response = self
            .client
            .put(self.repo_url(&format!("contents/{}", DOCKERFILE_PATH)))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            warn!("GitHub contents API returned status {}", status);
            return Err(PublishError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let update: UpdateFileResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        Ok(update.commit.sha)
    }

    /// Creates the annotated tag object pointing at the commit.
    async fn create_tag_object(
        &self,
        version: &str,
        commit_sha: &str,
    ) -> Result<String, PublishError> {
        let tag_name = format!("release-v{}", version);

        let body = CreateTagRequest {
            tag: tag_name.clone(),
            message: tag_name,
            object: commit_sha.to_string(),
            object_type: "commit".to_string(),
            tagger: Tagger {
                name: self.owner.clone(),
                email: self.tagger_email.clone(),
                date: Utc::now().to_rfc3339(),
            },
            verification: Verification { verified: false },
        };

        let response = self
            .client
            .post(self.repo_url("git/tags"))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            warn!("GitHub tags API returned status {}", status);
            return Err(PublishError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let tag: TagObjectResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        Ok(tag.sha)
    }

    async fn delete_ref(&self, ref_name: &str) -> Result<(), PublishError> {
        let response = self
            .client
            .delete(self.repo_url(&format!("git/{}", ref_name)))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn create_ref(&self, ref_name: &str, sha: &str) -> Result<(), PublishError> {
        let body = CreateRefRequest {
            git_ref: ref_name.to_string(),
            sha: sha.to_string(),
        };

        let response = self
            .client
            .post(self.repo_url("git/refs"))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
