use serde::Deserialize;
use std::path::Path;

// =============================================================================
// Sync constants
// =============================================================================

/// Page size for the Docker Hub tag listing
pub const UPSTREAM_PAGE_SIZE: u32 = 1000;

/// Page size for the ACR tag listing
pub const MIRROR_PAGE_SIZE: usize = 100;

/// Mirror entries count as fresh only when their update time, minus this
/// window, is still after the upstream push time
pub const GRACE_WINDOW_HOURS: i64 = 1;

/// 1.x lines below this minor version are end-of-life and never mirrored
pub const MIN_SUPPORTED_MINOR: u32 = 15;

/// File rewritten in the release repository for every published version
pub const DOCKERFILE_PATH: &str = "Dockerfile";

/// Image referenced by the generated Dockerfile
pub const IMAGE_NAME: &str = "golang";

/// Full sync configuration. Every field has a compiled-in default so the
/// binary runs without a config file; a JSON file can override any subset.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    pub upstream: UpstreamConfig,
    pub mirror: MirrorConfig,
    pub github: GitHubConfig,
}

impl SyncConfig {
    /// Loads configuration from a JSON file, filling missing fields with
    /// defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Docker Hub settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Repository whose tags are mirrored, e.g. "library/golang"
    pub repository: String,
    pub username: String,
    pub password: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hub.docker.com".to_string(),
            repository: "library/golang".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Aliyun ACR settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MirrorConfig {
    /// Regional endpoint, scheme included
    pub base_url: String,
    pub owner: String,
    pub repo: String,
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cr.cn-shenzhen.aliyuncs.com".to_string(),
            owner: "hongfs".to_string(),
            repo: "golang".to_string(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
        }
    }
}

/// GitHub settings for the release repository
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    pub base_url: String,
    pub owner: String,
    pub repo: String,
    pub token: String,
    /// Tagger identity on created tag objects
    pub tagger_email: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            owner: "hongfs".to_string(),
            repo: "golang".to_string(),
            token: String::new(),
            tagger_email: "hong@hongfs.cn".to_string(),
        }
    }
}
