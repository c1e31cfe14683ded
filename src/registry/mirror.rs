//! Aliyun ACR tag collector

use crate::config::MIRROR_PAGE_SIZE;
use crate::registry::error::RegistryError;
use crate::registry::signature;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// ACR tags live under internal bookkeeping prefixes during pushes; those
/// entries never correspond to published versions.
const INTERNAL_TAG_PREFIX: &str = "__ACR_";

const API_VERSION: &str = "2016-06-07";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    data: TagsData,
}

#[derive(Debug, Deserialize)]
struct TagsData {
    #[serde(default)]
    tags: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagEntry {
    tag: String,
    #[serde(default)]
    status: String,
    /// Last update time in epoch milliseconds
    #[serde(default)]
    image_update: i64,
}

/// Collector for the mirror's existing tags.
///
/// Pages through the repo-tags endpoint with signed requests and returns a
/// name to last-update-time mapping. A failure here is reported to the
/// caller but is not fatal to a sync run.
pub struct AcrRegistry {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    access_key_id: String,
    access_key_secret: String,
}

impl AcrRegistry {
    pub fn new(
        base_url: &str,
        owner: &str,
        repo: &str,
        access_key_id: &str,
        access_key_secret: &str,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("tagsync")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
        }
    }

    /// Fetches the full name -> last-update mapping of normal tags.
    pub async fn fetch_tags(&self) -> Result<HashMap<String, DateTime<Utc>>, RegistryError> {
        let mut list = HashMap::new();
        let path = format!("/repos/{}/{}/tags", self.owner, self.repo);
        let mut page: usize = 1;

        loop {
            let query = vec![
                ("Page".to_string(), page.to_string()),
                ("PageSize".to_string(), MIRROR_PAGE_SIZE.to_string()),
            ];

            let response: TagsResponse = self.call(&path, &query).await?;

            let page_len = response.data.tags.len();

            for entry in response.data.tags {
                if entry.tag.starts_with(INTERNAL_TAG_PREFIX) {
                    continue;
                }

                if entry.status != "NORMAL" {
                    continue;
                }

                let Some(updated) = DateTime::from_timestamp_millis(entry.image_update) else {
                    warn!("Skipping tag {} with bad update time", entry.tag);
                    continue;
                };

                list.insert(entry.tag, updated);
            }

            if page_len < MIRROR_PAGE_SIZE {
                break;
            }

            page += 1;
        }

        debug!("Collected {} mirror tags", list.len());

        Ok(list)
    }

    /// Issues one signed GET against the ACR API.
    async fn call(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<TagsResponse, RegistryError> {
        let accept = "application/json";
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let mut headers = BTreeMap::new();
        headers.insert(
            "x-acs-signature-method".to_string(),
            "HMAC-SHA1".to_string(),
        );
        headers.insert("x-acs-signature-version".to_string(), "1.0".to_string());
        headers.insert(
            "x-acs-signature-nonce".to_string(),
            uuid::Uuid::new_v4().to_string(),
        );
        headers.insert("x-acs-version".to_string(), API_VERSION.to_string());

        let canonical = signature::string_to_sign("GET", path, query, &headers, accept, &date);
        let signed = signature::sign(&self.access_key_secret, &canonical);

        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .header("Accept", accept)
            .header("Date", date)
            .header(
                "Authorization",
                format!("acs {}:{}", self.access_key_id, signed),
            );

        for (key, value) in &headers {
            request = request.header(key.as_str(), value);
        }

        let response = request.send().await?;

        let status = response.status();

        if !status.is_success() {
            warn!("ACR returned status {}: {}", status, path);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse ACR tags response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }
}
