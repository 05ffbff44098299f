//! Open-access lookup against the unpaywall API.
//!
//! Called only for DOIs that resolved at the registry. A hit means the
//! user can be sent straight to a free copy, skipping the linksolver and
//! any WAYFless rewriting. Among several free copies, one hosted by the
//! publisher itself (same host as the DOI-resolved URL) is preferred
//! over third-party mirrors.

use super::json_client;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Response record of the unpaywall API.
#[derive(Debug, Deserialize)]
pub struct UnpaywallResponse {
    #[serde(default)]
    pub results: Vec<OaCopy>,
}

/// A single known copy of the requested publication.
#[derive(Debug, Deserialize)]
pub struct OaCopy {
    #[serde(default)]
    pub free_fulltext_url: Option<String>,
    #[serde(default)]
    pub is_free_to_read: bool,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub oa_color: Option<String>,
}

/// Looks up whether a free full-text copy exists for a DOI.
#[async_trait]
pub trait OpenAccessLookup: Send + Sync {
    /// Returns the URL of a free copy, or `None` when no copy is known
    /// or the service is unavailable. Absence is a common, valid state.
    async fn lookup(&self, doi: &str, preferred_host: &str) -> Option<String>;
}

/// Unpaywall-backed open-access lookup.
pub struct UnpaywallClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
}

impl UnpaywallClient {
    pub fn new(base_url: &str, email: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: json_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
        })
    }

    async fn fetch(&self, doi: &str) -> Option<UnpaywallResponse> {
        let url = format!("{}/{}", self.base_url, doi);
        let response = self
            .client
            .get(&url)
            .query(&[("email", self.email.as_str())])
            .send()
            .await
            .ok()?;

        // unpaywall answers 404 for unknown DOIs, the normal no-data case
        if !response.status().is_success() {
            debug!("no unpaywall data for doi {} (status {})", doi, response.status());
            return None;
        }

        response.json::<UnpaywallResponse>().await.ok()
    }
}

#[async_trait]
impl OpenAccessLookup for UnpaywallClient {
    async fn lookup(&self, doi: &str, preferred_host: &str) -> Option<String> {
        let response = match self.fetch(doi).await {
            Some(response) => response,
            None => {
                info!("no unpaywall data available for doi {}", doi);
                return None;
            }
        };
        select_free_url(&response, preferred_host)
    }
}

/// Pick a free full-text URL: a copy on `preferred_host` wins, otherwise
/// the first free copy in result order.
fn select_free_url(response: &UnpaywallResponse, preferred_host: &str) -> Option<String> {
    let free_urls = response.results.iter().filter_map(|copy| {
        if copy.is_free_to_read {
            copy.free_fulltext_url
                .as_deref()
                .filter(|url| !url.is_empty())
        } else {
            None
        }
    });

    let mut first: Option<&str> = None;
    for url in free_urls {
        first.get_or_insert(url);
        let host_matches = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|host| host == preferred_host))
            .unwrap_or(false);
        if host_matches {
            return Some(url.to_string());
        }
    }
    first.map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(url: &str, free: bool) -> OaCopy {
        OaCopy {
            free_fulltext_url: Some(url.to_string()),
            is_free_to_read: free,
            license: None,
            evidence: None,
            oa_color: None,
        }
    }

    #[test]
    fn test_prefers_copy_on_doi_host() {
        let response = UnpaywallResponse {
            results: vec![
                copy("https://mirror.example/a.pdf", true),
                copy("https://publisher.example/a.pdf", true),
            ],
        };
        assert_eq!(
            select_free_url(&response, "publisher.example"),
            Some("https://publisher.example/a.pdf".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_first_free_copy() {
        let response = UnpaywallResponse {
            results: vec![
                copy("https://mirror.example/a.pdf", true),
                copy("https://other.example/a.pdf", true),
            ],
        };
        assert_eq!(
            select_free_url(&response, "publisher.example"),
            Some("https://mirror.example/a.pdf".to_string())
        );
    }

    #[test]
    fn test_ignores_paywalled_copies() {
        let response = UnpaywallResponse {
            results: vec![copy("https://publisher.example/a.pdf", false)],
        };
        assert_eq!(select_free_url(&response, "publisher.example"), None);
    }

    #[test]
    fn test_ignores_empty_urls() {
        let response = UnpaywallResponse {
            results: vec![OaCopy {
                free_fulltext_url: Some(String::new()),
                is_free_to_read: true,
                license: None,
                evidence: None,
                oa_color: None,
            }],
        };
        assert_eq!(select_free_url(&response, "publisher.example"), None);
    }
}
