//! DOI detection and resolution.
//!
//! DOI regexps follow the crossref blog post on matching DOIs: the modern
//! form plus the old Wiley prefix, both carried in OpenURL `id` values as
//! `doi:<doi>`.

use super::{link_from_redirect, no_redirect_client};
use crate::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

static MODERN_DOI: OnceLock<Regex> = OnceLock::new();
static OLD_WILEY_DOI: OnceLock<Regex> = OnceLock::new();

/// Whether an OpenURL `id` value carries a DOI (`doi:` prefix included).
#[must_use]
pub fn is_doi(value: &str) -> bool {
    let modern = MODERN_DOI
        .get_or_init(|| Regex::new(r"^doi:10\.\d{4,9}/[-._;()/:A-Za-z0-9]+$").unwrap());
    let old_wiley =
        OLD_WILEY_DOI.get_or_init(|| Regex::new(r"^doi:10\.1002/\S+$").unwrap());
    modern.is_match(value) || old_wiley.is_match(value)
}

/// Strip the `doi:` prefix carried in the OpenURL parameter.
#[must_use]
pub fn strip_doi_prefix(value: &str) -> String {
    value.replace("doi:", "")
}

/// Resolves a DOI to the publisher's resource URL.
#[async_trait]
pub trait DoiResolver: Send + Sync {
    /// Resolve a bare DOI (no `doi:` prefix). Never fails: when the
    /// registry yields no redirect, the canonical registry URL for the
    /// DOI is returned and remains usable as a fallback link.
    async fn resolve(&self, doi: &str) -> String;
}

/// DOI resolver backed by the registry's redirect behavior.
pub struct HttpDoiResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDoiResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: no_redirect_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DoiResolver for HttpDoiResolver {
    async fn resolve(&self, doi: &str) -> String {
        let link = format!("{}/{}", self.base_url, doi);
        let resolved = link_from_redirect(&self.client, &link).await;
        debug!("retrieved link for doi {}: {}", doi, resolved);
        resolved
    }
}
