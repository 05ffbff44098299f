//! Legacy linksolver adapter.
//!
//! The linksolver answers an OpenURL query with an HTML page whose anchor
//! links enumerate the available access options. The anchor labels are a
//! semi-stable vocabulary (see `routing::classifier`); this adapter only
//! extracts `(label, href)` pairs in document order and leaves their
//! interpretation to the routing engine.
//!
//! Unlike the other collaborators, a failure here is surfaced as a typed
//! error: the engine owns the fallback decision.

use super::{link_from_redirect, no_redirect_client};
use crate::params::IdentifierSet;
use crate::{Error, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// An anchor link scraped from the linksolver response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLink {
    /// Display label, whitespace-normalized
    pub label: String,
    /// Raw href, relative to the linksolver base URL
    pub href: String,
}

/// Queries the legacy linksolver for access options.
#[async_trait]
pub trait LinksolverClient: Send + Sync {
    /// Base URL of the linksolver UI.
    fn base_url(&self) -> &str;

    /// The full query URL for a parameter set, also used as the
    /// send-the-user-back-to-the-UI fallback target.
    fn query_url(&self, params: &IdentifierSet) -> String {
        format!("{}{}", self.base_url(), params.to_query_string())
    }

    /// Query the linksolver and return its anchors in document order.
    async fn query(&self, params: &IdentifierSet) -> Result<Vec<AnchorLink>>;

    /// Resolve an anchor href against the base URL and follow one
    /// redirect hop to obtain the concrete resource URL.
    async fn follow(&self, href: &str) -> String;
}

/// HTTP implementation scraping the linksolver's HTML response.
pub struct HttpLinksolverClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpLinksolverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: no_redirect_client(timeout)?,
            base_url: base_url.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl LinksolverClient for HttpLinksolverClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn query(&self, params: &IdentifierSet) -> Result<Vec<AnchorLink>> {
        let url = self.query_url(params);
        debug!("getting response from linksolver: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::UpstreamTimeout {
                    service: "linksolver".to_string(),
                    timeout: self.timeout,
                }
            } else {
                Error::UpstreamUnavailable {
                    service: "linksolver".to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(Error::UpstreamUnavailable {
                service: "linksolver".to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| Error::Parse {
            context: "linksolver".to_string(),
            message: e.to_string(),
        })?;

        let anchors = extract_anchors(&body)?;
        debug!("found {} links in linksolver response", anchors.len());
        Ok(anchors)
    }

    async fn follow(&self, href: &str) -> String {
        let link = format!("{}{}", self.base_url, href);
        link_from_redirect(&self.client, &link).await
    }
}

/// Extract anchor `(label, href)` pairs in document order.
fn extract_anchors(body: &str) -> Result<Vec<AnchorLink>> {
    let selector = Selector::parse("a").map_err(|e| Error::Parse {
        context: "linksolver".to_string(),
        message: e.to_string(),
    })?;

    let document = Html::parse_document(body);
    let anchors = document
        .select(&selector)
        .map(|element| {
            let text: Vec<&str> = element.text().collect();
            let label = text
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let href = element.value().attr("href").unwrap_or_default().to_string();
            AnchorLink { label, href }
        })
        .collect();
    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_anchors_in_document_order() {
        let body = r#"
            <html><body>
              <a href="/link0?sid=1">Link zum Artikel</a>
              <p>weitere Optionen:</p>
              <a href="/link1?sid=2">Fernleihe</a>
            </body></html>
        "#;
        let anchors = extract_anchors(body).unwrap();
        assert_eq!(
            anchors,
            vec![
                AnchorLink {
                    label: "Link zum Artikel".to_string(),
                    href: "/link0?sid=1".to_string(),
                },
                AnchorLink {
                    label: "Fernleihe".to_string(),
                    href: "/link1?sid=2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_anchors_normalizes_whitespace() {
        let body = "<a href=\"/x\">Volltexte \n  \u{fc}ber Nationallizenz</a>";
        let anchors = extract_anchors(body).unwrap();
        assert_eq!(anchors[0].label, "Volltexte über Nationallizenz");
    }

    #[test]
    fn test_extract_anchors_without_href() {
        let anchors = extract_anchors("<a>zur Zeitschrift</a>").unwrap();
        assert_eq!(anchors[0].href, "");
    }

    #[test]
    fn test_no_anchors() {
        assert!(extract_anchors("<html><body>nichts</body></html>")
            .unwrap()
            .is_empty());
    }
}
