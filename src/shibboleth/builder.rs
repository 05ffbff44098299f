//! WAYFless URL builder.

use super::{FederationEndpoint, FederationStore};
use crate::params::IdentifierSet;
use crate::Error;
use ipnet::IpNet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Rewrites target URLs into WAYFless single-sign-on URLs.
///
/// Construction is injected with the read-only endpoint store and the
/// institution's federation identity; requests share one builder.
pub struct WayflessBuilder {
    store: Arc<dyn FederationStore>,
    /// Identity provider endpoint used for IP-side WAYFless URLs
    idp_url: String,
    /// Entity ID of the institution
    entity_id: String,
    /// Callers inside these ranges reach resources without federation
    exclusions: Vec<IpNet>,
}

impl WayflessBuilder {
    pub fn new(
        store: Arc<dyn FederationStore>,
        idp_url: &str,
        entity_id: &str,
        exclusions: Vec<IpNet>,
    ) -> Self {
        Self {
            store,
            idp_url: idp_url.to_string(),
            entity_id: entity_id.to_string(),
            exclusions,
        }
    }

    /// Build the WAYFless URL for a target, or return the target
    /// unchanged: callers inside an excluded range, malformed targets
    /// and hosts without federation data all pass through untouched.
    #[must_use]
    pub fn construct_wayfless_url(&self, target: &str, remote_address: &str) -> String {
        if self.in_excluded_range(remote_address) {
            info!("In IP-Range: true, Shibboleth-Daten: none, type: none");
            return target.to_string();
        }

        let host = match Url::parse(target).ok().and_then(|url| {
            url.host_str().map(ToString::to_string)
        }) {
            Some(host) => host,
            None => {
                let err = Error::MalformedTarget {
                    url: target.to_string(),
                };
                info!("In IP-Range: false, Shibboleth-Daten: false, type: error");
                debug!("{}, returning original URL", err);
                return target.to_string();
            }
        };

        debug!("retrieving federation data for host \"{}\"", host);
        match self.store.find_by_host(&host) {
            Some(endpoint) => self.rewrite(&endpoint, target),
            None => {
                info!("In IP-Range: false, Shibboleth-Daten: false, type: none");
                target.to_string()
            }
        }
    }

    fn rewrite(&self, endpoint: &FederationEndpoint, target: &str) -> String {
        let mut parameters = IdentifierSet::new();
        let mut url = if endpoint.sp_side_wayfless {
            parameters.append(&endpoint.entity_id_param, &self.entity_id);
            parameters.append(&endpoint.target_param, target);
            info!("In IP-Range: false, Shibboleth-Daten: true, type: SP-side");
            format!("{}{}", endpoint.service_provider_url, parameters.to_query_string())
        } else {
            parameters.append("target", target);
            parameters.append("shire", &endpoint.shire);
            parameters.append("providerId", &endpoint.provider_id);
            info!("In IP-Range: false, Shibboleth-Daten: true, type: IP-side");
            format!("{}{}", self.idp_url, parameters.to_query_string())
        };
        if let Some(suffix) = &endpoint.additional_url_parameters {
            url.push_str(suffix);
        }
        debug!("generated WAYFless URL {}", url);
        url
    }

    /// Unparseable addresses count as outside all ranges; the rewrite is
    /// still attempted and degrades to the original URL if unusable.
    fn in_excluded_range(&self, remote_address: &str) -> bool {
        match remote_address.parse::<IpAddr>() {
            Ok(address) => self.exclusions.iter().any(|net| net.contains(&address)),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shibboleth::InMemoryFederationStore;

    fn builder(endpoints: Vec<FederationEndpoint>, exclusions: &[&str]) -> WayflessBuilder {
        let exclusions = exclusions
            .iter()
            .map(|net| net.parse().unwrap())
            .collect();
        WayflessBuilder::new(
            Arc::new(InMemoryFederationStore::new(endpoints)),
            "https://idp.example.org/sso",
            "https://idp.example.org/shibboleth",
            exclusions,
        )
    }

    fn sp_endpoint() -> FederationEndpoint {
        FederationEndpoint {
            host: "journals.example.com".to_string(),
            sp_side_wayfless: true,
            service_provider_url: "https://journals.example.com/ssostart".to_string(),
            entity_id_param: "entityID".to_string(),
            target_param: "target".to_string(),
            shire: String::new(),
            provider_id: String::new(),
            additional_url_parameters: None,
        }
    }

    fn ip_endpoint() -> FederationEndpoint {
        FederationEndpoint {
            host: "pub.example".to_string(),
            sp_side_wayfless: false,
            service_provider_url: String::new(),
            entity_id_param: "entityID".to_string(),
            target_param: "target".to_string(),
            shire: "https://pub.example/Shibboleth.sso/SAML/POST".to_string(),
            provider_id: "urn:example:pub".to_string(),
            additional_url_parameters: None,
        }
    }

    #[test]
    fn test_excluded_range_passes_through() {
        let builder = builder(vec![sp_endpoint()], &["10.0.0.0/8"]);
        let url = builder
            .construct_wayfless_url("https://journals.example.com/article/1", "10.11.12.13");
        assert_eq!(url, "https://journals.example.com/article/1");
    }

    #[test]
    fn test_sp_side_url() {
        let builder = builder(vec![sp_endpoint()], &[]);
        let url = builder
            .construct_wayfless_url("https://journals.example.com/article/1", "203.0.113.9");
        assert_eq!(
            url,
            "https://journals.example.com/ssostart\
             ?entityID=https%3A%2F%2Fidp.example.org%2Fshibboleth\
             &target=https%3A%2F%2Fjournals.example.com%2Farticle%2F1"
        );
    }

    #[test]
    fn test_ip_side_url() {
        let builder = builder(vec![ip_endpoint()], &[]);
        let url = builder.construct_wayfless_url("https://pub.example/x", "203.0.113.9");
        assert!(url.starts_with("https://idp.example.org/sso?target="));
        assert!(url.contains("&shire=https%3A%2F%2Fpub.example%2FShibboleth.sso%2FSAML%2FPOST"));
        assert!(url.contains("&providerId=urn%3Aexample%3Apub"));
    }

    #[test]
    fn test_additional_parameters_appended_verbatim() {
        let mut endpoint = ip_endpoint();
        endpoint.additional_url_parameters = Some("&authnContext=standard".to_string());
        let builder = builder(vec![endpoint], &[]);
        let url = builder.construct_wayfless_url("https://pub.example/x", "203.0.113.9");
        assert!(url.ends_with("&authnContext=standard"));
    }

    #[test]
    fn test_unknown_host_passes_through() {
        let builder = builder(vec![sp_endpoint()], &[]);
        let url = builder.construct_wayfless_url("https://other.example.com/a", "203.0.113.9");
        assert_eq!(url, "https://other.example.com/a");
    }

    #[test]
    fn test_malformed_target_passes_through() {
        let builder = builder(vec![sp_endpoint()], &[]);
        let url = builder.construct_wayfless_url("not a url", "203.0.113.9");
        assert_eq!(url, "not a url");
    }

    #[test]
    fn test_unparseable_remote_still_rewrites() {
        let builder = builder(vec![ip_endpoint()], &["0.0.0.0/0"]);
        let url = builder.construct_wayfless_url("https://pub.example/x", "not-an-ip");
        assert!(url.starts_with("https://idp.example.org/sso?"));
    }

    #[test]
    fn test_rewrite_is_idempotent_per_input() {
        let builder = builder(vec![sp_endpoint(), ip_endpoint()], &["10.0.0.0/8"]);
        for (target, remote) in [
            ("https://journals.example.com/article/1", "203.0.113.9"),
            ("https://pub.example/x", "203.0.113.9"),
            ("https://pub.example/x", "10.0.0.1"),
        ] {
            let first = builder.construct_wayfless_url(target, remote);
            let second = builder.construct_wayfless_url(target, remote);
            assert_eq!(first, second);
        }
    }
}
