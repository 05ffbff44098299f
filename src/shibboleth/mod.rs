//! WAYFless URL construction for federated single sign-on.
//!
//! A target URL whose host has a configured federation endpoint can be
//! rewritten so the user skips the where-are-you-from step. The endpoint
//! table is read-only at request time; administration happens elsewhere.

pub mod builder;
pub mod store;

pub use builder::WayflessBuilder;
pub use store::InMemoryFederationStore;

use serde::{Deserialize, Serialize};

/// Federation data for one publisher host, keyed by host. At most one
/// record per host; absence is a valid, common state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationEndpoint {
    pub host: String,

    /// SP-side WAYFless when true, IP-side otherwise
    #[serde(default)]
    pub sp_side_wayfless: bool,

    /// Federation entry URL of the service provider (SP-side only)
    #[serde(default)]
    pub service_provider_url: String,

    /// Query parameter name carrying the institution's entity ID
    #[serde(default = "default_entity_id_param")]
    pub entity_id_param: String,

    /// Query parameter name carrying the original target URL
    #[serde(default = "default_target_param")]
    pub target_param: String,

    /// Assertion consumer endpoint (IP-side only)
    #[serde(default)]
    pub shire: String,

    /// Service provider ID (IP-side only)
    #[serde(default)]
    pub provider_id: String,

    /// Appended verbatim to the constructed URL
    #[serde(default)]
    pub additional_url_parameters: Option<String>,
}

fn default_entity_id_param() -> String {
    "entityID".to_string()
}

fn default_target_param() -> String {
    "target".to_string()
}

/// Read-only lookup of federation endpoints by host.
pub trait FederationStore: Send + Sync {
    fn find_by_host(&self, host: &str) -> Option<FederationEndpoint>;
}
