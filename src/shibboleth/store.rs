//! File-backed federation endpoint store.
//!
//! Endpoints are loaded once at startup from a TOML table and shared
//! read-only across all requests:
//!
//! ```toml
//! [[endpoint]]
//! host = "journals.example.com"
//! sp_side_wayfless = true
//! service_provider_url = "https://journals.example.com/action/ssostart"
//! ```

use super::{FederationEndpoint, FederationStore};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, serde::Deserialize)]
struct EndpointFile {
    #[serde(default, rename = "endpoint")]
    endpoints: Vec<FederationEndpoint>,
}

/// In-memory federation endpoint table, keyed by host.
#[derive(Debug, Default)]
pub struct InMemoryFederationStore {
    endpoints: HashMap<String, FederationEndpoint>,
}

impl InMemoryFederationStore {
    #[must_use]
    pub fn new(endpoints: Vec<FederationEndpoint>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|endpoint| (endpoint.host.clone(), endpoint))
            .collect();
        Self { endpoints }
    }

    /// Load the endpoint table from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let store = Self::from_toml(&raw)?;
        info!(
            "loaded {} federation endpoints from {}",
            store.endpoints.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let file: EndpointFile = toml::from_str(raw).map_err(|e| Error::Parse {
            context: "federation endpoints".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(file.endpoints))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl FederationStore for InMemoryFederationStore {
    fn find_by_host(&self, host: &str) -> Option<FederationEndpoint> {
        self.endpoints.get(host).cloned()
    }
}
