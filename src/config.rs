//! Gateway configuration.
//!
//! Loaded from an optional TOML file with `OPENURL_GATEWAY_*` environment
//! overrides layered on top; every field has a working default so the
//! binary starts without a file in development.

use crate::{Error, Result};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub linksolver: LinksolverConfig,
    pub doi: DoiConfig,
    pub unpaywall: UnpaywallConfig,
    pub shibboleth: ShibbolethConfig,
    pub routing: RoutingTargets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksolverConfig {
    /// Base URL of the legacy linksolver
    pub url: String,
    /// Bounded timeout for the linksolver query
    pub timeout_secs: u64,
}

impl Default for LinksolverConfig {
    fn default() -> Self {
        Self {
            url: "https://linksolver.example.org/linksolver".to_string(),
            timeout_secs: 60,
        }
    }
}

impl LinksolverConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoiConfig {
    /// Canonical DOI registry resolution endpoint
    pub resolver_url: String,
    pub timeout_secs: u64,
}

impl Default for DoiConfig {
    fn default() -> Self {
        Self {
            resolver_url: "https://doi.org".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DoiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnpaywallConfig {
    pub url: String,
    /// Contact address attached to every unpaywall request
    pub email: String,
    pub timeout_secs: u64,
}

impl Default for UnpaywallConfig {
    fn default() -> Self {
        Self {
            url: "https://api.unpaywall.org/my/request".to_string(),
            email: "libintel@example.org".to_string(),
            timeout_secs: 30,
        }
    }
}

impl UnpaywallConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShibbolethConfig {
    /// Identity provider endpoint for IP-side WAYFless URLs
    pub idp_url: String,
    /// Entity ID of the institution
    pub entity_id: String,
    /// CIDR ranges whose callers bypass federation
    pub exclusions: Vec<String>,
    /// TOML file with the federation endpoint table
    pub endpoints_file: Option<PathBuf>,
}

impl Default for ShibbolethConfig {
    fn default() -> Self {
        Self {
            idp_url: "https://idp.example.org/Shibboleth.sso/Login".to_string(),
            entity_id: "https://idp.example.org/shibboleth".to_string(),
            exclusions: Vec::new(),
            endpoints_file: None,
        }
    }
}

impl ShibbolethConfig {
    /// Parse the configured exclusion ranges.
    pub fn exclusion_nets(&self) -> Result<Vec<IpNet>> {
        self.exclusions
            .iter()
            .map(|raw| {
                raw.parse::<IpNet>().map_err(|e| Error::InvalidInput {
                    field: "shibboleth.exclusions".to_string(),
                    reason: format!("{raw}: {e}"),
                })
            })
            .collect()
    }
}

/// Fixed routing targets for the non-fulltext outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingTargets {
    /// Order form shown instead of Elsevier full text or loan
    pub order_form_url: String,
    /// Journals online-and-print page
    pub jop_url: String,
    pub jop_sid: String,
    pub jop_pid: String,
    /// Interlibrary loan OpenURL endpoint
    pub ill_url: String,
    pub ill_sid: String,
    pub ill_pid: String,
}

impl Default for RoutingTargets {
    fn default() -> Self {
        Self {
            order_form_url: "https://www.uni-due.de/ub/elsevierersatz.php".to_string(),
            jop_url: "https://www.uni-due.de/ub/ghbsys/jop".to_string(),
            jop_sid: "bib:ughe".to_string(),
            jop_pid: "bibid=UGHE".to_string(),
            ill_url: "https://www.digibib.net/openurl".to_string(),
            ill_sid: "464_465:Zeitschriftenkatalog".to_string(),
            ill_pid: "<location>464_465</location>".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus environment
    /// overrides (`OPENURL_GATEWAY_SERVER__PORT=8081` style).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("OPENURL_GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::InvalidInput {
                field: "server.port".to_string(),
                reason: "port must be non-zero".to_string(),
            });
        }
        if self.linksolver.url.is_empty() {
            return Err(Error::InvalidInput {
                field: "linksolver.url".to_string(),
                reason: "linksolver URL must be set".to_string(),
            });
        }
        if self.linksolver.timeout_secs == 0 {
            return Err(Error::InvalidInput {
                field: "linksolver.timeout_secs".to_string(),
                reason: "timeout must be non-zero".to_string(),
            });
        }
        if self.unpaywall.email.is_empty() {
            return Err(Error::InvalidInput {
                field: "unpaywall.email".to_string(),
                reason: "unpaywall requires a contact email".to_string(),
            });
        }
        // fail early on unparseable exclusion ranges
        self.shibboleth.exclusion_nets()?;
        Ok(())
    }
}
