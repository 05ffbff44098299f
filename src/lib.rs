pub mod client;
pub mod config;
pub mod error;
pub mod params;
pub mod routing;
pub mod server;
pub mod shibboleth;

pub use client::{HttpDoiResolver, HttpLinksolverClient, UnpaywallClient};
pub use config::Config;
pub use error::{Error, Result};
pub use params::IdentifierSet;
pub use routing::{AccessCategory, RequestContext, RoutingEngine, RoutingOutcome};
pub use server::AppState;
pub use shibboleth::{FederationEndpoint, FederationStore, InMemoryFederationStore, WayflessBuilder};
