pub mod doi;
pub mod linksolver;
pub mod redirect;
pub mod unpaywall;

pub use doi::{is_doi, strip_doi_prefix, DoiResolver, HttpDoiResolver};
pub use linksolver::{AnchorLink, HttpLinksolverClient, LinksolverClient};
pub use redirect::link_from_redirect;
pub use unpaywall::{OpenAccessLookup, UnpaywallClient};

use crate::Result;
use std::time::Duration;

/// User agent sent on all outbound requests
pub(crate) const USER_AGENT: &str =
    concat!("openurl-gateway/", env!("CARGO_PKG_VERSION"), " (Library Link Resolver)");

/// Build a client that reports redirects instead of following them, so
/// the `Location` header can be read as data.
pub(crate) fn no_redirect_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Build a plain client for JSON collaborator APIs.
pub(crate) fn json_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
