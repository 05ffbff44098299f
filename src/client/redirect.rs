//! Raw redirect-hop inspection.
//!
//! Both the DOI registry and the linksolver answer with an HTTP redirect
//! whose `Location` header carries the resource URL. The client passed in
//! here must have redirect following disabled; the header is read as data
//! instead of being chased.

use reqwest::{Client, StatusCode};
use tracing::debug;

/// Request `link` and return the `Location` header if the response is a
/// redirect. On any other status, and on any transport failure, the
/// original link is returned so the caller always has a usable URL.
pub async fn link_from_redirect(client: &Client, link: &str) -> String {
    let response = match client.get(link).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("request to {} failed ({}), keeping original link", link, e);
            return link.to_string();
        }
    };

    match response.status() {
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map_or_else(|| link.to_string(), ToString::to_string),
        status => {
            debug!("no redirect from {} (status {}), keeping original link", link, status);
            link.to_string()
        }
    }
}
