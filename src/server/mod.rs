//! HTTP surface of the gateway.
//!
//! `GET /resolve` takes the OpenURL parameters and answers with a
//! redirect to the computed access point; `GET /useShibboleth` rewrites a
//! single target URL; `GET /health` is a container liveness probe.

use crate::config::Config;
use crate::params::IdentifierSet;
use crate::routing::{RequestContext, RoutingEngine};
use crate::shibboleth::WayflessBuilder;
use crate::Result;
use axum::extract::{ConnectInfo, Query, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use url::Url;

/// Shared per-process state; everything in here is read-only at request
/// time.
pub struct AppState {
    pub engine: RoutingEngine,
    pub wayfless: Arc<WayflessBuilder>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/resolve", get(resolve))
        .route("/useShibboleth", get(use_shibboleth))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &Config, state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("openurl gateway listening on {}", addr);
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Resolve an OpenURL citation lookup to its redirect target.
async fn resolve(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let params = IdentifierSet::from_query(query.as_deref().unwrap_or_default()).normalize();
    let ctx = RequestContext {
        referer: referer_from(&headers),
        remote_address: remote_address_from(&headers, peer),
    };
    debug!("call from {}", ctx.remote_address);

    let outcome = state.engine.resolve(&params, &ctx).await;
    redirect(&outcome.redirect_url)
}

#[derive(Debug, Deserialize)]
struct ShibbolethQuery {
    target: String,
}

/// Rewrite a single target URL into its WAYFless form and redirect,
/// using the connection's peer address for the exclusion check.
async fn use_shibboleth(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShibbolethQuery>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let url = state
        .wayfless
        .construct_wayfless_url(&query.target, &peer.ip().to_string());
    redirect(&url)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn redirect(url: &str) -> Response {
    match header::HeaderValue::from_str(url) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            warn!("redirect target is not a valid header value: {}", url);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Referrer host for source attribution, percent-encoded. Falls back to
/// the raw header when the referrer does not parse as a URL, and to
/// `linksolver` when the header is absent or empty.
fn referer_from(headers: &HeaderMap) -> String {
    let raw = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if raw.is_empty() {
        return "linksolver".to_string();
    }
    debug!("referer request header: {}", raw);
    match Url::parse(raw).ok().and_then(|url| {
        url.host_str().map(|host| urlencoding::encode(host).into_owned())
    }) {
        Some(host) => host,
        None => {
            warn!("could not parse host from referer header");
            raw.to_string()
        }
    }
}

/// Trusted proxy-supplied client IP, else the connection's peer address.
fn remote_address_from(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("remoteAddress")
        .and_then(|value| value.to_str().ok())
        .map_or_else(|| peer.ip().to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.7:55000".parse().unwrap()
    }

    #[test]
    fn test_referer_reduced_to_encoded_host() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://katalog.ub.example.org/search?q=x"),
        );
        assert_eq!(referer_from(&headers), "katalog.ub.example.org");
    }

    #[test]
    fn test_referer_defaults_to_linksolver() {
        assert_eq!(referer_from(&HeaderMap::new()), "linksolver");
    }

    #[test]
    fn test_unparseable_referer_kept_raw() {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static("no scheme here"));
        assert_eq!(referer_from(&headers), "no scheme here");
    }

    #[test]
    fn test_remote_address_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("remoteAddress", HeaderValue::from_static("203.0.113.77"));
        assert_eq!(remote_address_from(&headers, peer()), "203.0.113.77");
    }

    #[test]
    fn test_remote_address_falls_back_to_peer() {
        assert_eq!(remote_address_from(&HeaderMap::new(), peer()), "192.0.2.7");
    }
}
