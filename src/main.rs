use anyhow::Context;
use clap::Parser;
use openurl_gateway::client::{HttpDoiResolver, HttpLinksolverClient, UnpaywallClient};
use openurl_gateway::config::Config;
use openurl_gateway::routing::RoutingEngine;
use openurl_gateway::server::{serve, AppState};
use openurl_gateway::shibboleth::{InMemoryFederationStore, WayflessBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// OpenURL link-resolver gateway
#[derive(Debug, Parser)]
#[command(name = "openurl-gateway", version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config =
        Config::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let store = match &config.shibboleth.endpoints_file {
        Some(path) => InMemoryFederationStore::load(path)
            .with_context(|| format!("failed to load federation endpoints from {}", path.display()))?,
        None => {
            info!("no federation endpoints file configured, WAYFless rewriting is a no-op");
            InMemoryFederationStore::default()
        }
    };

    let wayfless = Arc::new(WayflessBuilder::new(
        Arc::new(store),
        &config.shibboleth.idp_url,
        &config.shibboleth.entity_id,
        config.shibboleth.exclusion_nets()?,
    ));

    let engine = RoutingEngine::new(
        Arc::new(HttpDoiResolver::new(
            &config.doi.resolver_url,
            config.doi.timeout(),
        )?),
        Arc::new(UnpaywallClient::new(
            &config.unpaywall.url,
            &config.unpaywall.email,
            config.unpaywall.timeout(),
        )?),
        Arc::new(HttpLinksolverClient::new(
            &config.linksolver.url,
            config.linksolver.timeout(),
        )?),
        Arc::clone(&wayfless),
        config.routing.clone(),
    );

    let state = Arc::new(AppState { engine, wayfless });
    serve(&config, state).await.context("server error")?;
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("openurl_gateway={default_level},tower_http=info")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
