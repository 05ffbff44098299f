//! Routing decision engine.
//!
//! Given a normalized identifier set, decides the single redirect target
//! for the request. The stages run strictly in order because each one can
//! short-circuit or parameterize the next: DOI resolution, open-access
//! lookup, linksolver query, category dispatch, WAYFless rewriting.

use super::classifier::{classify, AccessCategory};
use crate::client::{is_doi, strip_doi_prefix, DoiResolver, LinksolverClient, OpenAccessLookup};
use crate::config::RoutingTargets;
use crate::params::IdentifierSet;
use crate::shibboleth::WayflessBuilder;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Where the authoritative link of a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Doi,
    Linksolver,
    Fallback,
}

/// A link produced during resolution. The last one written before the
/// terminal decision is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub source: SourceKind,
    pub url: String,
    pub category: AccessCategory,
}

/// The engine's single, terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub redirect_url: String,
}

impl RoutingOutcome {
    fn to(url: impl Into<String>) -> Self {
        Self {
            redirect_url: url.into(),
        }
    }
}

/// Caller attribution threaded through the engine for order-form URLs
/// and the WAYFless exclusion check.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Referrer host, percent-encoded; `linksolver` when absent
    pub referer: String,
    /// Trusted client IP of the caller
    pub remote_address: String,
}

pub struct RoutingEngine {
    doi_resolver: Arc<dyn DoiResolver>,
    open_access: Arc<dyn OpenAccessLookup>,
    linksolver: Arc<dyn LinksolverClient>,
    wayfless: Arc<WayflessBuilder>,
    targets: RoutingTargets,
}

impl RoutingEngine {
    pub fn new(
        doi_resolver: Arc<dyn DoiResolver>,
        open_access: Arc<dyn OpenAccessLookup>,
        linksolver: Arc<dyn LinksolverClient>,
        wayfless: Arc<WayflessBuilder>,
        targets: RoutingTargets,
    ) -> Self {
        Self {
            doi_resolver,
            open_access,
            linksolver,
            wayfless,
            targets,
        }
    }

    /// Resolve one request to its redirect target. Never fails: every
    /// degradation path ends in a usable URL, worst case the linksolver's
    /// own UI.
    pub async fn resolve(&self, params: &IdentifierSet, ctx: &RequestContext) -> RoutingOutcome {
        // check for DOIs among the id values; the last match wins
        let mut doi = String::new();
        let mut doi_link: Option<ResolvedLink> = None;
        for id in params.values("id") {
            if is_doi(id) {
                debug!("{} identified as doi", id);
                doi = strip_doi_prefix(id);
                let url = self.doi_resolver.resolve(&doi).await;
                debug!("retrieved link from DOI: {}", url);
                if !url.is_empty() {
                    doi_link = Some(ResolvedLink {
                        source: SourceKind::Doi,
                        url,
                        category: AccessCategory::Unknown,
                    });
                }
            }
        }

        // a resolved DOI enables the open-access short-circuit: a free
        // copy is served directly, no WAYFless rewriting needed
        if let Some(link) = &doi_link {
            debug!("querying unpaywall for OA status");
            let host = host_of(&link.url);
            if let Some(free_url) = self.open_access.lookup(&doi, &host).await {
                info!(
                    "OA: true, status: 'Volltext', remote: {}, referer: {}",
                    ctx.remote_address, ctx.referer
                );
                return RoutingOutcome::to(free_url);
            }
        }

        let query_url = self.linksolver.query_url(params);
        let anchors = match self.linksolver.query(params).await {
            Ok(anchors) => anchors,
            Err(e) => {
                // sole degradation path: fall back to the DOI-resolved
                // URL, else send the user to the linksolver UI
                warn!("linksolver query failed: {}", e);
                let fallback = doi_link.map_or_else(
                    || ResolvedLink {
                        source: SourceKind::Fallback,
                        url: query_url,
                        category: AccessCategory::Unknown,
                    },
                    |link| link,
                );
                info!(
                    "OA: false, status: 'Linksolver nicht erreichbar', remote: {}, referer: {}",
                    ctx.remote_address, ctx.referer
                );
                return RoutingOutcome::to(fallback.url);
            }
        };
        debug!("linksolver returned {} options", anchors.len());

        // act on the first anchor with a known category; the linksolver
        // lists the best option first
        for anchor in &anchors {
            let category = classify(&anchor.label);
            debug!("linksolver returned option {}", anchor.label);
            match category {
                AccessCategory::FullText => {
                    return self
                        .full_text_outcome(&anchor.href, doi_link.as_ref(), ctx)
                        .await;
                }
                AccessCategory::ElsevierOrderForm => {
                    debug!("no fulltext available and elsevier journal, redirecting to order page");
                    return self.order_form_outcome(&doi, ctx);
                }
                AccessCategory::PrintOrOnlineHolding => {
                    return self.holding_outcome(params, &query_url, ctx);
                }
                AccessCategory::InterlibraryLoan => {
                    return self.interlibrary_loan_outcome(params, doi_link.as_ref(), &doi, ctx);
                }
                AccessCategory::Unknown => {}
            }
        }

        // nothing matched the vocabulary: back to the linksolver UI
        info!(
            "OA: false, status: 'Link-Name unbekannt', remote: {}, referer: {}",
            ctx.remote_address, ctx.referer
        );
        RoutingOutcome::to(query_url)
    }

    /// Full text is online: follow the anchor one redirect hop, prefer
    /// the DOI-resolved URL for WAYFless rewriting, redirect.
    async fn full_text_outcome(
        &self,
        href: &str,
        doi_link: Option<&ResolvedLink>,
        ctx: &RequestContext,
    ) -> RoutingOutcome {
        let url_from_linksolver = self.linksolver.follow(href).await;
        debug!("retrieved link from linksolver: {}", url_from_linksolver);

        let link = doi_link.map_or_else(
            || ResolvedLink {
                source: SourceKind::Linksolver,
                url: url_from_linksolver.clone(),
                category: AccessCategory::FullText,
            },
            |link| ResolvedLink {
                category: AccessCategory::FullText,
                ..link.clone()
            },
        );
        let url = self
            .wayfless
            .construct_wayfless_url(&link.url, &ctx.remote_address);
        info!(
            "OA: false, status: 'Volltext', remote: {}, referer: {}",
            ctx.remote_address, ctx.referer
        );
        RoutingOutcome::to(url)
    }

    /// Elsevier journal without full text: the institution's order form,
    /// parameterized with the DOI and the caller's referrer.
    fn order_form_outcome(&self, doi: &str, ctx: &RequestContext) -> RoutingOutcome {
        info!(
            "OA: false, status: 'Elsevier-Bestellseite', remote: {}, referer: {}",
            ctx.remote_address, ctx.referer
        );
        RoutingOutcome::to(format!(
            "{}?doi={}&source={}",
            self.targets.order_form_url, doi, ctx.referer
        ))
    }

    /// Print or online holding without a resource URL: the journals
    /// online-and-print page when an ISSN is available, else back to the
    /// linksolver UI for manual selection.
    fn holding_outcome(
        &self,
        params: &IdentifierSet,
        query_url: &str,
        ctx: &RequestContext,
    ) -> RoutingOutcome {
        debug!("printed or online access without resource url");
        let mut issn = params.first("issn").unwrap_or_default().trim().to_string();
        if issn.is_empty() {
            issn = params.first("eissn").unwrap_or_default().trim().to_string();
        }
        if issn.is_empty() {
            info!(
                "OA: false, status: 'Linksolver (no ISSN)', remote: {}, referer: {}",
                ctx.remote_address, ctx.referer
            );
            return RoutingOutcome::to(query_url);
        }

        // the journals online/print api wants the hyphenated form
        if !issn.contains('-') && issn.len() == 8 {
            issn.insert(4, '-');
        }

        let mut jop_params = IdentifierSet::new();
        jop_params.append("sid", &self.targets.jop_sid);
        jop_params.append("pid", &self.targets.jop_pid);
        jop_params.append("genre", "journal");
        jop_params.append("issn", &issn);
        info!(
            "OA: false, status: 'JOP-Seite', remote: {}, referer: {}",
            ctx.remote_address, ctx.referer
        );
        RoutingOutcome::to(format!(
            "{}{}",
            self.targets.jop_url,
            jop_params.to_query_string()
        ))
    }

    /// Only interlibrary loan remains. Large publishers refuse loan
    /// requests for their own content, so their DOI-resolved URLs divert
    /// to the order form instead.
    fn interlibrary_loan_outcome(
        &self,
        params: &IdentifierSet,
        doi_link: Option<&ResolvedLink>,
        doi: &str,
        ctx: &RequestContext,
    ) -> RoutingOutcome {
        let doi_url = doi_link.map(|link| link.url.as_str()).unwrap_or_default();
        if doi_url.contains("sciencedirect") || doi_url.contains("elsevier") {
            debug!("no fulltext available and elsevier journal, redirecting to order page");
            return self.order_form_outcome(doi, ctx);
        }

        debug!("no fulltext available, redirecting to interlibrary loan page");
        let mut loan_params = params.clone();
        loan_params.set("sid", &self.targets.ill_sid);
        loan_params.set("pid", &self.targets.ill_pid);
        loan_params.set("genre", "journal");
        info!(
            "OA: false, status: 'Fernleihe', remote: {}, referer: {}",
            ctx.remote_address, ctx.referer
        );
        RoutingOutcome::to(format!(
            "{}{}",
            self.targets.ill_url,
            loan_params.to_query_string()
        ))
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(ToString::to_string))
        .unwrap_or_default()
}
