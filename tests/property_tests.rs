//! Property-based tests for the pure parts of the pipeline.

use openurl_gateway::client::is_doi;
use openurl_gateway::routing::classify;
use openurl_gateway::IdentifierSet;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalized_values_carry_no_injection_characters(value in ".*") {
        let mut params = IdentifierSet::new();
        params.append("title", &value);
        let normalized = params.normalize();
        let cleaned = normalized.first("title").unwrap();
        prop_assert!(!cleaned.contains('{'), "cleaned value contains an open brace");
        prop_assert!(!cleaned.contains('\n'));
        prop_assert!(!cleaned.contains('\r'));
        prop_assert!(!cleaned.contains("%0A"));
        prop_assert!(!cleaned.contains("%0D"));
    }

    #[test]
    // keys avoid issn/eissn: the copy-down rule is exercised separately
    fn normalization_is_idempotent(query in "[a-df-hj-z]{1,8}=[ -~]{0,20}(&[a-df-hj-z]{1,8}=[ -~]{0,20}){0,4}") {
        let once = IdentifierSet::from_query(&query).normalize();
        let twice = once.clone().normalize();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn query_string_render_parse_round_trips(
        pairs in proptest::collection::vec(("[a-z]{1,10}", "[ -~]{0,30}"), 0..6)
    ) {
        let mut params = IdentifierSet::new();
        for (key, value) in &pairs {
            params.append(key, value);
        }
        let rendered = params.to_query_string();
        let reparsed = IdentifierSet::from_query(rendered.trim_start_matches('?'));
        prop_assert_eq!(params, reparsed);
    }

    #[test]
    fn doi_detection_accepts_the_modern_form(
        prefix in "[0-9]{4,9}",
        suffix in "[-._;()/:A-Za-z0-9]{1,30}"
    ) {
        let candidate = format!("doi:10.{prefix}/{suffix}");
        prop_assert!(is_doi(&candidate));
    }

    #[test]
    fn doi_detection_never_panics(value in ".*") {
        let _ = is_doi(&value);
    }

    #[test]
    fn classification_is_total_and_deterministic(label in ".*") {
        prop_assert_eq!(classify(&label), classify(&label));
    }
}
