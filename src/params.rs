//! OpenURL request parameters.
//!
//! Incoming citation lookups carry their identifiers as query parameters
//! (`id`, `issn`, `eissn`, `genre`, ...). Parameters are repeatable and
//! order matters downstream, so they are kept as an ordered multimap
//! rather than a plain map. Keys are matched case-insensitively.

use std::fmt;

/// Ordered multimap of OpenURL parameters.
///
/// Mutable only during normalization; the routing engine reads it but
/// never writes, except for the interlibrary-loan branch which works on
/// its own clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    pairs: Vec<(String, String)>,
}

impl IdentifierSet {
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parse from a raw query string, preserving repeats and order.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Append a key-value pair, keeping existing values for the key.
    pub fn append(&mut self, key: &str, value: &str) {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    /// Replace all values for a key with a single value. The new pair is
    /// appended at the end, matching the legacy wrapper's overwrite
    /// semantics for the interlibrary-loan parameters.
    pub fn set(&mut self, key: &str, value: &str) {
        self.pairs.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.pairs.push((key.to_string(), value.to_string()));
    }

    /// First value for a key, if any.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// All values for a key, in insertion order.
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as a query string: first pair prefixed with `?`, the rest
    /// joined with `&`, values percent-encoded. An empty set renders as
    /// the empty string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.pairs {
            out.push(if out.is_empty() { '?' } else { '&' });
            out.push_str(key);
            out.push('=');
            out.push_str(&urlencoding::encode(value));
        }
        out
    }

    /// Sanitize all values and complete the identifier set.
    ///
    /// Neutralizes header/log injection characters in every value and,
    /// when only an `eissn` is given, copies its first value down into
    /// `issn`: the print/online-holding routing keys exclusively on
    /// `issn`.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        for (_, value) in &mut self.pairs {
            *value = clean_value(value);
        }

        let eissn = self.first("eissn").unwrap_or_default().to_string();
        if !eissn.is_empty() {
            let issn_missing = self.first("issn").map_or(true, str::is_empty);
            if issn_missing {
                tracing::debug!("eissn given but issn is empty, copying eissn value to issn");
                self.append("issn", &eissn);
            }
        }
        self
    }
}

impl fmt::Display for IdentifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_string())
    }
}

/// Strip literal `{` and neutralize CR/LF (raw and percent-encoded)
/// before values are logged or forwarded to the linksolver.
fn clean_value(value: &str) -> String {
    value
        .replace('{', "")
        .replace("%0A", "+")
        .replace("%0D", "+")
        .replace('\n', "+")
        .replace('\r', "+")
}
