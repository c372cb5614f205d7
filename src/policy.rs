//! URL admission policy: pure functions, no state, no error paths.
//! Malformed URLs parse to empty components and safely fail the checks.

use crate::types::Domain;
use url::Url;

/// Query keys starting with any of these are tracking noise and dropped
/// during normalization.
pub const TRACKING_QUERY_PREFIXES: [&str; 3] = ["utm_", "gclid", "fbclid"];

/// Canonicalize a URL: drop the fragment, drop tracking query keys,
/// re-encode the remaining pairs sorted by key. Idempotent.
pub fn normalize_url(url: &str) -> String {
    let mut parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return url.to_string(),
    };

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_QUERY_PREFIXES.iter().any(|p| k.starts_with(p)))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    parsed.set_fragment(None);
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let mut serializer = parsed.query_pairs_mut();
        serializer.clear();
        serializer.extend_pairs(pairs);
    }
    parsed.to_string()
}

/// True iff host + port of both URLs match exactly.
pub fn same_origin(base_url: &str, candidate_url: &str) -> bool {
    netloc(base_url) == netloc(candidate_url)
}

/// True iff the candidate host contains any denylisted substring,
/// case-insensitively.
pub fn is_denied_domain(candidate_url: &str, denied_domains: &[String]) -> bool {
    let host = match Url::parse(candidate_url) {
        Ok(u) => Domain::from_url(&u).map(|d| d.0).unwrap_or_default(),
        Err(_) => String::new(),
    };
    denied_domains
        .iter()
        .any(|d| host.contains(&d.to_ascii_lowercase()))
}

fn netloc(url: &str) -> String {
    match Url::parse(url) {
        Ok(u) => match u.host_str() {
            Some(host) => match u.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            },
            None => String::new(),
        },
        Err(_) => String::new(),
    }
}
