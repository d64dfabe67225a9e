//! Correlation-key computation for request matching

/// Outbound HTTP request as seen by the interception layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method (e.g., "GET", "POST")
    pub method: String,
    /// Full request URI, absolute or origin-form
    pub uri: String,
    /// Headers in wire order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Vec<u8>,
}

/// Pluggable strategy computing a correlation key from a request.
///
/// Implementations must be pure: the same method/URI/headers/body must
/// always produce the same key, and fields that vary between otherwise
/// identical requests (timestamps, correlation IDs) must not influence it.
pub trait Matcher: Send + Sync {
    /// Compute the correlation key for `request`
    fn key(&self, request: &HttpRequest) -> String;
}

/// Default matcher: uppercased method plus normalized URI.
///
/// Headers are ignored entirely, so volatile values like `Date` or
/// `x-ms-client-request-id` never break correlation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMatcher;

impl Matcher for DefaultMatcher {
    fn key(&self, request: &HttpRequest) -> String {
        format!(
            "{} {}",
            request.method.to_uppercase(),
            normalize_uri(&request.uri)
        )
    }
}

/// Normalize a URI for correlation
///
/// Lowercases the scheme and authority, drops any fragment, sorts query
/// parameters, and guarantees a leading slash for origin-form URIs. The
/// path keeps its case: many APIs treat path segments case-sensitively.
fn normalize_uri(uri: &str) -> String {
    let trimmed = uri.trim();

    // Fragments never reach the server
    let without_fragment = match trimmed.split_once('#') {
        Some((before, _)) => before,
        None => trimmed,
    };

    let (base, query) = match without_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_fragment, None),
    };

    let mut normalized = normalize_base(base);

    if let Some(query) = query {
        let sorted = sort_query(query);
        if !sorted.is_empty() {
            normalized.push('?');
            normalized.push_str(&sorted);
        }
    }

    normalized
}

/// Lowercase scheme and authority of an absolute URI; ensure a leading
/// slash on an origin-form one
fn normalize_base(base: &str) -> String {
    if let Some(scheme_end) = base.find("://") {
        let authority_start = scheme_end + 3;
        let path_start = base[authority_start..]
            .find('/')
            .map_or(base.len(), |i| authority_start + i);

        let mut normalized = base[..path_start].to_lowercase();
        normalized.push_str(&base[path_start..]);
        normalized
    } else if base.is_empty() || !base.starts_with('/') {
        format!("/{base}")
    } else {
        base.to_string()
    }
}

/// Sort query parameters, preserving each pair's exact text
fn sort_query(query: &str) -> String {
    let mut pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    pairs.sort_unstable();
    pairs.join("&")
}
