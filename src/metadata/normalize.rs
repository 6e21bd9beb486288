use crate::errors::ResolveError;
use url::Url;

const TRACKING_PARAMS: [&str; 10] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "mc_cid",
    "mc_eid",
];

/// Resolve a reference found in a document (or manifest) against `base`.
///
/// Handles absolute, protocol-relative (`//host/x`), root-relative (`/x`)
/// and document-relative (`x`, `../x`, `?q`, `#f`) references:
/// - root-relative references resolve against the origin of `base`, its path
///   and query are ignored
/// - the reference's own query is kept as is
/// - an absolute reference is returned unchanged
///
/// Blank references are rejected rather than resolving to `base` itself.
pub fn resolve_url(reference: &str, base: &Url) -> Result<Url, ResolveError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ResolveError::Empty);
    }

    base.join(reference)
        .map_err(|source| ResolveError::InvalidReference {
            reference: reference.to_string(),
            source,
        })
}

/// Strip known tracking query parameters (utm_*, fbclid, gclid, ref, mc_*)
/// and the fragment. Used on manifest start URLs, which are routinely
/// decorated with `utm_source=homescreen`.
pub fn strip_tracking_params(url: &Url) -> Url {
    let mut parsed = url.clone();
    parsed.set_fragment(None);

    if parsed.query().is_none() {
        return parsed;
    }

    let filtered_params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    parsed.set_query(None);
    if !filtered_params.is_empty() {
        parsed.query_pairs_mut().extend_pairs(filtered_params);
    }

    parsed
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
