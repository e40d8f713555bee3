//! Match URL validation
//!
//! A run must abort before any network or LLM cost is incurred if the
//! target URL does not look like a live match centre page.

use url::Url;

/// Returns true only if `raw` matches
/// `https://<host>/matches/<numeric-id>/live/<slug>`.
pub fn validate_match_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };

    if url.scheme() != "https" || url.host_str().is_none() {
        return false;
    }

    let Some(segments) = url.path_segments() else {
        return false;
    };
    let segments: Vec<&str> = segments.collect();

    match segments.as_slice() {
        ["matches", id, "live", slug, ..] => {
            !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && !slug.is_empty()
        }
        _ => false,
    }
}
