//! Segment base URL derivation.
//!
//! A manifest's segments are published in the same upstream directory as the
//! manifest itself. The base is the manifest URL with its last path component
//! (and any query or fragment) removed; it always ends with `/`.

use url::Url;

use crate::rewrite::{MANIFEST_SUFFIX, SEGMENT_SUFFIX};

/// Whether `upstream` points at an HLS manifest (its path ends in `.m3u8`).
pub fn is_manifest_url(upstream: &str) -> bool {
    Url::parse(upstream)
        .map(|url| url.path().ends_with(MANIFEST_SUFFIX))
        .unwrap_or(false)
}

/// Directory URL under which the manifest at `manifest_url` publishes its segments.
///
/// Returns `None` when `manifest_url` is not an absolute hierarchical URL.
pub fn segment_base(manifest_url: &str) -> Option<String> {
    let url = Url::parse(manifest_url).ok()?;
    let base = url.join("./").ok()?;
    Some(base.into())
}

/// Absolute URL of segment `index` under `base`.
///
/// Returns `None` when the joined URL leaves `base` (another scheme, host or
/// port, or a path outside the base directory) or picks up a query or fragment.
pub fn segment_url(base: &str, index: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let url = base.join(&format!("{index}{SEGMENT_SUFFIX}")).ok()?;

    let contained = url.scheme() == base.scheme()
        && url.host_str() == base.host_str()
        && url.port_or_known_default() == base.port_or_known_default()
        && url.path().starts_with(base.path())
        && url.query().is_none()
        && url.fragment().is_none();
    contained.then(|| url.into())
}
