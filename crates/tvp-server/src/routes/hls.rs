use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use tvp_core::Error;

use crate::context::AppContext;
use crate::error::AppError;

pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const MANIFEST_CACHE_CONTROL: &str = "public, max-age=300";

/// GET /hls/{slug}.m3u8
///
/// Fetches the slug's upstream manifest and rewrites it so that segments and
/// variants are requested through this proxy.
pub async fn hls_manifest(
    State(ctx): State<AppContext>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let slug = file
        .strip_suffix(tvp_hls::MANIFEST_SUFFIX)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::not_found("manifest", &file))?;

    let url = ctx
        .registry
        .lookup(slug)
        .ok_or_else(|| Error::not_found("slug", slug))?;

    let manifest = ctx.upstream.fetch_manifest(&url).await?;

    if ctx
        .segment_bases
        .resolve_and_cache_base(slug, &manifest.source_url)
        .is_none()
    {
        tracing::warn!(slug = %slug, url = %manifest.source_url, "Could not derive segment base");
    }

    let body = tvp_hls::rewrite_manifest(&manifest.text, slug);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, MANIFEST_CONTENT_TYPE),
            (header::CACHE_CONTROL, MANIFEST_CACHE_CONTROL),
        ],
        body,
    ))
}
