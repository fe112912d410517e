//! Streaming relay for HLS segments.
//!
//! The upstream body is forwarded chunk by chunk and never buffered whole.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use tvp_core::Error;

use crate::context::AppContext;
use crate::error::AppError;

const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";
const SEGMENT_CACHE_CONTROL: &str = "public, max-age=86400";

/// GET /segment/{slug}/{index}.ts
pub async fn relay_segment(
    State(ctx): State<AppContext>,
    Path((slug, file)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let index = file
        .strip_suffix(tvp_hls::SEGMENT_SUFFIX)
        .ok_or_else(|| Error::not_found("segment", &file))?;

    if !super::is_segment_index(index) {
        return Err(Error::Validation(format!("invalid segment index: {index}")).into());
    }

    let base = ctx
        .segment_bases
        .lookup(&slug)
        .ok_or_else(|| Error::not_found("segment base", &slug))?;

    let url = tvp_hls::segment_url(&base, index)
        .ok_or_else(|| Error::Validation(format!("segment index escapes its base: {index}")))?;

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    tracing::debug!(slug = %slug, url = %url, range = ?range, "Relaying segment");
    let upstream = ctx.upstream.fetch_segment(&url, range).await?;

    let status = upstream.status();
    let upstream_headers = upstream.headers();

    let mut builder = Response::builder()
        .status(status)
        .header(
            header::CONTENT_TYPE,
            upstream_headers
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or(HeaderValue::from_static(SEGMENT_CONTENT_TYPE)),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, SEGMENT_CACHE_CONTROL);

    for name in [header::CONTENT_LENGTH, header::CONTENT_RANGE] {
        if let Some(value) = upstream_headers.get(&name) {
            builder = builder.header(name, value.clone());
        }
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| Error::Internal(format!("failed to build segment response: {e}")).into())
}
