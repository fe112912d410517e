//! Slug registration, stream redirects and the proxy index page.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tvp_core::Error;

use crate::context::AppContext;
use crate::error::AppError;

/// POST /register
///
/// Body is a JSON object mapping slug to upstream URL. The content type is
/// not checked.
pub async fn register(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let batch: HashMap<String, String> = serde_json::from_slice(&body)
        .map_err(|e| Error::Validation(format!("expected a JSON object of slug to URL: {e}")))?;

    let count = ctx.registry.register_batch(batch);
    tracing::info!(count, total = ctx.registry.len(), "Registered streams");
    Ok("OK")
}

/// GET /stream/{slug}
///
/// Redirects to the registered upstream URL. HLS targets also prime the
/// segment base cache so segment relaying works before the manifest is
/// fetched through `/hls`.
pub async fn stream_redirect(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let url = ctx
        .registry
        .lookup(&slug)
        .ok_or_else(|| Error::not_found("slug", &slug))?;

    if tvp_hls::is_manifest_url(&url) {
        ctx.segment_bases.resolve_and_cache_base(&slug, &url);
    }

    let location = HeaderValue::from_str(&url)
        .map_err(|_| Error::upstream(url.as_str(), "not a valid redirect target"))?;

    tracing::debug!(slug = %slug, url = %url, "Redirecting stream");
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// GET /proxy
///
/// HTML list of every registered slug.
pub async fn proxy_index(State(ctx): State<AppContext>) -> Html<String> {
    let entries = ctx.registry.snapshot();

    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Streams</title></head>\n<body>\n",
    );
    html.push_str(&format!("<h1>Streams ({})</h1>\n<ul>\n", entries.len()));
    for (slug, url) in &entries {
        let slug = escape_html(slug);
        html.push_str(&format!(
            "<li><a href=\"/stream/{slug}\">{slug}</a> <small>{}</small></li>\n",
            escape_html(url)
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    Html(html)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_special_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
        assert_eq!(escape_html("plain-slug"), "plain-slug");
    }
}
