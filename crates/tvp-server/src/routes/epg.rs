//! EPG trigger endpoints, scheduler status and generated file serving.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio_util::io::ReaderStream;
use tvp_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::scheduler::SchedulerStatus;

/// GET /{provider}/rebuild_epg
///
/// Discards the provider's generated data, then queues a refresh. Always
/// answers with the same text; failures only show up in the logs.
pub async fn rebuild_epg(
    State(ctx): State<AppContext>,
    Path(provider): Path<String>,
) -> &'static str {
    match ctx.schedulers.provider(&provider) {
        Some(p) => {
            if let Err(e) = p.rebuild_epg().await {
                tracing::error!(provider = %provider, error = %e, "EPG rebuild failed");
            }
        }
        None => {
            tracing::error!(provider = %provider, "Rebuild requested for unknown provider");
        }
    }

    // Unknown providers are already logged by the hub.
    let _ = ctx.schedulers.trigger_refresh(&provider);
    "Rebuilding EPG"
}

/// GET /{provider}/build_epg
pub async fn build_epg(
    State(ctx): State<AppContext>,
    Path(provider): Path<String>,
) -> &'static str {
    let _ = ctx.schedulers.trigger_refresh(&provider);
    "Manually Triggering EPG"
}

/// GET /schedulers
pub async fn scheduler_statuses(State(ctx): State<AppContext>) -> Json<Vec<SchedulerStatus>> {
    Json(ctx.schedulers.statuses())
}

const GENERATING: &str = "EPG is being generated, please try again shortly";
const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const FALLBACK_CACHE_CONTROL: &str = "public, max-age=3600";

/// GET /{provider}/{file}
///
/// Serves a generated guide file. `.xml` is served inline, `.gz` as a
/// download.
pub async fn serve_epg_file(
    State(ctx): State<AppContext>,
    Path((provider, file)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if !super::is_safe_component(&provider) || !super::is_safe_component(&file) {
        return Err(Error::Validation(format!("invalid file path: {provider}/{file}")).into());
    }

    let content_type = if file.ends_with(".xml") {
        XML_CONTENT_TYPE
    } else if file.ends_with(".gz") {
        "application/gzip"
    } else {
        return Err(Error::not_found("file", &file).into());
    };

    let path = ctx.data_dir().join(&provider).join(&file);
    let Some(handle) = open_guide(&path).await? else {
        return Ok((StatusCode::NOT_FOUND, GENERATING).into_response());
    };

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(ReaderStream::new(handle)),
    )
        .into_response();

    if file.ends_with(".gz") {
        let disposition = format!("attachment; filename=\"{file}\"");
        if let Ok(value) = disposition.parse() {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}

/// GET /epg.xml and /epg-{region}.xml
///
/// Top-level guide URLs for clients that take a single fixed EPG address.
/// They serve the default provider's files and may be cached for an hour.
pub async fn serve_default_epg(
    State(ctx): State<AppContext>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    if !is_fallback_guide(&file) {
        return Err(Error::not_found("file", &file).into());
    }
    let provider = ctx
        .config
        .fallback_provider()
        .ok_or_else(|| Error::not_found("default provider", &file))?;
    if !super::is_safe_component(provider) {
        return Err(Error::Validation(format!("invalid provider name: {provider}")).into());
    }

    let path = ctx.data_dir().join(provider).join(&file);
    let Some(handle) = open_guide(&path).await? else {
        return Ok((StatusCode::SERVICE_UNAVAILABLE, GENERATING).into_response());
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XML_CONTENT_TYPE),
            (header::CACHE_CONTROL, FALLBACK_CACHE_CONTROL),
        ],
        Body::from_stream(ReaderStream::new(handle)),
    )
        .into_response())
}

/// `epg.xml`, or `epg-{region}.xml` with a region of ASCII letters, digits,
/// `-` or `_`.
fn is_fallback_guide(file: &str) -> bool {
    if file == "epg.xml" {
        return true;
    }
    file.strip_prefix("epg-")
        .and_then(|rest| rest.strip_suffix(".xml"))
        .is_some_and(|region| {
            !region.is_empty()
                && region
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Open a generated guide, `None` while it has not been written yet.
async fn open_guide(path: &std::path::Path) -> Result<Option<tokio::fs::File>, AppError> {
    match tokio::fs::File::open(path).await {
        Ok(handle) => Ok(Some(handle)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "EPG file not generated yet");
            Ok(None)
        }
        Err(e) => Err(Error::from(e).into()),
    }
}
