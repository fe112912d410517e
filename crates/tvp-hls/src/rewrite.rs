//! HLS manifest rewriting.
//!
//! Upstream manifests reference segments and nested variant playlists with
//! paths relative to (or absolute on) the upstream CDN. [`rewrite_manifest`]
//! replaces those references with proxy-local paths so that every follow-up
//! fetch a player makes goes through the proxy:
//!
//! - `*.ts` lines become `/segment/{slug}/{stem}.ts`
//! - `*.m3u8` lines become `/stream/{stem}`
//!
//! Tag lines, blank lines and anything unrecognized are forwarded as-is.

/// Suffix identifying a media segment reference.
pub const SEGMENT_SUFFIX: &str = ".ts";

/// Suffix identifying a (variant) manifest reference.
pub const MANIFEST_SUFFIX: &str = ".m3u8";

/// Classification of a single manifest line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Segment reference; carries the filename stem.
    Segment(&'a str),
    /// Variant playlist reference; carries the filename stem.
    Variant(&'a str),
    /// Tag, comment, blank or unrecognized line.
    Verbatim,
}

fn classify(line: &str) -> Line<'_> {
    if line.starts_with('#') || line.trim().is_empty() {
        Line::Verbatim
    } else if line.ends_with(SEGMENT_SUFFIX) {
        Line::Segment(stem(line))
    } else if line.ends_with(MANIFEST_SUFFIX) {
        Line::Variant(stem(line))
    } else {
        Line::Verbatim
    }
}

/// Filename portion after the last `/`, cut at its first `.`.
fn stem(line: &str) -> &str {
    let file = line.rsplit('/').next().unwrap_or(line);
    file.split('.').next().unwrap_or(file)
}

/// Rewrite an upstream manifest so its references point at the proxy.
///
/// Lines are split on `\n`; a trailing `\r` is kept so CRLF manifests come
/// back with CRLF endings. The function is pure: the same input always
/// yields the same output.
pub fn rewrite_manifest(manifest: &str, slug: &str) -> String {
    let mut out = String::with_capacity(manifest.len());

    for (i, raw) in manifest.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }

        let (line, cr) = match raw.strip_suffix('\r') {
            Some(line) => (line, "\r"),
            None => (raw, ""),
        };

        match classify(line) {
            Line::Segment(stem) => {
                out.push_str(&format!("/segment/{slug}/{stem}{SEGMENT_SUFFIX}"));
                out.push_str(cr);
            }
            Line::Variant(stem) => {
                out.push_str(&format!("/stream/{stem}"));
                out.push_str(cr);
            }
            Line::Verbatim => out.push_str(raw),
        }
    }

    out
}
