//! tvp-hls: textual HLS helpers for the stream proxy.
//!
//! Nothing in this crate touches the network.
//!
//! # Modules
//!
//! - [`rewrite`] - Rewrites upstream manifests so segment and variant fetches flow through the proxy
//! - [`base`] - Derives the segment directory of a manifest and resolves segment URLs against it

pub mod base;
pub mod rewrite;

pub use base::{is_manifest_url, segment_base, segment_url};
pub use rewrite::{rewrite_manifest, MANIFEST_SUFFIX, SEGMENT_SUFFIX};
