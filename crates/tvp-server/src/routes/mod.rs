//! Route handlers for the HTTP surface.

pub mod epg;
pub mod health;
pub mod hls;
pub mod proxy;
pub mod segment;

/// Reject a path component that could escape its directory.
pub(crate) fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.starts_with('.')
}

/// Segment indexes are plain path segments: no scheme, query, fragment or
/// percent escapes on top of the directory checks.
pub(crate) fn is_segment_index(index: &str) -> bool {
    is_safe_component(index) && !index.contains([':', '?', '#', '%'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_components() {
        assert!(is_safe_component("42"));
        assert!(is_safe_component("epg.xml"));
        assert!(!is_safe_component(""));
        assert!(!is_safe_component("../etc"));
        assert!(!is_safe_component("a/b"));
        assert!(!is_safe_component("a\\b"));
        assert!(!is_safe_component(".hidden"));
    }

    #[test]
    fn segment_indexes() {
        assert!(is_segment_index("000123"));
        assert!(is_segment_index("seg-7_hd"));
        assert!(!is_segment_index("https:attacker.example#"));
        assert!(!is_segment_index("http:127.0.0.1:9000"));
        assert!(!is_segment_index("1?token=a"));
        assert!(!is_segment_index("1#frag"));
        assert!(!is_segment_index("%2e%2e"));
        assert!(!is_segment_index("../1"));
    }
}
