//! Ordered path segment parsing.
//!
//! Content trees order their entries with a numeric prefix on each storage
//! path segment, separated from the name by a dot or a dash:
//!
//! - `1.guide` → order 1, name `guide`
//! - `020-getting-started` → order 20, name `getting-started`
//!
//! The navigation builder uses the number as a sibling ordering hint and the
//! display title as the label of directory nodes that have no index
//! document. Dashes in the name become spaces in the display title.

/// Result of parsing one path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSegment {
    /// Numeric ordering prefix, if any.
    pub number: Option<u32>,
    /// Segment with the prefix removed. Empty for number-only segments.
    pub name: String,
    /// `name` with dashes turned into spaces.
    pub display_title: String,
}

pub fn parse_segment(segment: &str) -> ParsedSegment {
    if let Some(split) = segment.find(['.', '-'])
        && let Ok(number) = segment[..split].parse::<u32>()
    {
        return ParsedSegment::new(Some(number), &segment[split + 1..]);
    }
    if let Ok(number) = segment.parse::<u32>() {
        return ParsedSegment::new(Some(number), "");
    }
    ParsedSegment::new(None, segment)
}

impl ParsedSegment {
    fn new(number: Option<u32>, name: &str) -> Self {
        Self {
            number,
            name: name.to_string(),
            display_title: name.replace('-', " "),
        }
    }
}

/// Non-empty `/`-separated segments of a path or URL.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join segments back into an absolute URL (`/` for none).
pub fn join_url(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// True when `to` is `scope` itself or lies underneath it.
pub fn is_within(to: &str, scope: &str) -> bool {
    let scope = scope.trim_end_matches('/');
    scope.is_empty()
        || to == scope
        || to
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_prefixed_segment() {
        let p = parse_segment("1.guide");
        assert_eq!(p.number, Some(1));
        assert_eq!(p.name, "guide");
        assert_eq!(p.display_title, "guide");
    }

    #[test]
    fn dash_prefixed_multi_word() {
        let p = parse_segment("020-getting-started");
        assert_eq!(p.number, Some(20));
        assert_eq!(p.name, "getting-started");
        assert_eq!(p.display_title, "getting started");
    }

    #[test]
    fn number_only_segment() {
        let p = parse_segment("003");
        assert_eq!(p.number, Some(3));
        assert_eq!(p.name, "");
    }

    #[test]
    fn plain_segment_has_no_number() {
        let p = parse_segment("api-reference");
        assert_eq!(p.number, None);
        assert_eq!(p.name, "api-reference");
        assert_eq!(p.display_title, "api reference");
    }

    #[test]
    fn version_like_name_keeps_tail() {
        let p = parse_segment("2.v1.5");
        assert_eq!(p.number, Some(2));
        assert_eq!(p.name, "v1.5");
    }

    #[test]
    fn segments_skip_empty_parts() {
        assert_eq!(segments("/guide//setup/"), vec!["guide", "setup"]);
        assert!(segments("/").is_empty());
    }

    #[test]
    fn join_url_roots_at_slash() {
        assert_eq!(join_url(&["guide", "setup"]), "/guide/setup");
        assert_eq!(join_url(&[]), "/");
    }

    #[test]
    fn is_within_respects_segment_boundaries() {
        assert!(is_within("/guide", "/guide"));
        assert!(is_within("/guide/setup", "/guide/"));
        assert!(!is_within("/guides", "/guide"));
        assert!(is_within("/anything", "/"));
    }
}
