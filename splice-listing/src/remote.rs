//! Best-effort segment discovery from HTML directory indexes.
//!
//! Generic file servers render a directory as a page of anchors. The parser
//! keeps anchors pointing at playable files and orders them by the same
//! segment key the local scanner uses. Pages with no usable anchors produce
//! the conventional `segment1.mp4` … `segment5.mp4` names instead, marked as
//! a fallback so callers can tell the difference.

use regex::Regex;
use splice_core::media::{MediaExtension, sort_by_segment_key};
use url::Url;

use crate::errors::ListingParseExhausted;

/// Names substituted when a listing yields no playable links.
pub const FALLBACK_SEGMENT_NAMES: [&str; 5] = [
    "segment1.mp4",
    "segment2.mp4",
    "segment3.mp4",
    "segment4.mp4",
    "segment5.mp4",
];

// Quoted or bare href attribute on an anchor tag
const HREF_PATTERN: &str = r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#;

/// How a segment list was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOrigin {
    /// Segments were discovered from real entries.
    Parsed,
    /// Nothing was discovered; conventional names were substituted.
    Fallback(ListingParseExhausted),
}

/// Ordered absolute segment URLs plus their provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentListing {
    /// Segments in playback order
    pub segments: Vec<Url>,
    /// Whether the segments were discovered or substituted
    pub origin: ListingOrigin,
}

impl SegmentListing {
    /// Listing built from discovered entries.
    pub fn parsed(segments: Vec<Url>) -> Self {
        Self {
            segments,
            origin: ListingOrigin::Parsed,
        }
    }

    /// True when the conventional fallback names were substituted.
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, ListingOrigin::Fallback(_))
    }

    /// Consumes the listing, returning the segment URLs.
    pub fn into_segments(self) -> Vec<Url> {
        self.segments
    }
}

/// Extracts playable segment URLs from a directory index page.
///
/// Relative, root-relative, and absolute anchors are resolved against
/// `base_url`, which is treated as a directory. Repeated targets keep their
/// first position before the stable segment-key sort.
///
/// # Examples
/// ```
/// use splice_listing::parse_listing;
/// use url::Url;
///
/// let base = Url::parse("http://files.local/show/").unwrap();
/// let html = r#"<a href="part10.mp4">10</a><a href="part2.mp4">2</a>"#;
///
/// let listing = parse_listing(html, &base);
/// assert!(!listing.is_fallback());
/// assert_eq!(listing.segments[0].as_str(), "http://files.local/show/part2.mp4");
/// ```
pub fn parse_listing(html: &str, base_url: &Url) -> SegmentListing {
    let base = directory_base(base_url);
    let mut found: Vec<(String, Url)> = Vec::new();

    if let Ok(pattern) = Regex::new(HREF_PATTERN) {
        for captures in pattern.captures_iter(html) {
            let Some(raw) = captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))
            else {
                continue;
            };

            let target = unescape_html(raw.as_str().trim());
            let Some(name) = segment_file_name(&target) else {
                continue;
            };
            let Ok(url) = base.join(&target) else {
                tracing::debug!("Skipping unresolvable listing link: {target}");
                continue;
            };

            if found.iter().any(|(_, seen)| *seen == url) {
                continue;
            }
            found.push((name, url));
        }
    }

    if found.is_empty() {
        tracing::warn!(
            "{} at {}; substituting {} conventional segment names",
            ListingParseExhausted,
            base,
            FALLBACK_SEGMENT_NAMES.len()
        );
        return SegmentListing {
            segments: FALLBACK_SEGMENT_NAMES
                .iter()
                .filter_map(|name| base.join(name).ok())
                .collect(),
            origin: ListingOrigin::Fallback(ListingParseExhausted),
        };
    }

    sort_by_segment_key(&mut found, |(name, _)| name.as_str());
    tracing::debug!("Parsed {} segments from listing at {}", found.len(), base);

    SegmentListing::parsed(found.into_iter().map(|(_, url)| url).collect())
}

/// Ensures the base URL ends with `/` so joins land inside it.
fn directory_base(base_url: &Url) -> Url {
    let mut base = base_url.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Decoded file name of a link target when it names a playable file.
fn segment_file_name(target: &str) -> Option<String> {
    let path = target.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    if last.is_empty() {
        return None;
    }

    let name = urlencoding::decode(last).ok()?.into_owned();
    MediaExtension::from_file_name(&name)?;
    Some(name)
}

fn unescape_html(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
