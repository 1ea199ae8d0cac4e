//! HTTP Range header parsing for single byte windows
//!
//! Only the single-range `bytes=<start>-[<end>]` form is accepted. Anything
//! that does not name a window fully inside the file is rejected instead of
//! being clamped, so callers answer 416 rather than serving a wrong window.

use super::StreamingError;

/// Inclusive byte window of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ByteRange {
    /// Number of bytes in the window.
    pub fn chunk_size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// Parses a `Range` header value against a file of `total_size` bytes.
///
/// An omitted end defaults to the last byte of the file.
///
/// # Examples
/// ```
/// use splice_core::streaming::parse_range_header;
///
/// let range = parse_range_header("bytes=100-199", 1000).unwrap();
/// assert_eq!((range.start, range.end, range.chunk_size()), (100, 199, 100));
///
/// let open = parse_range_header("bytes=500-", 1000).unwrap();
/// assert_eq!(open.end, 999);
/// ```
///
/// # Errors
/// - `StreamingError::RangeNotSatisfiable` - Header is malformed, reversed,
///   or extends past the end of the file
pub fn parse_range_header(value: &str, total_size: u64) -> Result<ByteRange, StreamingError> {
    let unsatisfiable = || StreamingError::RangeNotSatisfiable { total_size };

    let spec = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(unsatisfiable)?;
    let (start_str, end_str) = spec.split_once('-').ok_or_else(unsatisfiable)?;

    let start = parse_position(start_str).ok_or_else(unsatisfiable)?;
    let end = if end_str.trim().is_empty() {
        total_size.checked_sub(1).ok_or_else(unsatisfiable)?
    } else {
        parse_position(end_str).ok_or_else(unsatisfiable)?
    };

    if start > end || end >= total_size {
        return Err(unsatisfiable());
    }

    Ok(ByteRange {
        start,
        end,
        total_size,
    })
}

fn parse_position(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(value: &str, size: u64) -> bool {
        matches!(
            parse_range_header(value, size),
            Err(StreamingError::RangeNotSatisfiable { total_size }) if total_size == size
        )
    }

    #[test]
    fn test_parse_closed_range() {
        let range = parse_range_header("bytes=100-199", 1000).unwrap();
        assert_eq!(range.chunk_size(), 100);
        assert_eq!(range.content_range(), "bytes 100-199/1000");
    }

    #[test]
    fn test_parse_open_end_defaults_to_last_byte() {
        let range = parse_range_header("bytes=0-", 1000).unwrap();
        assert_eq!((range.start, range.end), (0, 999));
        assert_eq!(range.chunk_size(), 1000);
    }

    #[test]
    fn test_single_byte_windows() {
        let first = parse_range_header("bytes=0-0", 10).unwrap();
        assert_eq!(first.chunk_size(), 1);
        let last = parse_range_header("bytes=9-9", 10).unwrap();
        assert_eq!(last.content_range(), "bytes 9-9/10");
    }

    #[test]
    fn test_malformed_ranges_are_rejected() {
        assert!(rejected("bytes=abc-10", 100));
        assert!(rejected("bytes=10-abc", 100));
        assert!(rejected("bytes=-10", 100));
        assert!(rejected("bytes=+5-10", 100));
        assert!(rejected("items=0-10", 100));
        assert!(rejected("bytes=0-10,20-30", 100));
        assert!(rejected("bytes=10", 100));
    }

    #[test]
    fn test_out_of_bounds_ranges_are_rejected() {
        assert!(rejected("bytes=20-10", 100));
        assert!(rejected("bytes=0-100", 100));
        assert!(rejected("bytes=100-", 100));
        assert!(rejected("bytes=0-", 0));
    }
}
