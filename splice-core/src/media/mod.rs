//! Media file model shared by the scanner, the range server, and listing
//! providers.

pub mod scanner;

use std::path::Path;

use serde::Serialize;

pub use scanner::{MediaDirectory, ScanError, list_media_files};

/// Fallback MIME type for extensions outside the media allow-list.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Container formats eligible for segment playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaExtension {
    Mp4,
    Webm,
    Ogg,
    Mov,
    Avi,
}

impl MediaExtension {
    /// Every allowed extension, in allow-list order.
    pub const ALL: [MediaExtension; 5] = [
        MediaExtension::Mp4,
        MediaExtension::Webm,
        MediaExtension::Ogg,
        MediaExtension::Mov,
        MediaExtension::Avi,
    ];

    /// Matches an extension (without the dot) case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "ogg" => Some(Self::Ogg),
            "mov" => Some(Self::Mov),
            "avi" => Some(Self::Avi),
            _ => None,
        }
    }

    /// Extracts the allowed extension from a file name, if any.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical lowercase extension.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Ogg => "ogg",
            Self::Mov => "mov",
            Self::Avi => "avi",
        }
    }

    /// MIME type served for this container.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::Ogg => "video/ogg",
            Self::Mov => "video/quicktime",
            Self::Avi => "video/x-msvideo",
        }
    }
}

impl std::fmt::Display for MediaExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MIME type for any path, falling back to `application/octet-stream`.
pub fn content_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(MediaExtension::from_extension)
        .map_or(DEFAULT_CONTENT_TYPE, MediaExtension::content_type)
}

/// Ordering key of a segment name: its first run of ASCII digits.
///
/// The whole file name is scanned, extension included, so a digitless stem
/// with an `.mp4` extension keys on the `4`. Names without any digit collapse
/// to `0`. Runs too large for `u64` saturate to `u64::MAX`.
///
/// # Examples
/// ```
/// use splice_core::media::sort_key;
///
/// assert_eq!(sort_key("seg10_part3.mp4"), 10);
/// assert_eq!(sort_key("intro.mp4"), 4);
/// assert_eq!(sort_key("intro.webm"), 0);
/// ```
pub fn sort_key(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

/// Stable sort by [`sort_key`]; equal keys keep their incoming order.
pub fn sort_by_segment_key<T>(items: &mut [T], name_of: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| sort_key(name_of(item)));
}

/// One eligible media file found in a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    /// File name including extension
    pub name: String,
    /// Allowed container extension
    pub extension: MediaExtension,
    /// First digit run of the full name, 0 when absent
    pub sort_key: u64,
}

impl MediaFile {
    /// Builds a media file entry, or `None` when the extension is not allowed.
    pub fn from_name(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let extension = MediaExtension::from_file_name(&name)?;
        let sort_key = sort_key(&name);
        Some(Self {
            name,
            extension,
            sort_key,
        })
    }

    /// MIME type of this file.
    pub fn content_type(&self) -> &'static str {
        self.extension.content_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_first_digit_run() {
        assert_eq!(sort_key("seg1.mp4"), 1);
        assert_eq!(sort_key("seg10.mp4"), 10);
        assert_eq!(sort_key("cam2_take15.mp4"), 2);
        assert_eq!(sort_key("007.webm"), 7);
        assert_eq!(sort_key("a.mp4"), 4);
        assert_eq!(sort_key("a.webm"), 0);
        assert_eq!(sort_key("clip.MOV"), 0);
        assert_eq!(sort_key("99999999999999999999999.mp4"), u64::MAX);
    }

    #[test]
    fn test_extension_allow_list() {
        assert_eq!(MediaExtension::from_file_name("x.MP4"), Some(MediaExtension::Mp4));
        assert_eq!(MediaExtension::from_file_name("x.mov"), Some(MediaExtension::Mov));
        assert_eq!(MediaExtension::from_file_name("x.mkv"), None);
        assert_eq!(MediaExtension::from_file_name("readme.txt"), None);
        assert_eq!(MediaExtension::from_file_name("mp4"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for_path(Path::new("a.mp4")), "video/mp4");
        assert_eq!(content_type_for_path(Path::new("a.webm")), "video/webm");
        assert_eq!(content_type_for_path(Path::new("a.ogg")), "video/ogg");
        assert_eq!(content_type_for_path(Path::new("a.mov")), "video/quicktime");
        assert_eq!(content_type_for_path(Path::new("a.avi")), "video/x-msvideo");
        assert_eq!(content_type_for_path(Path::new("a.bin")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for_path(Path::new("noext")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_stable_sort_keeps_ties_in_order() {
        let mut names = vec!["b.mp4", "seg2.mp4", "a.mp4", "seg1.mp4", "c.mp4"];
        sort_by_segment_key(&mut names, |n| n);
        // Digitless stems key on the "4" of ".mp4"
        assert_eq!(names, vec!["seg1.mp4", "seg2.mp4", "b.mp4", "a.mp4", "c.mp4"]);

        let mut names = vec!["outro.mp4", "seg1.mp4", "intro.webm", "credits.mov"];
        sort_by_segment_key(&mut names, |n| n);
        assert_eq!(names, vec!["intro.webm", "credits.mov", "seg1.mp4", "outro.mp4"]);
    }

    #[test]
    fn test_media_file_from_name() {
        let file = MediaFile::from_name("part3.webm").unwrap();
        assert_eq!(file.extension, MediaExtension::Webm);
        assert_eq!(file.sort_key, 3);
        assert_eq!(file.content_type(), "video/webm");
        assert!(MediaFile::from_name("notes.txt").is_none());
    }
}
