//! Segment lists for local directories served through the Splice API.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use splice_core::list_media_files;
use url::Url;

use super::SegmentListProvider;
use crate::errors::ListingError;
use crate::remote::SegmentListing;

/// Lists a local directory and points each file at the `/media` endpoint.
///
/// Without a media root the server resolves request paths as absolute
/// filesystem paths, so the full directory path is encoded into each URL.
/// With one, only the part beneath the root is. Relative directories are
/// resolved against the working directory before encoding.
#[derive(Debug, Clone)]
pub struct LocalDirectoryProvider {
    directory: PathBuf,
    media_base_url: Url,
    media_root: Option<PathBuf>,
}

impl LocalDirectoryProvider {
    /// Creates a provider for `directory` served from `media_base_url`.
    pub fn new(directory: impl Into<PathBuf>, media_base_url: Url) -> Self {
        Self {
            directory: directory.into(),
            media_base_url,
            media_root: None,
        }
    }

    /// Encodes paths relative to the server's media root.
    pub fn with_media_root(mut self, media_root: impl Into<PathBuf>) -> Self {
        self.media_root = Some(media_root.into());
        self
    }

    /// Directory being listed.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Builds the `/media/...` URL for a file in the directory.
    ///
    /// The directory and media root are used as given. [`segments`] resolves
    /// both to absolute paths first, which is what the server expects.
    ///
    /// [`segments`]: SegmentListProvider::segments
    ///
    /// # Errors
    /// - `ListingError::InvalidBaseUrl` - Base URL cannot be extended into a valid URL
    pub fn segment_url(&self, file_name: &str) -> Result<Url, ListingError> {
        media_url(
            &self.media_base_url,
            &self.directory,
            self.media_root.as_deref(),
            file_name,
        )
    }
}

/// Resolves `path` against the working directory and through symlinks,
/// keeping it as given when that fails.
async fn absolute_path(path: &Path) -> PathBuf {
    match tokio::fs::canonicalize(path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!("Could not resolve {}: {e}", path.display());
            path.to_path_buf()
        }
    }
}

fn media_url(
    base_url: &Url,
    directory: &Path,
    media_root: Option<&Path>,
    file_name: &str,
) -> Result<Url, ListingError> {
    let file_path = directory.join(file_name);
    let request_path = match media_root {
        Some(root) => file_path.strip_prefix(root).unwrap_or_else(|_| {
            tracing::warn!(
                "{} is outside media root {}; using absolute path",
                file_path.display(),
                root.display()
            );
            file_path.as_path()
        }),
        None => file_path.as_path(),
    };

    let encoded: Vec<String> = request_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => {
                Some(urlencoding::encode(&part.to_string_lossy()).into_owned())
            }
            _ => None,
        })
        .collect();

    let base = base_url.as_str().trim_end_matches('/');
    let raw = format!("{base}/media/{}", encoded.join("/"));
    Url::parse(&raw).map_err(|_| ListingError::InvalidBaseUrl {
        url: base_url.to_string(),
    })
}

#[async_trait]
impl SegmentListProvider for LocalDirectoryProvider {
    async fn segments(&self) -> Result<SegmentListing, ListingError> {
        let files = list_media_files(&self.directory).await?;
        if files.is_empty() {
            return Err(ListingError::NoFilesFound {
                location: self.directory.display().to_string(),
            });
        }

        let directory = absolute_path(&self.directory).await;
        let media_root = match &self.media_root {
            Some(root) => Some(absolute_path(root).await),
            None => None,
        };

        let root = media_root.as_deref();
        let segments = files
            .iter()
            .map(|file| media_url(&self.media_base_url, &directory, root, &file.name))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            "Found {} segments in {}",
            segments.len(),
            directory.display()
        );
        Ok(SegmentListing::parsed(segments))
    }
}

#[cfg(test)]
mod tests {
    use splice_core::ScanError;

    use super::*;
    use crate::remote::ListingOrigin;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:3000/").unwrap()
    }

    #[tokio::test]
    async fn test_rooted_urls_in_segment_order() {
        let root = tempfile::tempdir().unwrap();
        let show = root.path().join("show");
        std::fs::create_dir(&show).unwrap();
        for name in ["seg 10.mp4", "seg 2.mp4", "cover.jpg"] {
            std::fs::write(show.join(name), b"x").unwrap();
        }

        let provider = LocalDirectoryProvider::new(&show, base()).with_media_root(root.path());
        let listing = provider.segments().await.unwrap();

        assert_eq!(listing.origin, ListingOrigin::Parsed);
        let urls: Vec<&str> = listing.segments.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "http://127.0.0.1:3000/media/show/seg%202.mp4",
                "http://127.0.0.1:3000/media/show/seg%2010.mp4",
            ]
        );
    }

    #[test]
    fn test_unrooted_url_carries_absolute_path() {
        let provider = LocalDirectoryProvider::new("/srv/videos", base());
        let url = provider.segment_url("part1.webm").unwrap();
        assert_eq!(url.path(), "/media/srv/videos/part1.webm");
    }

    #[tokio::test]
    async fn test_relative_directory_encodes_absolute_path() {
        let dir = tempfile::Builder::new()
            .prefix("relative-segments")
            .tempdir_in(".")
            .unwrap();
        std::fs::write(dir.path().join("seg1.mp4"), b"x").unwrap();
        let relative = PathBuf::from(dir.path().file_name().unwrap());
        assert!(relative.is_relative());

        let listing = LocalDirectoryProvider::new(&relative, base())
            .segments()
            .await
            .unwrap();

        let expected = std::fs::canonicalize(dir.path()).unwrap().join("seg1.mp4");
        let url = &listing.segments[0];
        let decoded = urlencoding::decode(url.path().trim_start_matches("/media"))
            .unwrap()
            .into_owned();
        assert_eq!(PathBuf::from(decoded), expected);
    }

    #[tokio::test]
    async fn test_relative_directory_under_relative_root() {
        let root = tempfile::Builder::new()
            .prefix("relative-root")
            .tempdir_in(".")
            .unwrap();
        std::fs::create_dir(root.path().join("show")).unwrap();
        std::fs::write(root.path().join("show").join("ep1.webm"), b"x").unwrap();
        let relative_root = PathBuf::from(root.path().file_name().unwrap());

        let listing = LocalDirectoryProvider::new(relative_root.join("show"), base())
            .with_media_root(&relative_root)
            .segments()
            .await
            .unwrap();

        assert_eq!(
            listing.segments[0].as_str(),
            "http://127.0.0.1:3000/media/show/ep1.webm"
        );
    }

    #[tokio::test]
    async fn test_empty_directory_has_no_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), b"x").unwrap();

        let result = LocalDirectoryProvider::new(dir.path(), base())
            .segments()
            .await;
        assert!(matches!(result, Err(ListingError::NoFilesFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_directory_is_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalDirectoryProvider::new(dir.path().join("gone"), base())
            .segments()
            .await;

        assert!(matches!(
            result,
            Err(ListingError::Scan(ScanError::DirectoryNotFound { .. }))
        ));
    }
}
