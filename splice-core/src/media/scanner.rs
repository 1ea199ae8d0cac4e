//! Directory scanning for segment files

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{MediaFile, sort_by_segment_key};

/// Errors that occur while listing a media directory.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Directory is missing, not a directory, or not readable
    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Directory exists but enumeration failed part way
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadFailed {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

/// A scanned directory and the eligible media files it contains.
#[derive(Debug, Clone)]
pub struct MediaDirectory {
    pub path: PathBuf,
    pub files: Vec<MediaFile>,
}

impl MediaDirectory {
    /// Scans `path` and keeps the ordered result alongside it.
    ///
    /// # Errors
    /// - `ScanError::DirectoryNotFound` - Path missing or unreadable
    /// - `ScanError::ReadFailed` - Enumeration failed
    pub async fn scan(path: &Path) -> Result<Self, ScanError> {
        let files = list_media_files(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            files,
        })
    }

    /// File names in playback order.
    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|file| file.name.clone()).collect()
    }
}

/// Lists media files in `path`, ordered by their first number.
///
/// Entries outside the extension allow-list and subdirectories are skipped.
/// Files with equal keys (including every name without digits) keep the
/// order the directory enumerated them in.
///
/// # Errors
/// - `ScanError::DirectoryNotFound` - Path missing, not a directory, or unreadable
/// - `ScanError::ReadFailed` - Enumeration failed after opening the directory
pub async fn list_media_files(path: &Path) -> Result<Vec<MediaFile>, ScanError> {
    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|source| open_error(path, source))?;

    let mut files = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(ScanError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::trace!("Skipping non UTF-8 entry in {}", path.display());
            continue;
        };

        let Some(file) = MediaFile::from_name(name) else {
            continue;
        };

        if let Ok(file_type) = entry.file_type().await
            && file_type.is_dir()
        {
            continue;
        }

        files.push(file);
    }

    sort_by_segment_key(&mut files, |file| file.name.as_str());

    tracing::debug!("Found {} media files in {}", files.len(), path.display());
    Ok(files)
}

fn open_error(path: &Path, source: std::io::Error) -> ScanError {
    match source.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::PermissionDenied => {
            ScanError::DirectoryNotFound {
                path: path.to_path_buf(),
            }
        }
        _ => ScanError::ReadFailed {
            path: path.to_path_buf(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaExtension;
    use crate::test_fixtures::create_media_dir;

    #[tokio::test]
    async fn test_orders_by_first_number_and_drops_non_media() {
        let dir = create_media_dir(&["seg10.mp4", "seg2.mp4", "seg1.mp4", "readme.txt"]);

        let files = list_media_files(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["seg1.mp4", "seg2.mp4", "seg10.mp4"]);
        assert_eq!(files[2].sort_key, 10);
        assert_eq!(files[0].extension, MediaExtension::Mp4);
    }

    #[tokio::test]
    async fn test_names_without_digits_keep_enumeration_order() {
        let dir = create_media_dir(&["a.mp4", "b.mp4"]);

        let enumerated: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();

        let files = list_media_files(dir.path()).await.unwrap();
        let names: Vec<String> = files.into_iter().map(|f| f.name).collect();

        assert_eq!(names, enumerated);
    }

    #[tokio::test]
    async fn test_skips_directories_with_media_names() {
        let dir = create_media_dir(&["clip1.webm"]);
        std::fs::create_dir(dir.path().join("nested2.mp4")).unwrap();

        let files = list_media_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "clip1.webm");
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = create_media_dir(&[]);
        let missing = dir.path().join("does-not-exist");

        let result = list_media_files(&missing).await;
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_file_path_is_not_a_directory() {
        let dir = create_media_dir(&["seg1.mp4"]);

        let result = list_media_files(&dir.path().join("seg1.mp4")).await;
        assert!(matches!(
            result,
            Err(ScanError::DirectoryNotFound { .. }) | Err(ScanError::ReadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_media_directory_scan() {
        let dir = create_media_dir(&["b3.ogg", "a1.MOV"]);

        let scanned = MediaDirectory::scan(dir.path()).await.unwrap();
        assert_eq!(scanned.file_names(), vec!["a1.MOV", "b3.ogg"]);
        assert_eq!(scanned.path, dir.path());
    }
}
