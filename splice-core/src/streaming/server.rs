//! Stateless whole-file and byte-range media delivery
//!
//! Every call opens its own read-only file handle, so concurrent and
//! overlapping requests against the same file need no coordination.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Component, Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

use super::range::{ByteRange, parse_range_header};
use super::StreamingError;
use crate::config::StreamingConfig;
use crate::media::content_type_for_path;

/// Whether a response carries the whole file or a window of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Full,
    Partial(ByteRange),
}

/// Media ready to be written to a client.
#[derive(Debug)]
pub struct MediaResponse {
    pub kind: ResponseKind,
    pub content_type: &'static str,
    pub content_length: u64,
    body: Take<File>,
    read_chunk_size: usize,
}

impl MediaResponse {
    /// HTTP status code: 200 for whole files, 206 for windows.
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ResponseKind::Full => 200,
            ResponseKind::Partial(_) => 206,
        }
    }

    /// `Content-Range` header value for partial responses.
    pub fn content_range(&self) -> Option<String> {
        match self.kind {
            ResponseKind::Full => None,
            ResponseKind::Partial(range) => Some(range.content_range()),
        }
    }

    /// `Accept-Ranges` header value; always byte ranges.
    pub fn accept_ranges(&self) -> &'static str {
        "bytes"
    }

    /// Converts the body into a chunked byte stream.
    pub fn into_body_stream(self) -> ReaderStream<Take<File>> {
        ReaderStream::with_capacity(self.body, self.read_chunk_size)
    }

    /// Reads the whole body into memory.
    ///
    /// # Errors
    /// - `std::io::Error` - Reading the file failed
    pub async fn read_body(mut self) -> Result<Vec<u8>, std::io::Error> {
        let mut buffer = Vec::with_capacity(self.content_length as usize);
        self.body.read_to_end(&mut buffer).await?;
        Ok(buffer)
    }
}

/// Resolves request paths to files and serves them with range support.
#[derive(Debug, Clone)]
pub struct MediaServer {
    media_root: Option<PathBuf>,
    read_chunk_size: usize,
}

impl Default for MediaServer {
    fn default() -> Self {
        Self::new(None, &StreamingConfig::default())
    }
}

impl MediaServer {
    /// Creates a server resolving paths beneath `media_root`, or as absolute
    /// paths when no root is given.
    pub fn new(media_root: Option<PathBuf>, config: &StreamingConfig) -> Self {
        Self {
            media_root,
            read_chunk_size: config.read_chunk_size.max(1),
        }
    }

    /// Configured media root, if any.
    pub fn media_root(&self) -> Option<&Path> {
        self.media_root.as_deref()
    }

    /// Maps a directory named by a client onto the filesystem.
    ///
    /// Without a media root the path is used as given, so relative paths
    /// resolve against the working directory. With one it is confined the
    /// same way as [`resolve`](Self::resolve).
    ///
    /// # Errors
    /// - `StreamingError::FileNotFound` - Path escapes the media root
    pub fn resolve_directory(&self, requested: &str) -> Result<PathBuf, StreamingError> {
        match &self.media_root {
            Some(_) => self.resolve(requested),
            None => Ok(PathBuf::from(requested)),
        }
    }

    /// Maps a decoded `/media/...` URL path onto the filesystem.
    ///
    /// URL paths are always rooted, so without a media root a path that lost
    /// its leading slash in routing is still read from `/`.
    ///
    /// # Errors
    /// - `StreamingError::FileNotFound` - Path escapes the media root
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, StreamingError> {
        let Some(root) = &self.media_root else {
            let path = Path::new(request_path);
            return Ok(if path.is_absolute() {
                path.to_path_buf()
            } else {
                Path::new("/").join(path)
            });
        };

        let mut resolved = root.clone();
        for component in Path::new(request_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    tracing::warn!("Rejected media path outside root: {request_path}");
                    return Err(StreamingError::FileNotFound {
                        path: PathBuf::from(request_path),
                    });
                }
            }
        }
        Ok(resolved)
    }

    /// Serves `resource_path` whole, or the window named by `range_header`.
    ///
    /// # Errors
    /// - `StreamingError::FileNotFound` - Path is not an existing regular file
    /// - `StreamingError::RangeNotSatisfiable` - Range header is malformed or out of bounds
    /// - `StreamingError::Io` - Opening or seeking the file failed
    pub async fn serve(
        &self,
        resource_path: &Path,
        range_header: Option<&str>,
    ) -> Result<MediaResponse, StreamingError> {
        let metadata = tokio::fs::metadata(resource_path)
            .await
            .map_err(|e| map_open_error(resource_path, e))?;
        if !metadata.is_file() {
            return Err(StreamingError::FileNotFound {
                path: resource_path.to_path_buf(),
            });
        }

        let total_size = metadata.len();
        let content_type = content_type_for_path(resource_path);

        // Validate before opening so a bad header never touches the file
        let range = range_header
            .map(|value| parse_range_header(value, total_size))
            .transpose()?;

        let mut file = File::open(resource_path)
            .await
            .map_err(|e| map_open_error(resource_path, e))?;

        let (kind, content_length) = match range {
            Some(range) => {
                file.seek(SeekFrom::Start(range.start))
                    .await
                    .map_err(|source| StreamingError::Io {
                        path: resource_path.to_path_buf(),
                        source,
                    })?;
                (ResponseKind::Partial(range), range.chunk_size())
            }
            None => (ResponseKind::Full, total_size),
        };

        tracing::debug!(
            path = %resource_path.display(),
            ?kind,
            content_length,
            "Serving media"
        );

        Ok(MediaResponse {
            kind,
            content_type,
            content_length,
            body: file.take(content_length),
            read_chunk_size: self.read_chunk_size,
        })
    }
}

fn map_open_error(path: &Path, source: std::io::Error) -> StreamingError {
    match source.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => StreamingError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => StreamingError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}
