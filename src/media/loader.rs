use crate::models::catalog::MediaKind;
use async_trait::async_trait;
use log::{debug, warn};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Bytes that must be buffered before a video counts as ready to play.
pub const VIDEO_READY_BYTES: usize = 256 * 1024;

/// Upper bound for a single load, network or disk.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Natural pixel size of a decoded media asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaDimensions {
    pub width: u32,
    pub height: u32,
}

impl MediaDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// height / width, if both sides are non-zero.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(self.height as f32 / self.width as f32)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server answered {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("could not decode image {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("no data received for {0}")]
    Empty(String),
    #[error("refusing to read outside the media directory: {0}")]
    OutsideMediaDir(String),
    #[error("gave up on {url} after {after:?}")]
    TimedOut { url: String, after: Duration },
}

/// `Ok(Some(..))` when the media loaded and its dimensions are known,
/// `Ok(None)` when it is ready but its size is not (videos).
pub type LoadOutcome = Result<Option<MediaDimensions>, LoadError>;

/// Fetches and decodes one media asset far enough that showing it
/// does not pop in.
#[async_trait]
pub trait MediaLoader: Send + Sync {
    async fn load(&self, url: &str, kind: MediaKind) -> LoadOutcome;
}

/// Loads `http(s)` URLs over the network and everything else from the
/// local media directory.
pub struct DefaultMediaLoader {
    client: reqwest::Client,
    media_dir: PathBuf,
}

impl DefaultMediaLoader {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(LOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            media_dir: media_dir.into(),
        }
    }

    /// Maps `/media/a.png`, `/a.png` and `a.png` into the media directory.
    fn resolve_local(&self, url: &str) -> Result<PathBuf, LoadError> {
        let relative = url
            .strip_prefix("/media/")
            .or_else(|| url.strip_prefix('/'))
            .unwrap_or(url);
        let relative = relative.split(['?', '#']).next().unwrap_or(relative);

        let escapes = Path::new(relative)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(LoadError::OutsideMediaDir(url.to_string()));
        }

        Ok(self.media_dir.join(relative))
    }

    async fn load_remote(&self, url: &str, kind: MediaKind) -> LoadOutcome {
        let http_err = |source| LoadError::Http {
            url: url.to_string(),
            source,
        };

        let mut response = self.client.get(url).send().await.map_err(http_err)?;
        if !response.status().is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        match kind {
            MediaKind::Image => {
                let bytes = response.bytes().await.map_err(http_err)?;
                decode_dimensions(url, bytes.to_vec()).map(Some)
            }
            MediaKind::Video => {
                let mut buffered = 0;
                while buffered < VIDEO_READY_BYTES {
                    match response.chunk().await.map_err(http_err)? {
                        Some(chunk) => buffered += chunk.len(),
                        None => break,
                    }
                }
                if buffered == 0 {
                    return Err(LoadError::Empty(url.to_string()));
                }
                debug!("Buffered {} bytes of {}", buffered, url);
                Ok(None)
            }
        }
    }

    async fn load_local(&self, url: &str, kind: MediaKind) -> LoadOutcome {
        let path = self.resolve_local(url)?;
        let io_err = |source| LoadError::Io {
            url: url.to_string(),
            source,
        };

        match kind {
            MediaKind::Image => {
                let bytes = tokio::fs::read(&path).await.map_err(io_err)?;
                let owned_url = url.to_string();
                tokio::task::spawn_blocking(move || decode_dimensions(&owned_url, bytes))
                    .await
                    .map_err(|e| io_err(std::io::Error::other(e)))?
                    .map(Some)
            }
            MediaKind::Video => {
                let file = tokio::fs::File::open(&path).await.map_err(io_err)?;
                let mut buffer = Vec::with_capacity(VIDEO_READY_BYTES);
                let read = file
                    .take(VIDEO_READY_BYTES as u64)
                    .read_to_end(&mut buffer)
                    .await
                    .map_err(io_err)?;
                if read == 0 {
                    return Err(LoadError::Empty(url.to_string()));
                }
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl MediaLoader for DefaultMediaLoader {
    async fn load(&self, url: &str, kind: MediaKind) -> LoadOutcome {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.load_remote(url, kind).await
        } else {
            self.load_local(url, kind).await
        }
    }
}

// Only the header is parsed, pixel data is never decoded
fn decode_dimensions(url: &str, bytes: Vec<u8>) -> Result<MediaDimensions, LoadError> {
    let decode_err = |source| LoadError::Decode {
        url: url.to_string(),
        source,
    };

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|source| LoadError::Io {
            url: url.to_string(),
            source,
        })?;
    let (width, height) = reader.into_dimensions().map_err(decode_err)?;
    Ok(MediaDimensions::new(width, height))
}
