//! Content source resolution.
//!
//! A [`ContentSource`] is the tagged union of the three shapes a caller can
//! supply: an async byte stream, a URL, or an in-memory buffer. Resolution
//! normalizes all three into one awaited byte buffer, delegating URL capture
//! to the [`capture`](crate::capture) module. The enum is matched
//! exhaustively; there is no fallback branch to reach.

use crate::capture;
use crate::catalog::FrameDescriptor;
use crate::error::FrameError;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

/// A content input: exactly one of three mutually exclusive shapes.
pub enum ContentSource {
    /// An async byte stream, drained fully into memory.
    Stream(Box<dyn AsyncRead + Send + Unpin>),
    /// An image or web page URL. Image resources pass through; pages are
    /// captured headlessly.
    Url(Url),
    /// Raw image bytes, passed through unchanged.
    Buffer(Bytes),
}

impl ContentSource {
    /// Wrap an async reader.
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Normalize this source into raw content bytes.
    pub async fn resolve(
        self,
        client: &reqwest::Client,
        frame: &FrameDescriptor,
        delay: Duration,
    ) -> Result<Bytes, FrameError> {
        match self {
            Self::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
            Self::Url(url) => capture::capture(client, &url, frame, delay).await,
            Self::Buffer(bytes) => Ok(bytes),
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("ContentSource::Stream"),
            Self::Url(url) => write!(f, "ContentSource::Url({url})"),
            Self::Buffer(bytes) => write!(f, "ContentSource::Buffer({} bytes)", bytes.len()),
        }
    }
}

impl From<Bytes> for ContentSource {
    fn from(bytes: Bytes) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(Bytes::from(bytes))
    }
}

impl From<Url> for ContentSource {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}
