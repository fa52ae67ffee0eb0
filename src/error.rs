//! Pipeline error taxonomy.
//!
//! Every stage of the framing pipeline fails with a [`FrameError`]. There are
//! no internal retries: the first failure aborts the run and surfaces as the
//! returned error (promise form) or a single `error` event (stream form).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    /// Stream or file read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP-level failure fetching a URL.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Headless page capture failure.
    #[error("screenshot capture failed: {0}")]
    Capture(String),

    /// Malformed image bytes.
    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    /// Degenerate geometry in a frame descriptor (zero-sized artwork or
    /// placement window, nonpositive pixel ratio).
    #[error("invalid frame geometry: {0}")]
    FrameConfig(String),

    /// Final PNG encode failure.
    #[error("PNG encode failed: {0}")]
    Encoding(#[source] image::ImageError),

    /// A blocking-pool task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
