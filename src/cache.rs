//! Cache directory layout and the frame artwork boundary.
//!
//! Two process-wide directories back the engine: one for downloaded frame
//! artwork and one for captured web screenshots. They are plain
//! configuration ([`CacheDirs`]) threaded through the pipeline constructor,
//! so tests can point them at isolated temporary directories.
//!
//! Artwork is materialized by an external [`FrameDownloader`]; the engine
//! only ever reads from the frame directory afterward.

use crate::catalog::FrameDescriptor;
use std::io;
use std::path::{Path, PathBuf};

/// Locations of the frame artwork cache and the web capture cache.
#[derive(Debug, Clone)]
pub struct CacheDirs {
    /// Frame artwork, keyed by each descriptor's `rel_path`.
    pub frames: PathBuf,
    /// Scratch space for captured web screenshots.
    pub web: PathBuf,
}

impl CacheDirs {
    /// Standard layout under a cache root: `<root>/frames` and `<root>/web`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            frames: root.join("frames"),
            web: root.join("web"),
        }
    }

    /// Platform cache location (`~/.cache/deviceframe` on Linux).
    ///
    /// `None` when the platform reports no cache directory.
    pub fn default_location() -> Option<Self> {
        dirs::cache_dir().map(|dir| Self::under(dir.join("deviceframe")))
    }

    /// Create both directories. Idempotent; failure is fatal to the caller.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.frames)?;
        std::fs::create_dir_all(&self.web)?;
        Ok(())
    }

    /// Absolute path of a frame's artwork within the cache.
    pub fn frame_path(&self, frame: &FrameDescriptor) -> PathBuf {
        self.frames.join(&frame.rel_path)
    }
}

/// External collaborator that materializes frame artwork files.
///
/// Implementations fetch the artwork for each descriptor and write it under
/// `dest` at the descriptor's `rel_path`. The engine never writes artwork
/// itself.
pub trait FrameDownloader {
    fn download(
        &self,
        frames: &[FrameDescriptor],
        dest: &Path,
    ) -> impl Future<Output = io::Result<()>> + Send;
}
