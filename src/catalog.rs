//! Static frame catalog.
//!
//! The catalog is a read-only table of frame descriptors shipped in-tree as
//! `data/frames.json`. Loading is a pure derivation: the raw entries are
//! deserialized and shadow-flagged frames get a `" [shadow]"` name suffix,
//! producing a new immutable [`Catalog`] value. The suffix is only appended
//! when absent, so loading any number of times yields the same names.
//!
//! A malformed catalog is a fatal [`CatalogError`] at load, not a
//! per-request failure.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Display-name suffix for frames with a baked-in drop shadow.
const SHADOW_SUFFIX: &str = " [shadow]";

/// Catalog shipped with the crate.
const BUILTIN_FRAMES: &str = include_str!("../data/frames.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("malformed frame catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// The rectangle within the frame artwork where content is placed.
///
/// The rectangle is expressed in artwork pixels but is not guaranteed to fit
/// inside the artwork bitmap; the fit engine handles either image being
/// larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameWindow {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub top: u32,
}

/// A single device frame: identity, artwork location, and geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDescriptor {
    /// Device identifier, shared between color/shadow variants
    /// (e.g. "Apple iPhone 8").
    pub device: String,
    /// Display name. Shadow variants carry the `" [shadow]"` suffix after
    /// catalog load.
    pub name: String,
    /// Whether the artwork includes a baked-in drop shadow.
    #[serde(default)]
    pub shadow: bool,
    /// Artwork path relative to the frame cache directory.
    #[serde(rename = "relPath")]
    pub rel_path: PathBuf,
    /// Device pixel density. Divides the placement window down to logical
    /// viewport pixels for page capture.
    #[serde(rename = "pixelRatio", default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
    /// Content placement window within the artwork.
    pub frame: FrameWindow,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

/// Immutable, loaded-once table of frame descriptors.
#[derive(Debug, Clone)]
pub struct Catalog {
    frames: Vec<FrameDescriptor>,
}

impl Catalog {
    /// Load the catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_FRAMES)
    }

    /// Load a catalog from JSON, deriving shadow-suffixed display names.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: Vec<FrameDescriptor> = serde_json::from_str(json)?;
        let frames = raw.into_iter().map(with_shadow_suffix).collect();
        Ok(Self { frames })
    }

    /// All frame descriptors, in catalog order.
    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    /// Distinct device identifiers, sorted ascending.
    pub fn devices(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.frames.iter().map(|f| f.device.as_str()).collect();
        set.into_iter().collect()
    }

    /// Look up a frame by display name, falling back to the first frame for
    /// a matching device. Comparison is case-insensitive.
    pub fn find(&self, name: &str) -> Option<&FrameDescriptor> {
        self.frames
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .or_else(|| {
                self.frames
                    .iter()
                    .find(|f| f.device.eq_ignore_ascii_case(name))
            })
    }
}

/// Append the shadow suffix to flagged frames. Idempotent: an already
/// suffixed name is left alone.
fn with_shadow_suffix(mut frame: FrameDescriptor) -> FrameDescriptor {
    if frame.shadow && !frame.name.ends_with(SHADOW_SUFFIX) {
        frame.name.push_str(SHADOW_SUFFIX);
    }
    frame
}
