//! Frame/content fit engine — the aspect-ratio reconciliation algorithm.
//!
//! Frame artwork and content image are almost never the same resolution or
//! aspect ratio. This module decides, deterministically, which raster to
//! rescale and by how much, and where the content lands inside the frame's
//! placement window.
//!
//! The decision is computed as a pure [`FitPlan`] (unit testable without any
//! rasters) and applied to the decoded images separately:
//!
//! - **Frame larger** (`frameMax > contentMax`): the artwork is scaled down
//!   toward the content, preserving its own aspect ratio — the shorter
//!   placement-window axis is matched to the content's corresponding axis,
//!   the other axis derived proportionally. The placement offset is
//!   recomputed by reapplying the original left/top ratios to the rescaled
//!   artwork. The content is then scaled to *cover* the rescaled window.
//! - **Content larger or equal**: the artwork is untouched and the content
//!   covers the window's original dimensions; the offset is the window's
//!   unmodified left/top.
//!
//! Cover means scale-to-fill with the overflow axis cropped. The window is
//! always fully covered, never letterboxed, at the cost of clipping the
//! dimension that does not fit.

use crate::catalog::FrameWindow;
use crate::error::FrameError;
use image::DynamicImage;
use image::imageops::FilterType;

/// Offset at which the content raster is placed on the frame-sized canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositePosition {
    pub left: u32,
    pub top: u32,
}

/// Computed geometry for one composition: target artwork size, the window
/// the content must cover, and the placement offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// Target artwork dimensions. Equal to the input artwork in the
    /// content-larger case.
    pub frame_size: (u32, u32),
    /// Dimensions the content must cover (possibly the rescaled window).
    pub window: (u32, u32),
    /// Where the content lands on the canvas.
    pub position: CompositePosition,
}

/// Compute the fit plan for an artwork bitmap, its placement window, and a
/// content bitmap.
///
/// # Errors
///
/// Returns [`FrameError::FrameConfig`] when the artwork, window, or content
/// has a zero dimension — those would otherwise divide by zero or produce an
/// empty canvas.
pub fn plan_fit(
    artwork: (u32, u32),
    window: &FrameWindow,
    content: (u32, u32),
) -> Result<FitPlan, FrameError> {
    let (art_w, art_h) = artwork;
    let (content_w, content_h) = content;

    if art_w == 0 || art_h == 0 {
        return Err(FrameError::FrameConfig(format!(
            "frame artwork has zero area ({art_w}x{art_h})"
        )));
    }
    if window.width == 0 || window.height == 0 {
        return Err(FrameError::FrameConfig(format!(
            "placement window has zero area ({}x{})",
            window.width, window.height
        )));
    }
    if content_w == 0 || content_h == 0 {
        return Err(FrameError::FrameConfig(format!(
            "content image has zero area ({content_w}x{content_h})"
        )));
    }

    // Window position as a fraction of the artwork, preserved across any
    // rescale so the window tracks proportionally.
    let left_ratio = f64::from(window.left) / f64::from(art_w);
    let top_ratio = f64::from(window.top) / f64::from(art_h);

    let frame_max = window.width.max(window.height);
    let content_max = content_w.max(content_h);

    if frame_max > content_max {
        // Frame is the larger image: scale the artwork down so the shorter
        // window axis matches the content's corresponding axis. The other
        // axis follows the artwork's own aspect ratio, so content may clip
        // on the unmatched axis.
        let (new_art_w, new_art_h) = if window.height > window.width {
            let ratio = f64::from(content_w) / f64::from(window.width);
            let w = (f64::from(art_w) * ratio).ceil().max(1.0) as u32;
            let h = (f64::from(art_h) * f64::from(w) / f64::from(art_w))
                .round()
                .max(1.0) as u32;
            (w, h)
        } else {
            let ratio = f64::from(content_h) / f64::from(window.height);
            let h = (f64::from(art_h) * ratio).ceil().max(1.0) as u32;
            let w = (f64::from(art_w) * f64::from(h) / f64::from(art_h))
                .round()
                .max(1.0) as u32;
            (w, h)
        };

        // The artwork moved, so the window moves with it.
        let position = CompositePosition {
            left: (f64::from(new_art_w) * left_ratio).ceil() as u32,
            top: (f64::from(new_art_h) * top_ratio).ceil() as u32,
        };
        let scaled_window = (
            (f64::from(window.width) * f64::from(new_art_w) / f64::from(art_w))
                .round()
                .max(1.0) as u32,
            (f64::from(window.height) * f64::from(new_art_h) / f64::from(art_h))
                .round()
                .max(1.0) as u32,
        );

        Ok(FitPlan {
            frame_size: (new_art_w, new_art_h),
            window: scaled_window,
            position,
        })
    } else {
        // Content is the larger (or equal) image: leave the artwork alone
        // and cover the window as configured.
        Ok(FitPlan {
            frame_size: (art_w, art_h),
            window: (window.width, window.height),
            position: CompositePosition {
                left: window.left,
                top: window.top,
            },
        })
    }
}

/// Apply a plan to the decoded rasters, returning the (possibly rescaled)
/// artwork and the cover-scaled content.
pub fn apply_fit(
    frame: DynamicImage,
    content: DynamicImage,
    plan: &FitPlan,
) -> (DynamicImage, DynamicImage) {
    let frame = if (frame.width(), frame.height()) == plan.frame_size {
        frame
    } else {
        frame.resize_exact(plan.frame_size.0, plan.frame_size.1, FilterType::Lanczos3)
    };

    // Cover: fill the window completely, cropping the overflow axis.
    let content = content.resize_to_fill(plan.window.0, plan.window.1, FilterType::Lanczos3);

    (frame, content)
}
