//! Compositor: layer the fitted content and the frame artwork onto a canvas.
//!
//! The canvas is allocated transparent at exactly the artwork's size, the
//! content is layered at the computed position, and the artwork goes on top
//! at (0,0) so its bezel occludes the content's edges. The result is encoded
//! as PNG.

use crate::error::FrameError;
use crate::fit::CompositePosition;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, RgbaImage, imageops};
use std::io::Cursor;

/// Merge the two rasters and encode the result as PNG bytes.
pub fn compose(
    frame: &DynamicImage,
    content: &DynamicImage,
    position: CompositePosition,
) -> Result<Bytes, FrameError> {
    let mut canvas = RgbaImage::new(frame.width(), frame.height());

    imageops::overlay(
        &mut canvas,
        &content.to_rgba8(),
        i64::from(position.left),
        i64::from(position.top),
    );
    // Frame artwork is always the topmost layer.
    imageops::overlay(&mut canvas, &frame.to_rgba8(), 0, 0);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(FrameError::Encoding)?;

    Ok(Bytes::from(out.into_inner()))
}
