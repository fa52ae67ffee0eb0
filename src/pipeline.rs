//! Pipeline orchestrator.
//!
//! One internal async driver sequences acquisition → decode → fit →
//! composite → encode; two thin adapters expose it:
//!
//! - [`Framer::composite`] awaits the driver and returns the encoded buffer
//!   or the first error.
//! - [`Framer::composite_stream`] spawns the driver and returns an event
//!   handle immediately. Stage transitions arrive as [`FrameEvent::Debug`]
//!   in pipeline order; the last event is always exactly one
//!   [`FrameEvent::End`] or [`FrameEvent::Error`], after which the stream is
//!   exhausted.
//!
//! Stages are strictly sequential by data dependency. The one legitimate
//! fan-out is acquiring and decoding the frame artwork concurrently with the
//! content image, since neither depends on the other. There is no
//! cancellation and no internal timeout; a caller wanting to abandon a run
//! drops the handle and ignores late events.

use crate::cache::{CacheDirs, FrameDownloader};
use crate::catalog::FrameDescriptor;
use crate::compose;
use crate::error::FrameError;
use crate::fit;
use crate::source::ContentSource;
use bytes::Bytes;
use image::DynamicImage;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Per-request options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeOptions {
    /// Fixed wait between page navigation and the screenshot. Not a
    /// timeout; forwarded to capture unchanged.
    pub delay: Duration,
}

/// Ordered diagnostic events emitted by [`Framer::composite_stream`].
#[derive(Debug)]
pub enum FrameEvent {
    /// Stage-transition diagnostics, in pipeline order.
    Debug(String),
    /// Terminal failure. Nothing follows.
    Error(FrameError),
    /// Terminal success carrying the PNG-encoded composite.
    End(Bytes),
}

/// The compositing engine: cache locations plus a shared HTTP client.
///
/// Cheap to clone; concurrent requests share no mutable state and each owns
/// its decoded rasters.
#[derive(Debug, Clone)]
pub struct Framer {
    cache: CacheDirs,
    http: reqwest::Client,
}

impl Framer {
    /// Build an engine over the given cache layout, creating the
    /// directories if needed. Directory creation failure is fatal.
    pub fn new(cache: CacheDirs) -> io::Result<Self> {
        cache.ensure()?;
        Ok(Self {
            cache,
            http: reqwest::Client::new(),
        })
    }

    pub fn cache(&self) -> &CacheDirs {
        &self.cache
    }

    /// Materialize artwork for the given frames through an external
    /// downloader. The engine only reads the frame directory afterward.
    pub async fn download_frames<D: FrameDownloader>(
        &self,
        downloader: &D,
        frames: &[FrameDescriptor],
    ) -> io::Result<()> {
        downloader.download(frames, &self.cache.frames).await
    }

    /// Composite `content` into `frame`, resolving to the PNG buffer or the
    /// first error encountered at any stage.
    pub async fn composite(
        &self,
        content: ContentSource,
        frame: &FrameDescriptor,
        options: CompositeOptions,
    ) -> Result<Bytes, FrameError> {
        run(
            &self.cache,
            &self.http,
            content,
            frame,
            options,
            &mut |_msg: String| {},
        )
        .await
    }

    /// Composite `content` into `frame`, returning an event handle
    /// immediately. See the module docs for the event contract.
    pub fn composite_stream(
        &self,
        content: ContentSource,
        frame: FrameDescriptor,
        options: CompositeOptions,
    ) -> CompositeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let cache = self.cache.clone();
        let http = self.http.clone();

        tokio::spawn(async move {
            let progress = tx.clone();
            let result = run(&cache, &http, content, &frame, options, &mut |msg| {
                // A dropped handle is not an error; the pipeline runs to
                // completion regardless.
                let _ = progress.send(FrameEvent::Debug(msg));
            })
            .await;

            let terminal = match result {
                Ok(buffer) => FrameEvent::End(buffer),
                Err(err) => FrameEvent::Error(err),
            };
            let _ = tx.send(terminal);
        });

        CompositeStream { rx }
    }
}

/// Event handle for a running pipeline. Implements [`Stream`]; the channel
/// closes after the terminal event.
pub struct CompositeStream {
    rx: mpsc::UnboundedReceiver<FrameEvent>,
}

impl CompositeStream {
    /// Receive the next event, or `None` once the pipeline has settled and
    /// all events were consumed.
    pub async fn next_event(&mut self) -> Option<FrameEvent> {
        self.rx.recv().await
    }
}

impl Stream for CompositeStream {
    type Item = FrameEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// The single pipeline driver both entry points adapt.
async fn run(
    cache: &CacheDirs,
    http: &reqwest::Client,
    content: ContentSource,
    frame: &FrameDescriptor,
    options: CompositeOptions,
    progress: &mut (dyn FnMut(String) + Send),
) -> Result<Bytes, FrameError> {
    let frame_path = cache.frame_path(frame);
    progress(format!("reading frame from {}", frame_path.display()));
    tracing::debug!(frame = %frame.name, path = %frame_path.display(), "reading frame artwork");

    // Artwork and content do not depend on each other; acquire and decode
    // them concurrently.
    let (frame_img, content_img) = tokio::try_join!(
        load_artwork(&frame_path),
        load_content(http, content, frame, options.delay),
    )?;

    progress("resizing frame and content".to_string());
    tracing::debug!(
        artwork_w = frame_img.width(),
        artwork_h = frame_img.height(),
        content_w = content_img.width(),
        content_h = content_img.height(),
        "fitting"
    );

    let plan = fit::plan_fit(
        (frame_img.width(), frame_img.height()),
        &frame.frame,
        (content_img.width(), content_img.height()),
    )?;
    let (frame_img, content_img) =
        tokio::task::spawn_blocking(move || fit::apply_fit(frame_img, content_img, &plan)).await?;

    progress(format!(
        "compositing at {},{}",
        plan.position.left, plan.position.top
    ));
    let buffer = tokio::task::spawn_blocking(move || {
        compose::compose(&frame_img, &content_img, plan.position)
    })
    .await??;

    tracing::debug!(bytes = buffer.len(), "composite encoded");
    Ok(buffer)
}

async fn load_artwork(path: &Path) -> Result<DynamicImage, FrameError> {
    let bytes = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes).map_err(FrameError::Decode))
        .await?
}

async fn load_content(
    http: &reqwest::Client,
    content: ContentSource,
    frame: &FrameDescriptor,
    delay: Duration,
) -> Result<DynamicImage, FrameError> {
    let bytes = content.resolve(http, frame, delay).await?;
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes).map_err(FrameError::Decode))
        .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FrameWindow;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Cache with one materialized 100x160 artwork and its descriptor.
    fn fixture(tmp: &TempDir) -> (Framer, FrameDescriptor) {
        let framer = Framer::new(CacheDirs::under(tmp.path())).unwrap();

        let frame = FrameDescriptor {
            device: "Test Phone".into(),
            name: "Test Phone".into(),
            shadow: false,
            rel_path: "test-phone/black.png".into(),
            pixel_ratio: 2.0,
            frame: FrameWindow {
                width: 80,
                height: 120,
                left: 10,
                top: 20,
            },
        };

        let artwork_path = framer.cache().frame_path(&frame);
        std::fs::create_dir_all(artwork_path.parent().unwrap()).unwrap();
        std::fs::write(&artwork_path, png_bytes(100, 160, Rgba([255, 0, 0, 255]))).unwrap();

        (framer, frame)
    }

    fn content_png() -> ContentSource {
        // Larger than the window on both axes: routes to the content-larger
        // fit case, artwork untouched.
        ContentSource::from(png_bytes(300, 300, Rgba([0, 0, 255, 255])))
    }

    // =========================================================================
    // Promise-style entry point
    // =========================================================================

    #[tokio::test]
    async fn composite_returns_png_sized_to_artwork() {
        let tmp = TempDir::new().unwrap();
        let (framer, frame) = fixture(&tmp);

        let buffer = framer
            .composite(content_png(), &frame, CompositeOptions::default())
            .await
            .unwrap();

        let img = image::load_from_memory(&buffer).unwrap();
        assert_eq!((img.width(), img.height()), (100, 160));
    }

    #[tokio::test]
    async fn missing_artwork_fails_with_io() {
        let tmp = TempDir::new().unwrap();
        let (framer, mut frame) = fixture(&tmp);
        frame.rel_path = "missing/frame.png".into();

        let err = framer
            .composite(content_png(), &frame, CompositeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
    }

    #[tokio::test]
    async fn malformed_content_fails_with_decode() {
        let tmp = TempDir::new().unwrap();
        let (framer, frame) = fixture(&tmp);

        let err = framer
            .composite(
                ContentSource::from(b"not an image".to_vec()),
                &frame,
                CompositeOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FrameError::Decode(_)));
    }

    #[tokio::test]
    async fn stream_content_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let (framer, frame) = fixture(&tmp);

        let reader = Cursor::new(png_bytes(300, 300, Rgba([0, 255, 0, 255])));
        let buffer = framer
            .composite(
                ContentSource::stream(reader),
                &frame,
                CompositeOptions::default(),
            )
            .await
            .unwrap();
        assert!(image::load_from_memory(&buffer).is_ok());
    }

    // =========================================================================
    // Event-stream entry point
    // =========================================================================

    async fn collect(mut stream: CompositeStream) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        while let Some(event) = stream.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn successful_run_emits_events_in_stage_order() {
        let tmp = TempDir::new().unwrap();
        let (framer, frame) = fixture(&tmp);

        let events = collect(framer.composite_stream(
            content_png(),
            frame,
            CompositeOptions::default(),
        ))
        .await;

        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], FrameEvent::Debug(m) if m.contains("reading frame")));
        assert!(matches!(&events[1], FrameEvent::Debug(m) if m.contains("resizing")));
        assert!(matches!(&events[2], FrameEvent::Debug(m) if m.contains("compositing")));
        assert!(matches!(&events[3], FrameEvent::End(_)));
    }

    #[tokio::test]
    async fn failure_aborts_before_compositing_and_emits_single_error() {
        let tmp = TempDir::new().unwrap();
        let (framer, mut frame) = fixture(&tmp);
        frame.rel_path = "missing/frame.png".into();

        let events = collect(framer.composite_stream(
            content_png(),
            frame,
            CompositeOptions::default(),
        ))
        .await;

        // Only the first stage ran; the terminal event is the error and the
        // stream is exhausted afterward.
        assert!(matches!(&events[0], FrameEvent::Debug(m) if m.contains("reading frame")));
        assert!(matches!(events.last(), Some(FrameEvent::Error(_))));
        assert!(!events.iter().any(
            |e| matches!(e, FrameEvent::Debug(m) if m.contains("compositing"))
        ));
        assert!(!events.iter().any(|e| matches!(e, FrameEvent::End(_))));
    }

    #[tokio::test]
    async fn concurrent_requests_do_not_interfere() {
        let tmp = TempDir::new().unwrap();
        let (framer, frame) = fixture(&tmp);

        let (a, b) = tokio::join!(
            framer.composite(content_png(), &frame, CompositeOptions::default()),
            framer.composite(content_png(), &frame, CompositeOptions::default()),
        );
        assert_eq!(a.unwrap(), b.unwrap());
    }
}
