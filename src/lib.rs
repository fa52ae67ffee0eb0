//! # deviceframe
//!
//! Composite a screenshot, local image, or web page onto a decorative device
//! frame (a phone bezel, a laptop lid), producing a single PNG.
//!
//! The core is the frame-fitting engine: frame artwork and content image are
//! almost never the same resolution or aspect ratio, so the engine decides
//! which raster to rescale, by how much, and where the content lands inside
//! the frame's placement window — always covering the window, never
//! letterboxing. Around it sits an asynchronous pipeline:
//!
//! ```text
//! acquire (stream | URL capture | buffer)
//!     → decode (artwork ∥ content)
//!     → fit (rescale one side, compute placement)
//!     → composite (content under bezel)
//!     → encode PNG
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Static frame descriptors: device names, artwork paths, placement geometry |
//! | [`cache`] | Cache directory layout and the frame-download collaborator boundary |
//! | [`source`] | `ContentSource` — the stream / URL / buffer tagged union and its resolution |
//! | [`capture`] | URL fetch, image passthrough, and headless page screenshots |
//! | [`fit`] | The fit engine: pure geometry plan plus raster application |
//! | [`compose`] | Canvas allocation, layering, PNG encoding |
//! | [`pipeline`] | `Framer` — promise-style and event-stream entry points over one driver |
//! | [`error`] | `FrameError` — the per-stage failure taxonomy |
//!
//! # Example
//!
//! ```no_run
//! use deviceframe::{CacheDirs, Catalog, CompositeOptions, ContentSource, Framer};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::builtin()?;
//! let frame = catalog.find("Apple iPhone 8").expect("known device");
//!
//! let framer = Framer::new(CacheDirs::under("/tmp/deviceframe"))?;
//! let screenshot = std::fs::read("screenshot.png")?;
//! let png = framer
//!     .composite(ContentSource::from(screenshot), frame, CompositeOptions::default())
//!     .await?;
//! std::fs::write("framed.png", &png)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Decisions
//!
//! ## Cover, not letterbox
//!
//! The fit engine always scales content to fully cover the placement window,
//! cropping the axis that does not fit. Frame windows are typically near the
//! content's native aspect ratio, so the crop is small — and a visible gap
//! inside a bezel looks broken in a way a slight crop does not.
//!
//! ## One driver, two adapters
//!
//! [`Framer::composite`](pipeline::Framer::composite) and
//! [`Framer::composite_stream`](pipeline::Framer::composite_stream) are thin
//! adapters over the same internal driver, so promise-style and
//! event-stream consumers observe identical stage behavior. Either way a
//! request gets exactly one terminal outcome and no partial results.
//!
//! ## Explicit cache configuration
//!
//! Cache locations are a plain [`CacheDirs`] value threaded through the
//! [`Framer`] constructor rather than process globals, so tests run against
//! isolated temporary directories.

pub mod cache;
pub mod capture;
pub mod catalog;
pub mod compose;
pub mod error;
pub mod fit;
pub mod pipeline;
pub mod source;

pub use cache::{CacheDirs, FrameDownloader};
pub use catalog::{Catalog, CatalogError, FrameDescriptor, FrameWindow};
pub use error::FrameError;
pub use fit::{CompositePosition, FitPlan, plan_fit};
pub use pipeline::{CompositeOptions, CompositeStream, FrameEvent, Framer};
pub use source::ContentSource;
