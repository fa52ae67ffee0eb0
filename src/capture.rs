//! Screenshot acquirer: turn a URL into frame-ready raster bytes.
//!
//! The URL is fetched first with no encoding transform. If it already points
//! at an image resource (`image/*` content type), its bytes pass through
//! verbatim. Otherwise the URL is treated as a web page and rendered in a
//! headless Chrome at the frame's logical viewport size, then the capture is
//! re-rendered to exactly that size: scaled to the viewport width with the
//! height following the aspect ratio, and hard-cropped at the top-left
//! corner. A page whose rendered height differs from the target therefore
//! still produces a frame-ready raster.
//!
//! Capture failures abort the pipeline immediately; there are no retries.

use crate::catalog::FrameDescriptor;
use crate::error::FrameError;
use bytes::Bytes;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions};
use image::ImageFormat;
use image::imageops::FilterType;
use std::io::Cursor;
use std::time::Duration;
use url::Url;

/// User agent presented to captured pages.
///
/// TODO: choose a per-device user agent, or store one with each frame.
const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 9_1 like Mac OS X) \
     AppleWebKit/601.1.46 (KHTML, like Gecko) Version/9.0 Mobile/13B143 Safari/601.1";

/// Fetch a URL and produce content bytes sized for the given frame.
pub async fn capture(
    client: &reqwest::Client,
    url: &Url,
    frame: &FrameDescriptor,
    delay: Duration,
) -> Result<Bytes, FrameError> {
    let response = client.get(url.clone()).send().await?.error_for_status()?;

    let is_image = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_image_content_type);

    let body = response.bytes().await?;
    if is_image {
        // The URL already points at an image; no capture needed.
        tracing::debug!(%url, "fetched image resource directly");
        return Ok(body);
    }

    let (w, h) = viewport(frame)?;
    tracing::debug!(%url, width = w, height = h, "capturing page screenshot");

    let page_url = url.clone();
    let shot =
        tokio::task::spawn_blocking(move || capture_page(&page_url, w, h, delay)).await??;

    into_viewport(&shot, w, h)
}

/// Whether a `Content-Type` header value names an image resource.
fn is_image_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .starts_with("image/")
}

/// Logical viewport for a frame: the placement window scaled down by the
/// device pixel ratio, floored.
fn viewport(frame: &FrameDescriptor) -> Result<(u32, u32), FrameError> {
    if frame.pixel_ratio <= 0.0 {
        return Err(FrameError::FrameConfig(format!(
            "pixel ratio must be positive, got {}",
            frame.pixel_ratio
        )));
    }

    let w = (f64::from(frame.frame.width) / frame.pixel_ratio).floor() as u32;
    let h = (f64::from(frame.frame.height) / frame.pixel_ratio).floor() as u32;
    if w == 0 || h == 0 {
        return Err(FrameError::FrameConfig(format!(
            "viewport collapsed to {w}x{h} for window {}x{} at pixel ratio {}",
            frame.frame.width, frame.frame.height, frame.pixel_ratio
        )));
    }

    Ok((w, h))
}

/// Drive a headless Chrome to screenshot a page. Blocking; runs on the
/// blocking pool.
fn capture_page(url: &Url, width: u32, height: u32, delay: Duration) -> Result<Vec<u8>, FrameError> {
    let err = |e: anyhow::Error| FrameError::Capture(e.to_string());

    let browser = Browser::new(LaunchOptions {
        window_size: Some((width, height)),
        ..Default::default()
    })
    .map_err(err)?;

    let tab = browser.new_tab().map_err(err)?;
    tab.set_user_agent(MOBILE_UA, None, None).map_err(err)?;
    tab.navigate_to(url.as_str())
        .and_then(|tab| tab.wait_until_navigated())
        .map_err(err)?;

    if !delay.is_zero() {
        std::thread::sleep(delay);
    }

    tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        .map_err(err)
}

/// Re-render captured bytes to exactly `(width, height)`: scale to the
/// target width with the height derived from aspect ratio, then crop at the
/// top-left, discarding overflow below and to the right.
fn into_viewport(bytes: &[u8], width: u32, height: u32) -> Result<Bytes, FrameError> {
    let img = image::load_from_memory(bytes).map_err(FrameError::Decode)?;

    let scaled_h = (f64::from(img.height()) * f64::from(width) / f64::from(img.width()))
        .round()
        .max(1.0) as u32;
    let img = img
        .resize_exact(width, scaled_h, FilterType::Lanczos3)
        .crop_imm(0, 0, width, height);

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(FrameError::Encoding)?;
    Ok(Bytes::from(out.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FrameWindow;

    fn frame(width: u32, height: u32, pixel_ratio: f64) -> FrameDescriptor {
        FrameDescriptor {
            device: "Test Phone".into(),
            name: "Test Phone".into(),
            shadow: false,
            rel_path: "test-phone/black.png".into(),
            pixel_ratio,
            frame: FrameWindow {
                width,
                height,
                left: 0,
                top: 0,
            },
        }
    }

    // =========================================================================
    // Content-type detection
    // =========================================================================

    #[test]
    fn image_content_types_detected() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("image/webp; charset=binary"));
    }

    #[test]
    fn non_image_content_types_rejected() {
        assert!(!is_image_content_type("text/html; charset=utf-8"));
        assert!(!is_image_content_type("application/octet-stream"));
        assert!(!is_image_content_type(""));
    }

    // =========================================================================
    // Viewport math
    // =========================================================================

    #[test]
    fn viewport_divides_by_pixel_ratio() {
        assert_eq!(viewport(&frame(750, 1334, 2.0)).unwrap(), (375, 667));
    }

    #[test]
    fn viewport_floors_fractional_ratios() {
        // 1080 / 2.6 = 415.38…, 1920 / 2.6 = 738.46…
        assert_eq!(viewport(&frame(1080, 1920, 2.6)).unwrap(), (415, 738));
    }

    #[test]
    fn viewport_unit_ratio_passes_through() {
        assert_eq!(viewport(&frame(320, 480, 1.0)).unwrap(), (320, 480));
    }

    #[test]
    fn nonpositive_pixel_ratio_is_config_error() {
        assert!(matches!(
            viewport(&frame(750, 1334, 0.0)),
            Err(FrameError::FrameConfig(_))
        ));
        assert!(matches!(
            viewport(&frame(750, 1334, -1.5)),
            Err(FrameError::FrameConfig(_))
        ));
    }

    #[test]
    fn collapsed_viewport_is_config_error() {
        assert!(matches!(
            viewport(&frame(1, 1334, 4.0)),
            Err(FrameError::FrameConfig(_))
        ));
    }

    // =========================================================================
    // Re-render to viewport
    // =========================================================================

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgba8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn tall_capture_cropped_to_viewport() {
        // A full-page capture taller than the viewport gets scaled to the
        // target width and cropped to the target height.
        let out = into_viewport(&png_bytes(100, 400), 50, 80).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (50, 80));
    }

    #[test]
    fn short_capture_keeps_viewport_width() {
        let out = into_viewport(&png_bytes(200, 100), 100, 80).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.width(), 100);
        assert!(img.height() <= 80);
    }

    #[test]
    fn malformed_capture_is_decode_error() {
        assert!(matches!(
            into_viewport(b"not a png", 50, 80),
            Err(FrameError::Decode(_))
        ));
    }

    // =========================================================================
    // Image passthrough
    // =========================================================================

    /// One-shot HTTP server answering every request with the given body.
    async fn serve_once(content_type: &str, body: Vec<u8>) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            content_type,
            body.len()
        );

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
        });

        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[tokio::test]
    async fn image_resource_passes_through_verbatim() {
        let body = b"\x89PNG fake image payload".to_vec();
        let url = serve_once("image/png", body.clone()).await;

        let bytes = capture(
            &reqwest::Client::new(),
            &url,
            &frame(750, 1334, 2.0),
            Duration::ZERO,
        )
        .await
        .unwrap();

        // No capture, no re-render: the fetched bytes come back unmodified.
        assert_eq!(&bytes[..], &body[..]);
    }

    #[tokio::test]
    async fn http_error_status_is_fetch_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
        });

        let url = Url::parse(&format!("http://{addr}/missing")).unwrap();
        let err = capture(
            &reqwest::Client::new(),
            &url,
            &frame(750, 1334, 2.0),
            Duration::ZERO,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FrameError::Fetch(_)));
    }
}
