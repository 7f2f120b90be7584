//! Image encoding: pages and uploaded photos → base64 `ImageData`.
//!
//! Rasterised PDF pages are encoded as lossless PNG. Uploaded photos are sent
//! as-is, and only their MIME type is sniffed from the bytes, because
//! re-encoding a phone JPEG as PNG multiplies its size without adding detail.

use crate::error::TimetableError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as a base64 PNG ready for the vision API.
pub fn encode_page(img: &DynamicImage, detail: &str) -> Result<ImageData, TimetableError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| TimetableError::ImageEncodingFailed(e.to_string()))?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail(detail))
}

/// Wrap raw image bytes, preferring the sniffed MIME type over `fallback_mime`.
pub fn encode_image_bytes(
    bytes: &[u8],
    fallback_mime: &str,
    detail: &str,
) -> Result<ImageData, TimetableError> {
    if bytes.is_empty() {
        return Err(TimetableError::ImageEncodingFailed("image file is empty".into()));
    }
    let mime = sniff_mime(bytes).unwrap_or(fallback_mime);
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} image → {} bytes base64", mime, b64.len());
    Ok(ImageData::new(b64, mime).with_detail(detail))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}
