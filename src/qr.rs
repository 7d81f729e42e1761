//! QR payload rendering.
//!
//! Turns the hub's QR payload into an inline `data:image/png;base64,…` URI
//! suitable for embedding in the confirmation email. The module matrix is
//! scaled to roughly 200px with a 2-module quiet zone. Failures here are
//! best-effort from the pipeline's point of view: the email goes out without
//! an image.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use std::io::Cursor;
use thiserror::Error;

/// Target edge length of the rendered image, in pixels.
const TARGET_SIZE: u32 = 200;
/// Quiet-zone width, in modules.
const MARGIN: u32 = 2;

/// Errors from QR rendering.
#[derive(Debug, Error)]
pub enum QrError {
    /// The payload could not be encoded as a QR symbol.
    #[error("QR encoding failed: {0}")]
    Encode(String),
    /// The module matrix could not be rendered to PNG.
    #[error("QR rendering failed: {0}")]
    Render(String),
}

/// Render `payload` as a PNG data URI.
///
/// # Errors
///
/// [`QrError::Encode`] if the payload exceeds QR capacity,
/// [`QrError::Render`] if PNG encoding fails.
pub fn qr_data_uri(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;
    let modules = code.to_colors();
    let width = u32::try_from(code.width()).map_err(|e| QrError::Encode(e.to_string()))?;

    let framed = width + 2 * MARGIN;
    let scale = (TARGET_SIZE / framed).max(1);
    let size = framed * scale;

    let mut img = GrayImage::from_pixel(size, size, Luma([255]));
    for (index, color) in modules.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let index = u32::try_from(index).map_err(|e| QrError::Render(e.to_string()))?;
        let module_x = (index % width + MARGIN) * scale;
        let module_y = (index / width + MARGIN) * scale;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(module_x + dx, module_y + dy, Luma([0]));
            }
        }
    }

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| QrError::Render(e.to_string()))?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
