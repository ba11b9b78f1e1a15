//! Shared image encoding utilities

use image::DynamicImage;
use std::io::Cursor;

use crate::error::{AppError, Result};

/// Encode a DynamicImage as baseline JPEG
///
/// # Arguments
/// * `img` - The image to encode; alpha is dropped, callers flatten it first
/// * `quality` - JPEG quality (1-100)
///
/// # Returns
/// The encoded bytes, or `AppError::Encode` if the encoder fails or writes nothing
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| AppError::Encode(e.to_string()))?;

    let data = buffer.into_inner();
    if data.is_empty() {
        return Err(AppError::Encode("l'encoder non ha prodotto dati".to_string()));
    }

    Ok(data)
}
