use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use serde::Serialize;

use crate::error::{AppError, Result};

/// Colore di riempimento delle bande (bianco opaco)
const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Posizione dell'immagine scalata all'interno del quadrato
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub scale: f64,
    pub draw_width: u32,
    pub draw_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl Placement {
    /// Scala uniforme che fa entrare `width x height` nel quadrato senza ritagli,
    /// centrata su entrambi gli assi.
    pub fn fit(width: u32, height: u32, target_size: u32) -> Self {
        let target = target_size as f64;
        let scale = (target / width as f64).min(target / height as f64);

        // Almeno un pixel anche con proporzioni estreme
        let draw_width = ((width as f64 * scale).round() as u32).clamp(1, target_size);
        let draw_height = ((height as f64 * scale).round() as u32).clamp(1, target_size);

        let offset_x = ((target_size - draw_width) as f64 / 2.0).round() as u32;
        let offset_y = ((target_size - draw_height) as f64 / 2.0).round() as u32;

        Self {
            scale,
            draw_width,
            draw_height,
            offset_x,
            offset_y,
        }
    }
}

/// Decodifica i byte sorgente in un'immagine raster
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(data).map_err(|e| AppError::Decode(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(AppError::Decode("immagine senza dimensioni".to_string()));
    }

    Ok(img)
}

/// Disegna l'immagine centrata su un quadrato bianco `target_size x target_size`
pub fn letterbox(img: &DynamicImage, target_size: u32) -> (DynamicImage, Placement) {
    let (width, height) = img.dimensions();
    let placement = Placement::fit(width, height, target_size);

    let scaled = if (placement.draw_width, placement.draw_height) == (width, height) {
        img.to_rgba8()
    } else {
        img.resize_exact(
            placement.draw_width,
            placement.draw_height,
            FilterType::Lanczos3,
        )
        .to_rgba8()
    };

    let mut canvas = RgbaImage::from_pixel(target_size, target_size, FILL);
    // overlay fonde l'alpha sul bianco
    imageops::overlay(
        &mut canvas,
        &scaled,
        placement.offset_x as i64,
        placement.offset_y as i64,
    );

    (DynamicImage::ImageRgba8(canvas), placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_fit_landscape_example() {
        let p = Placement::fit(6000, 3000, 4000);
        assert!((p.scale - 4000.0 / 6000.0).abs() < 1e-9);
        assert_eq!((p.draw_width, p.draw_height), (4000, 2000));
        assert_eq!((p.offset_x, p.offset_y), (0, 1000));
    }

    #[test]
    fn test_fit_wide_images_fill_width() {
        for (w, h) in [(4000, 4000), (1920, 1080), (333, 100), (7, 3), (5000, 4999), (12, 1)] {
            let p = Placement::fit(w, h, 4000);
            assert_eq!(p.draw_width, 4000, "{w}x{h}");
            assert!(p.draw_height <= 4000);
            assert_eq!(p.offset_x, 0);
            let bottom = 4000 - p.offset_y - p.draw_height;
            assert!(p.offset_y.abs_diff(bottom) <= 1, "{w}x{h}: {p:?}");
        }
    }

    #[test]
    fn test_fit_portrait_and_upscale() {
        let p = Placement::fit(100, 200, 400);
        assert_eq!(p.scale, 2.0);
        assert_eq!((p.draw_width, p.draw_height), (200, 400));
        assert_eq!((p.offset_x, p.offset_y), (100, 0));
    }

    #[test]
    fn test_fit_extreme_ratio_keeps_one_pixel() {
        let p = Placement::fit(100_000, 1, 100);
        assert_eq!(p.draw_height, 1);
        assert_eq!(p.draw_width, 100);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_decode_png() {
        let data = png_bytes(DynamicImage::new_rgb8(3, 2));
        let img = decode_image(&data).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
    }

    #[test]
    fn test_letterbox_pads_with_white() {
        let black = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, image::Rgb([0, 0, 0])));
        let (canvas, placement) = letterbox(&black, 40);

        assert_eq!(canvas.dimensions(), (40, 40));
        assert_eq!((placement.offset_x, placement.offset_y), (0, 10));
        assert_eq!(canvas.get_pixel(0, 0), FILL);
        assert_eq!(canvas.get_pixel(20, 39), FILL);
        assert_eq!(canvas.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_letterbox_flattens_transparency_on_white() {
        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        let (canvas, _) = letterbox(&clear, 8);
        assert!(canvas.to_rgba8().pixels().all(|p| *p == FILL));
    }
}
