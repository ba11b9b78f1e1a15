use bytes::Bytes;
use image::DynamicImage;

use crate::config::{formats, Config};
use crate::error::{AppError, Result};
use crate::handlers::image::{decode_image, letterbox, Placement};
use crate::models::SourceFile;
use crate::utils::{encode_jpeg, get_content_type, output_file_name};

/// Immagine convertita, pronta per anteprima e download
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Bytes,
    pub size: u32,
    pub placement: Placement,
}

impl EncodedImage {
    pub fn content_type(&self) -> &'static str {
        get_content_type(formats::OUTPUT_EXTENSION)
    }
}

/// Motore di conversione: decodifica, letterbox su quadrato bianco, JPEG.
/// Non ha stato condiviso; ogni fase è esposta separatamente per poter
/// riportare l'avanzamento tra una fase e l'altra.
#[derive(Debug, Clone, Copy)]
pub struct ConversionEngine {
    target_size: u32,
    quality: u8,
}

impl ConversionEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            target_size: config.target_size,
            quality: config.jpeg_quality(),
        }
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        decode_image(data)
    }

    pub fn render(&self, img: &DynamicImage) -> (DynamicImage, Placement) {
        letterbox(img, self.target_size)
    }

    pub fn encode(&self, canvas: &DynamicImage, placement: Placement) -> Result<EncodedImage> {
        let data = encode_jpeg(canvas, self.quality)?;
        Ok(EncodedImage {
            data: Bytes::from(data),
            size: self.target_size,
            placement,
        })
    }

    /// Conversione completa e sincrona dei byte sorgente
    pub fn convert_bytes(&self, data: &[u8]) -> Result<EncodedImage> {
        let img = self.decode(data)?;
        let (canvas, placement) = self.render(&img);
        self.encode(&canvas, placement)
    }

    /// Legge la sorgente e converte fuori dal thread async
    pub async fn convert(&self, source: &SourceFile) -> Result<EncodedImage> {
        let data = source.read().await?;
        let engine = *self;
        tokio::task::spawn_blocking(move || engine.convert_bytes(&data))
            .await
            .map_err(|e| AppError::Internal(format!("Task di conversione interrotto: {}", e)))?
    }

    pub fn output_name(&self, original_name: &str) -> String {
        output_file_name(original_name, self.target_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn engine(size: u32) -> ConversionEngine {
        ConversionEngine::new(&Config::default().with_target_size(size))
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_convert_bytes_produces_square_jpeg() {
        let encoded = engine(64).convert_bytes(&png_bytes(120, 60)).unwrap();
        assert_eq!(encoded.content_type(), "image/jpeg");
        assert_eq!(encoded.placement.draw_width, 64);
        assert_eq!(encoded.placement.draw_height, 32);

        let decoded = image::load_from_memory_with_format(&encoded.data, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
        // banda superiore bianca (JPEG è lossy)
        let corner = decoded.to_rgb8().get_pixel(2, 2).0;
        assert!(corner.iter().all(|c| *c > 240), "{corner:?}");
    }

    #[test]
    fn test_convert_bytes_decode_error() {
        let err = engine(64).convert_bytes(b"\x89PNG broken").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[tokio::test]
    async fn test_convert_source() {
        let source = SourceFile::from_bytes("tall.png", Some("image/png"), png_bytes(10, 40));
        let encoded = engine(32).convert(&source).await.unwrap();
        assert_eq!(encoded.placement.draw_height, 32);
        assert_eq!(encoded.placement.offset_x, 12);
    }

    #[test]
    fn test_output_name_uses_target_size() {
        assert_eq!(engine(4000).output_name("photo.png"), "photo_4000.jpg");
        assert_eq!(engine(512).output_name("photo.PNG"), "photo_512.jpg");
    }
}
