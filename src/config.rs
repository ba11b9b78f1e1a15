use serde::Deserialize;

use crate::error::{AppError, Result};

/// Lato del quadrato di output in pixel
pub const DEFAULT_TARGET_SIZE: u32 = 4000;

/// Qualità JPEG su scala 0-1
pub const DEFAULT_QUALITY: f32 = 0.92;

/// Lato massimo accettato dall'encoder JPEG
pub const MAX_TARGET_SIZE: u32 = u16::MAX as u32;

/// Capacità del broadcast channel per gli eventi della coda
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target_size: u32,
    pub quality: f32,
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            quality: DEFAULT_QUALITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    pub fn with_target_size(mut self, target_size: u32) -> Self {
        self.target_size = target_size;
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(AppError::InvalidConfig(
                "target_size deve essere maggiore di zero".to_string(),
            ));
        }
        if self.target_size > MAX_TARGET_SIZE {
            return Err(AppError::InvalidConfig(format!(
                "target_size oltre il limite JPEG di {}: {}",
                MAX_TARGET_SIZE, self.target_size
            )));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(AppError::InvalidConfig(format!(
                "quality fuori range (0, 1]: {}",
                self.quality
            )));
        }
        if self.event_capacity == 0 {
            return Err(AppError::InvalidConfig(
                "event_capacity deve essere maggiore di zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Qualità per l'encoder JPEG (1-100)
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

// Formati supportati
pub mod formats {
    /// Estensioni accettate in ingresso (case-insensitive)
    pub const IMAGE_INPUT: &[&str] = &[
        "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic",
    ];

    /// Prefisso del content-type dichiarato che basta per accettare un file
    pub const IMAGE_MIME_PREFIX: &str = "image/";

    /// Estensione fissa dell'output
    pub const OUTPUT_EXTENSION: &str = "jpg";

    pub fn is_supported_image_input(ext: &str) -> bool {
        IMAGE_INPUT.contains(&ext.to_lowercase().as_str())
    }
}
