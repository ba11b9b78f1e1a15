//! Validation of submitted files

use crate::config::formats;
use crate::error::{AppError, Result};
use crate::utils::file::get_extension;

/// Check that a submitted file looks like a supported image
///
/// A declared content-type starting with `image/` is enough; otherwise the
/// filename extension must be in the allow-list (case-insensitive).
///
/// # Arguments
/// * `name` - The original filename
/// * `content_type` - The declared content-type, if any
///
/// # Returns
/// Ok(()) if accepted, `AppError::UnsupportedFormat` with the file name if not
pub fn validate_image_file(name: &str, content_type: Option<&str>) -> Result<()> {
    let declared_image = content_type
        .map(|ct| ct.trim().to_lowercase())
        .is_some_and(|ct| ct.starts_with(formats::IMAGE_MIME_PREFIX));

    if declared_image {
        return Ok(());
    }

    match get_extension(name) {
        Some(ext) if formats::is_supported_image_input(&ext) => Ok(()),
        _ => Err(AppError::UnsupportedFormat(name.to_string())),
    }
}
