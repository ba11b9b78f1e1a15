//! Content-type utilities for queued images and converted output

/// Content-type shown when a file did not declare one
pub const GENERIC_IMAGE_TYPE: &str = "image/*";

/// Get the MIME content-type for an image extension
///
/// # Arguments
/// * `format` - The file extension (e.g., "png", "jpg", "heic")
///
/// # Returns
/// The corresponding MIME type string
pub fn get_content_type(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// The declared content-type, or the generic image type when missing or blank
pub fn declared_content_type(content_type: Option<&str>) -> &str {
    content_type
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(GENERIC_IMAGE_TYPE)
}
