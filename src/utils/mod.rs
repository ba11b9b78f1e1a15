pub mod content_type;
pub mod encoding;
pub mod file;
pub mod validation;

pub use content_type::{declared_content_type, get_content_type};
pub use encoding::encode_jpeg;
pub use file::*;
pub use validation::validate_image_file;
