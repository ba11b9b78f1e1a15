use crate::config::formats;

/// Estensione in minuscolo (testo dopo l'ultimo punto), se presente
pub fn get_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
        .map(|ext| ext.to_lowercase())
}

/// Rimuove l'ultima estensione dal nome: `photo.png` -> `photo`, `a.tar.gz` -> `a.tar`
pub fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() && !filename[idx + 1..].contains('/') => {
            &filename[..idx]
        }
        _ => filename,
    }
}

/// Nome dell'output convertito: `photo.png` -> `photo_4000.jpg`
pub fn output_file_name(original: &str, target_size: u32) -> String {
    format!(
        "{}_{}.{}",
        strip_extension(original),
        target_size,
        formats::OUTPUT_EXTENSION
    )
}

pub fn get_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

/// Dimensione leggibile in base 1024, due decimali al massimo
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;

    format!("{} {}", rounded, UNITS[exp])
}
