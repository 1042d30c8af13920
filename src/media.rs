//! Image validation and filesystem storage for recipe images.
//!
//! Uploaded bytes are format-detected from magic bytes and fully decoded
//! before anything touches disk. Stored files live under the media root as
//! `recipes/<uuid>.<ext>`; the recipe row keeps only that relative path.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader};
use uuid::Uuid;

pub const MAX_FILE_SIZE: usize = 2 * 1024 * 1024;

pub const ALLOWED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Detect and fully decode an uploaded image. Returns the detected format.
pub fn validate_image(data: &[u8]) -> Result<ImageFormat, String> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let format = reader
        .format()
        .ok_or_else(|| "Could not detect image format".to_string())?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    reader
        .decode()
        .map_err(|e| format!("Failed to decode image: {}", e))?;

    Ok(format)
}

/// Write image bytes under the media root. Returns the stored relative path.
pub fn store_image(
    media_root: &Path,
    data: &[u8],
    format: ImageFormat,
) -> std::io::Result<String> {
    let ext = format.extensions_str().first().copied().unwrap_or("bin");
    let relative = format!("recipes/{}.{}", Uuid::new_v4(), ext);
    let full = media_root.join(&relative);

    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full, data)?;

    Ok(relative)
}

/// Remove a previously stored image. Missing files are not an error.
pub fn remove_image(media_root: &Path, relative: &str) {
    let full = media_root.join(relative);
    if let Err(e) = fs::remove_file(&full) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove image {}: {}", full.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn temp_media_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("skillet-media-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_validate_accepts_png() {
        assert_eq!(validate_image(&sample_png()).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_validate_rejects_non_image_bytes() {
        assert!(validate_image(b"definitely not an image").is_err());
    }

    #[test]
    fn test_validate_rejects_truncated_image() {
        let mut data = sample_png();
        data.truncate(20);
        assert!(validate_image(&data).is_err());
    }

    #[test]
    fn test_store_and_remove_round_trip() {
        let root = temp_media_root();
        let relative = store_image(&root, &sample_png(), ImageFormat::Png).unwrap();

        assert!(relative.starts_with("recipes/"));
        assert!(relative.ends_with(".png"));
        assert!(root.join(&relative).exists());

        remove_image(&root, &relative);
        assert!(!root.join(&relative).exists());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_remove_missing_file_is_silent() {
        let root = temp_media_root();
        remove_image(&root, "recipes/does-not-exist.png");
        fs::remove_dir_all(&root).unwrap();
    }
}
