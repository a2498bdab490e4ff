//! Image loading, cropping, and extension-dispatched saving.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use log::info;

use crate::geometry::CropRect;

/// Error types for image load, crop, and save operations.
#[derive(Debug)]
pub enum ImageIoError {
    /// Unreadable or unsupported image file.
    Decode(image::ImageError),
    /// Encoding or writing the output file failed.
    Encode(image::ImageError),
    /// Filesystem error, e.g. creating the destination directory.
    Io(io::Error),
    /// Destination extension has no matching encoder.
    UnsupportedFormat(String),
    /// Selection rectangle exceeds the source image bounds.
    OutOfBounds {
        rect: CropRect,
        width: u32,
        height: u32,
    },
}

impl fmt::Display for ImageIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageIoError::Decode(e) => write!(f, "Could not read image: {}", e),
            ImageIoError::Encode(e) => write!(f, "Could not write image: {}", e),
            ImageIoError::Io(e) => write!(f, "I/O error: {}", e),
            ImageIoError::UnsupportedFormat(ext) => {
                write!(f, "Unsupported output format: \"{}\"", ext)
            }
            ImageIoError::OutOfBounds { rect, width, height } => write!(
                f,
                "Selection {}x{} at ({}, {}) exceeds image bounds {}x{}",
                rect.width, rect.height, rect.x, rect.y, width, height
            ),
        }
    }
}

impl std::error::Error for ImageIoError {}

impl From<io::Error> for ImageIoError {
    fn from(error: io::Error) -> Self {
        ImageIoError::Io(error)
    }
}

/// Result type for image I/O operations.
pub type ImageIoResult<T> = Result<T, ImageIoError>;

/// File extensions accepted by both the open and save dialogs.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Decodes a file into an in-memory bitmap.
pub fn load_image(path: &Path) -> ImageIoResult<DynamicImage> {
    let img = image::open(path).map_err(ImageIoError::Decode)?;
    info!(
        "loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Cuts the selection out of the source image.
///
/// The rectangle must be non-empty and lie fully inside the image; a pointer
/// released outside the rendered image produces one that does not.
pub fn crop_region(image: &DynamicImage, rect: CropRect) -> ImageIoResult<DynamicImage> {
    if !rect.fits_within(image.width(), image.height()) {
        return Err(ImageIoError::OutOfBounds {
            rect,
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image.crop_imm(
        rect.x as u32,
        rect.y as u32,
        rect.width as u32,
        rect.height as u32,
    ))
}

fn format_for_extension(path: &Path) -> ImageIoResult<ImageFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "bmp" => Ok(ImageFormat::Bmp),
        other => Err(ImageIoError::UnsupportedFormat(other.to_string())),
    }
}

/// Encodes the image to `path`, picking the encoder from the file extension.
///
/// The extension is validated before anything touches the disk, so a bad
/// extension never leaves a file behind. The destination directory is created
/// if it does not exist yet.
pub fn save_image(image: &DynamicImage, path: &Path) -> ImageIoResult<()> {
    let format = format_for_extension(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .save_with_format(path, format)
            .map_err(ImageIoError::Encode)?,
        _ => image
            .save_with_format(path, format)
            .map_err(ImageIoError::Encode)?,
    }

    info!("saved crop to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelPoint;
    use std::path::PathBuf;

    fn test_image() -> DynamicImage {
        let mut img = image::RgbaImage::new(10, 10);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgba([x as u8 * 20, y as u8 * 20, 0, 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quickcrop_test_{}", name))
    }

    #[test]
    fn crop_cuts_the_requested_region() {
        let rect = CropRect::from_points(PixelPoint::new(2, 3), PixelPoint::new(6, 8));
        let cropped = crop_region(&test_image(), rect).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (4, 5));
    }

    #[test]
    fn crop_is_deterministic_for_identical_selections() {
        let image = test_image();
        let rect = CropRect::from_points(PixelPoint::new(1, 1), PixelPoint::new(7, 6));
        let first = crop_region(&image, rect).unwrap();
        let second = crop_region(&image, rect).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn crop_outside_bounds_is_rejected() {
        let rect = CropRect::from_points(PixelPoint::new(5, 5), PixelPoint::new(15, 15));
        let err = crop_region(&test_image(), rect).unwrap_err();
        assert!(matches!(err, ImageIoError::OutOfBounds { .. }));

        let rect = CropRect::from_points(PixelPoint::new(-2, 0), PixelPoint::new(4, 4));
        let err = crop_region(&test_image(), rect).unwrap_err();
        assert!(matches!(err, ImageIoError::OutOfBounds { .. }));
    }

    #[test]
    fn save_with_unsupported_extension_creates_no_file() {
        let path = temp_path("unsupported.gif");
        let _ = fs::remove_file(&path);

        let err = save_image(&test_image(), &path).unwrap_err();
        assert!(matches!(err, ImageIoError::UnsupportedFormat(ext) if ext == "gif"));
        assert!(!path.exists());
    }

    #[test]
    fn save_without_any_extension_is_unsupported() {
        let path = temp_path("no_extension");
        let err = save_image(&test_image(), &path).unwrap_err();
        assert!(matches!(err, ImageIoError::UnsupportedFormat(ext) if ext.is_empty()));
        assert!(!path.exists());
    }

    #[test]
    fn saved_png_round_trips_through_load() {
        let path = temp_path("roundtrip.png");
        let _ = fs::remove_file(&path);

        let image = test_image();
        save_image(&image, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (10, 10));
        assert_eq!(loaded.to_rgba8().as_raw(), image.to_rgba8().as_raw());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_creates_missing_destination_directory() {
        let dir = temp_path("nested_dir");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("inner").join("out.bmp");

        save_image(&test_image(), &path).unwrap();
        assert!(path.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn jpeg_save_accepts_images_with_alpha() {
        let path = temp_path("alpha.jpg");
        let _ = fs::remove_file(&path);

        save_image(&test_image(), &path).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (10, 10));

        let _ = fs::remove_file(&path);
    }
}
