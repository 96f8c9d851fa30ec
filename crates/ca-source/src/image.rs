use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ca_core::error::CoreError;
use ca_core::frame::FrameBuffer;
use ca_core::resize::{fit_width, resize_frame};
use ca_core::traits::{Source, SourceKind};

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```no_run
/// use ca_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::open(Path::new("test.png"), None).unwrap();
/// ```
pub struct ImageSource {
    frame: Arc<FrameBuffer>,
}

impl ImageSource {
    /// Load an image from disk, downscaled to `max_width` if wider.
    ///
    /// # Errors
    /// Returns [`CoreError::FileNotFound`] if `path` does not exist, or an
    /// error if the image cannot be decoded.
    pub fn open(path: &Path, max_width: Option<u32>) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let frame = load_image(path)?;
        let (w, h) = fit_width(frame.width, frame.height, max_width);
        let frame = if (w, h) == (frame.width, frame.height) {
            frame
        } else {
            log::info!(
                "ImageSource: réduction {}x{} → {w}x{h}",
                frame.width,
                frame.height
            );
            resize_frame(&frame, w, h)?
        };
        Ok(Self {
            frame: Arc::new(frame),
        })
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        Some(Arc::clone(&self.frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Still
    }
}

/// Decode an image file into an opaque RGBA frame.
///
/// # Errors
/// Returns an error if the image cannot be loaded.
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(FrameBuffer::from_rgba(width, height, rgba.into_raw())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join("src.png");
        RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn still_source_repeats_its_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 8, 6);
        let mut source = ImageSource::open(&path, None).unwrap();
        assert_eq!(source.kind(), SourceKind::Still);
        assert_eq!(source.native_size(), (8, 6));
        let a = source.next_frame().unwrap();
        let b = source.next_frame().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.rgb(3, 3), [10, 200, 30]);
    }

    #[test]
    fn wide_images_are_downscaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 40, 20);
        let source = ImageSource::open(&path, Some(10)).unwrap();
        assert_eq!(source.native_size(), (10, 5));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ImageSource::open(Path::new("/nonexistent/none.png"), None)
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }
}
