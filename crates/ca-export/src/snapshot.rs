use anyhow::{Context, Result};
use ca_core::frame::FrameBuffer;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// Écrit `fb` en image ; le format suit l'extension (`.png`, `.jpg`, `.bmp`).
///
/// Le canvas est opaque : l'alpha est abandonné, ce qui rend le JPEG
/// possible.
///
/// # Errors
/// Returns an error if the extension is unknown or the file cannot be written.
///
/// # Example
/// ```no_run
/// use ca_core::frame::FrameBuffer;
/// use ca_export::snapshot::save_image;
/// save_image(&FrameBuffer::new(4, 4), std::path::Path::new("out.png")).unwrap();
/// ```
pub fn save_image(fb: &FrameBuffer, path: &Path) -> Result<()> {
    let rgba = RgbaImage::from_raw(fb.width, fb.height, fb.data.clone())
        .context("Buffer de frame incohérent")?;
    DynamicImage::ImageRgba8(rgba)
        .to_rgb8()
        .save(path)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.png");
        let mut fb = FrameBuffer::new(3, 2);
        fb.fill_rect(1, 0, 1, 1, [12, 34, 56]);
        save_image(&fb, &path).unwrap();
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(1, 0).0, [12, 34, 56]);
        assert_eq!(back.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn jpeg_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.jpg");
        save_image(&FrameBuffer::new(8, 8), &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_image(&FrameBuffer::new(2, 2), &dir.path().join("snap.xyz")).is_err());
    }
}
