use anyhow::{Context, Result};
use ca_core::config::RenderMode;
use ca_core::frame::FrameBuffer;
use ca_core::traits::Exporter;
use std::path::{Path, PathBuf};

use crate::muxer::Mp4Muxer;
use crate::snapshot::save_image;

/// FPS d'enregistrement quand la source n'en annonce pas.
pub const DEFAULT_RECORD_FPS: f64 = 25.0;

/// Exporteur des sessions : snapshots numérotés et un enregistrement MP4
/// ouvert à la première frame.
///
/// Mettre l'enregistrement en pause puis le reprendre continue le même
/// fichier. Le MP4 n'est valide qu'après [`Exporter::finish`].
pub struct MediaExporter {
    output_dir: PathBuf,
    mode: RenderMode,
    fps: f64,
    video_path: Option<PathBuf>,
    image_path: Option<PathBuf>,
    muxer: Option<Mp4Muxer>,
}

impl MediaExporter {
    /// Exporter writing into `output_dir`; names carry the render mode.
    #[must_use]
    pub fn new(output_dir: &Path, mode: RenderMode, fps: f64) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            mode,
            fps,
            video_path: None,
            image_path: None,
            muxer: None,
        }
    }

    /// Record into `path` instead of `<dir>/charart_<mode>.mp4`.
    #[must_use]
    pub fn with_video_path(mut self, path: PathBuf) -> Self {
        self.video_path = Some(path);
        self
    }

    /// Write snapshots to `path` (overwritten) instead of numbered files.
    #[must_use]
    pub fn with_image_path(mut self, path: PathBuf) -> Self {
        self.image_path = Some(path);
        self
    }

    /// Target of the recording.
    #[must_use]
    pub fn video_path(&self) -> PathBuf {
        self.video_path.clone().unwrap_or_else(|| {
            self.output_dir
                .join(format!("charart_{}.mp4", self.mode.as_str()))
        })
    }

    /// Next free `<dir>/charart_<mode>_NNN.png`.
    fn next_snapshot_path(&self) -> PathBuf {
        let mut n: u32 = 1;
        loop {
            let path = self
                .output_dir
                .join(format!("charart_{}_{n:03}.png", self.mode.as_str()));
            if !path.exists() {
                return path;
            }
            n += 1;
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer {}", parent.display()))?;
    }
    Ok(())
}

impl Exporter for MediaExporter {
    fn write_frame(&mut self, canvas: &FrameBuffer) -> Result<()> {
        let muxer = match self.muxer.take() {
            Some(m) => m,
            None => {
                let path = self.video_path();
                ensure_parent(&path)?;
                Mp4Muxer::new(&path, canvas.width, canvas.height, self.fps)?
            }
        };
        self.muxer.insert(muxer).write_frame(canvas)
    }

    fn write_image(&mut self, canvas: &FrameBuffer) -> Result<PathBuf> {
        let path = match &self.image_path {
            Some(p) => p.clone(),
            None => self.next_snapshot_path(),
        };
        ensure_parent(&path)?;
        save_image(canvas, &path)?;
        Ok(path)
    }

    fn finish(&mut self) -> Result<()> {
        match self.muxer.take() {
            Some(muxer) => muxer.finish(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_are_numbered_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut exporter = MediaExporter::new(&out, RenderMode::GrayBlock, 25.0);
        let canvas = FrameBuffer::new(4, 4);
        let a = exporter.write_image(&canvas).unwrap();
        let b = exporter.write_image(&canvas).unwrap();
        assert_eq!(a, out.join("charart_gray-block_001.png"));
        assert_eq!(b, out.join("charart_gray-block_002.png"));
        assert!(a.is_file() && b.is_file());
    }

    #[test]
    fn explicit_image_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("art.jpg");
        let mut exporter = MediaExporter::new(dir.path(), RenderMode::ColorGlyph, 25.0)
            .with_image_path(target.clone());
        assert_eq!(exporter.write_image(&FrameBuffer::new(2, 2)).unwrap(), target);
        assert!(target.is_file());
    }

    #[test]
    fn finish_without_recording_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = MediaExporter::new(dir.path(), RenderMode::ColorBlock, 25.0);
        exporter.finish().unwrap();
        assert_eq!(
            exporter.video_path(),
            dir.path().join("charart_color-block.mp4")
        );
        assert!(!exporter.video_path().exists());
    }
}
