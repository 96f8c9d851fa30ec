use ca_core::frame::FrameBuffer;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Encode des raw frames RGBA dans un fichier MP4 avec ffmpeg (lossless RGB).
pub struct Mp4Muxer {
    ffmpeg_child: Child,
    width: u32,
    height: u32,
    frames: u64,
}

impl Mp4Muxer {
    /// Crée un muxer vidéo `width × height` à `fps` images par seconde.
    ///
    /// x264 RGB avec `-crf 0` : les couleurs quantifiées restent exactes.
    /// Preset rapide, l'encodage suit la boucle de conversion.
    ///
    /// # Errors
    /// Retourne une erreur si ffmpeg n'est pas installé ou impossible à démarrer.
    pub fn new(output_path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        let args = encoder_args(output_path, width, height, fps)?;
        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context(
                "Échec de l'initialisation de l'encodeur vidéo ffmpeg. (Est-il dans PATH ?)",
            )?;

        log::info!(
            "Mp4Muxer: {} ({width}x{height} @ {fps:.2}fps)",
            output_path.display()
        );
        Ok(Self {
            ffmpeg_child: child,
            width,
            height,
            frames: 0,
        })
    }

    /// Ajoute une frame au flux.
    ///
    /// # Errors
    /// Retourne une erreur si la taille de la frame diffère de celle du flux
    /// ou si l'écriture dans le pipe échoue.
    pub fn write_frame(&mut self, fb: &FrameBuffer) -> Result<()> {
        if fb.width != self.width || fb.height != self.height {
            anyhow::bail!(
                "frame {}x{} dans un flux {}x{}",
                fb.width,
                fb.height,
                self.width,
                self.height
            );
        }
        let stdin = self
            .ffmpeg_child
            .stdin
            .as_mut()
            .context("pipe ffmpeg déjà fermé")?;
        stdin
            .write_all(&fb.data)
            .context("Écriture dans le pipe ffmpeg")?;
        self.frames += 1;
        Ok(())
    }

    /// Frames écrites jusqu'ici.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Ferme le flux et finalise l'exportation.
    ///
    /// # Errors
    /// Retourne une erreur si ffmpeg signale une erreur de terminaison.
    pub fn finish(mut self) -> Result<()> {
        drop(self.ffmpeg_child.stdin.take());

        let output = self.ffmpeg_child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg encoder error: {stderr}");
        }
        log::info!("Mp4Muxer: {} frames finalisées", self.frames);
        Ok(())
    }
}

fn encoder_args(output_path: &Path, width: u32, height: u32, fps: f64) -> Result<Vec<String>> {
    let path_str = output_path.to_str().context("Chemin invalide")?;
    let size = format!("{width}x{height}");
    let rate = format!("{fps:.3}");
    Ok([
        "-y",
        "-f",
        "rawvideo",
        "-vcodec",
        "rawvideo",
        "-s",
        size.as_str(),
        "-pix_fmt",
        "rgba",
        "-r",
        rate.as_str(),
        "-i",
        "-",
        "-c:v",
        "libx264rgb",
        "-crf",
        "0",
        "-preset",
        "ultrafast",
        "-pix_fmt",
        "rgb24",
        "-color_range",
        "pc",
        "-hide_banner",
        "-loglevel",
        "error",
        path_str,
    ]
    .iter()
    .map(ToString::to_string)
    .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_reads_rgba_at_the_requested_rate() {
        let args = encoder_args(Path::new("out.mp4"), 64, 48, 29.97).unwrap();
        let joined = args.join(" ");
        assert!(joined.contains("-s 64x48"));
        assert!(joined.contains("-pix_fmt rgba -r 29.970 -i -"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn muxer_rejects_mismatched_frames() {
        // Mp4Muxer::new dépend de la présence de ffmpeg : sans lui, rien à tester.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.mp4");
        let Ok(mut muxer) = Mp4Muxer::new(&path, 8, 8, 25.0) else {
            return;
        };
        assert!(muxer.write_frame(&FrameBuffer::new(4, 4)).is_err());
        assert_eq!(muxer.frames_written(), 0);
        let _ = muxer.finish();
    }
}
