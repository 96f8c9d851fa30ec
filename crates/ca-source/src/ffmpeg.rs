// Ce module pilote ffmpeg/ffprobe en subprocess (std::process::Command),
// sans binding natif. Prérequis : `ffmpeg` et `ffprobe` dans le PATH.
//
// Architecture :
//   - `FfmpegInput`        : fichier vidéo ou périphérique caméra
//   - `probe`              : interroge ffprobe pour width/height/fps
//   - `parse_probe_output` : parse la sortie `key=value` de ffprobe
//   - `spawn_rgba_pipe`    : lance ffmpeg → flux raw RGBA sur stdout

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Format d'entrée ffmpeg des caméras sur cette plateforme.
#[cfg(target_os = "linux")]
pub const CAMERA_FORMAT: &str = "v4l2";
/// Format d'entrée ffmpeg des caméras sur cette plateforme.
#[cfg(target_os = "macos")]
pub const CAMERA_FORMAT: &str = "avfoundation";
/// Format d'entrée ffmpeg des caméras sur cette plateforme.
#[cfg(target_os = "windows")]
pub const CAMERA_FORMAT: &str = "dshow";
/// Format d'entrée ffmpeg des caméras sur cette plateforme.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const CAMERA_FORMAT: &str = "v4l2";

/// Ce que ffmpeg doit ouvrir.
///
/// # Example
/// ```
/// use ca_source::ffmpeg::FfmpegInput;
/// let cam = FfmpegInput::Camera("/dev/video0".into());
/// assert!(cam.is_live());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FfmpegInput {
    /// Fichier vidéo.
    File(PathBuf),
    /// Périphérique de capture (`/dev/video0`, `0`, `video=Integrated Camera`…).
    Camera(String),
}

impl FfmpegInput {
    /// Arguments d'entrée communs à ffprobe et ffmpeg (`[-f fmt] -i src`).
    ///
    /// # Errors
    /// Returns an error if a file path is not valid UTF-8.
    pub fn input_args(&self) -> Result<Vec<String>> {
        match self {
            Self::File(path) => {
                let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;
                Ok(vec!["-i".into(), path_str.into()])
            }
            Self::Camera(device) => Ok(vec![
                "-f".into(),
                CAMERA_FORMAT.into(),
                "-i".into(),
                device.clone(),
            ]),
        }
    }

    /// Source temps réel : pas de cadence imposée, pas d'audio.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Camera(_))
    }

    /// Nom lisible pour les logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Camera(device) => format!("caméra {device} ({CAMERA_FORMAT})"),
        }
    }
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamInfo {
    /// Largeur native.
    pub width: u32,
    /// Hauteur native.
    pub height: u32,
    /// Images par seconde (ex: 23.976, 25.0). `None` si ffprobe n'en donne pas.
    pub fps: Option<f64>,
}

/// Parse la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// Retourne `None` si la largeur ou la hauteur manque ou vaut 0.
///
/// # Example
/// ```
/// use ca_source::ffmpeg::parse_probe_output;
/// let info = parse_probe_output("width=640\nheight=360\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (640, 360));
/// assert!((info.fps.unwrap() - 29.97).abs() < 0.01);
/// ```
#[must_use]
pub fn parse_probe_output(text: &str) -> Option<StreamInfo> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut fps: Option<f64> = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001" ; "0/0" = inconnu
            let mut parts = val.trim().splitn(2, '/');
            let num: Option<f64> = parts.next().and_then(|s| s.parse().ok());
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            fps = num.filter(|n| *n > 0.0 && den > 0.0).map(|n| n / den);
        }
    }

    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(StreamInfo {
            width: w,
            height: h,
            fps,
        }),
        _ => None,
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si l'entrée
/// ne contient aucun flux vidéo décodable.
pub fn probe(input: &FfmpegInput) -> Result<StreamInfo> {
    let mut args: Vec<String> = [
        "-v",
        "quiet",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=width,height,r_frame_rate",
        "-of",
        "default=noprint_wrappers=1",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    args.extend(input.input_args()?);

    let output = Command::new("ffprobe")
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text).with_context(|| {
        format!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            input.describe()
        )
    })?;

    log::info!(
        "probe: {}x{} @ {} {}",
        info.width,
        info.height,
        info.fps
            .map_or_else(|| "? fps".to_string(), |f| format!("{f:.3}fps")),
        input.describe()
    );
    Ok(info)
}

/// Arguments ffmpeg complets d'un pipe RGBA `width × height` sur stdout.
///
/// `-an` : l'audio est lu séparément par ffplay.
///
/// # Errors
/// Returns an error if the input arguments cannot be built.
pub fn rgba_pipe_args(input: &FfmpegInput, width: u32, height: u32) -> Result<Vec<String>> {
    let scale = format!("scale={width}:{height}:flags=area");
    let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    args.extend(input.input_args()?);
    args.extend(
        [
            "-vf",
            scale.as_str(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-an",
            "pipe:1",
        ]
        .iter()
        .map(ToString::to_string),
    );
    Ok(args)
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `width × height × 4` bytes (RGBA row-major, sans padding).
///
/// # Errors
/// Returns an error if ffmpeg cannot be started.
pub fn spawn_rgba_pipe(input: &FfmpegInput, width: u32, height: u32) -> Result<Child> {
    let args = rgba_pipe_args(input, width, height)?;
    let child = Command::new("ffmpeg")
        .args(&args)
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Impossible de lancer ffmpeg. Vérifiez que ffmpeg est installé et dans le PATH.")?;
    log::debug!("ffmpeg spawné: {width}x{height} depuis {}", input.describe());
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_output_without_rate_has_no_fps() {
        let info = parse_probe_output("width=320\nheight=240\nr_frame_rate=0/0\n").unwrap();
        assert_eq!(info.fps, None);
    }

    #[test]
    fn probe_output_without_video_is_rejected() {
        assert!(parse_probe_output("").is_none());
        assert!(parse_probe_output("width=0\nheight=240\n").is_none());
        assert!(parse_probe_output("width=320\n").is_none());
    }

    #[test]
    fn camera_args_select_the_platform_format() {
        let args = FfmpegInput::Camera("0".into()).input_args().unwrap();
        assert_eq!(args, vec!["-f", CAMERA_FORMAT, "-i", "0"]);
    }

    #[test]
    fn pipe_args_scale_and_drop_audio() {
        let input = FfmpegInput::File(PathBuf::from("clip.mp4"));
        let args = rgba_pipe_args(&input, 640, 360).unwrap();
        let joined = args.join(" ");
        assert!(joined.contains("-i clip.mp4"));
        assert!(joined.contains("scale=640:360"));
        assert!(joined.contains("-pix_fmt rgba"));
        assert!(joined.ends_with("-an pipe:1"));
    }
}
