use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Lecture de la piste audio d'une vidéo via `ffplay -nodisp`.
///
/// Démarre avec la vidéo, sans synchronisation fine ; le processus est
/// tué quand la valeur est libérée (fin de session, arrêt, erreur).
pub struct AudioPlayback {
    child: Child,
}

impl AudioPlayback {
    /// Start playing the soundtrack of `path`.
    ///
    /// # Errors
    /// Returns an error if ffplay cannot be started.
    pub fn start(path: &Path) -> Result<Self> {
        let child = Command::new("ffplay")
            .args(playback_args(path)?)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Impossible de lancer ffplay. Vérifiez qu'il est installé et dans le PATH.")?;
        log::info!("Audio: lecture de {}", path.display());
        Ok(Self { child })
    }

    /// Start playback, logging instead of failing: audio is optional.
    #[must_use]
    pub fn try_start(path: &Path) -> Option<Self> {
        match Self::start(path) {
            Ok(playback) => Some(playback),
            Err(e) => {
                log::warn!("Audio désactivé : {e:#}");
                None
            }
        }
    }
}

impl Drop for AudioPlayback {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        log::debug!("Audio: arrêté");
    }
}

fn playback_args(path: &Path) -> Result<Vec<String>> {
    let path_str = path.to_str().context("Chemin audio invalide (non-UTF8)")?;
    Ok([
        "-nodisp",
        "-autoexit",
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
    fn playback_has_no_window_and_exits_at_end() {
        let args = playback_args(Path::new("clip.mp4")).unwrap();
        assert_eq!(args.first().map(String::as_str), Some("-nodisp"));
        assert!(args.iter().any(|a| a == "-autoexit"));
        assert_eq!(args.last().map(String::as_str), Some("clip.mp4"));
    }
}
