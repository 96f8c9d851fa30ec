use std::path::PathBuf;

use ca_core::config::{ArtConfig, RenderMode};
use clap::{ArgGroup, Parser};

/// charart : convertit images, vidéos et caméra en art de caractères ou de blocs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["image", "video", "camera"])))]
pub struct Cli {
    /// Source visuelle : chemin vers une image (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source visuelle : chemin vers une vidéo (décodée par ffmpeg).
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Source visuelle : périphérique de capture (ex. /dev/video0, "0").
    #[arg(long, value_name = "DEV")]
    pub camera: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Mode de rendu : gray-glyph, color-glyph, gray-block, color-block.
    #[arg(long)]
    pub mode: Option<RenderMode>,

    /// Pas d'échantillonnage en pixels.
    #[arg(long)]
    pub cell_size: Option<u32>,

    /// Police TrueType/OpenType des modes glyphe.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Taille de police (pixels).
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Rampe de glyphes, du plus clair au plus dense.
    #[arg(long)]
    pub charset: Option<String>,

    /// Niveaux de quantification par canal.
    #[arg(long)]
    pub color_levels: Option<u32>,

    /// Ne pas lire la piste audio de la vidéo.
    #[arg(long, default_value_t = false)]
    pub no_audio: bool,

    /// Largeur maximale de la source (réduite au-delà).
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Fichier de sortie (image ou vidéo selon la source).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pas d'interface terminal : export direct vers --output.
    #[arg(long, default_value_t = false, requires = "output")]
    pub headless: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// La source visuelle choisie sur la ligne de commande.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceArg {
    Image(PathBuf),
    Video(PathBuf),
    Camera(String),
}

impl Cli {
    /// The single visual source (clap guarantees exactly one).
    ///
    /// # Errors
    /// Returns an error if no source was given.
    pub fn source(&self) -> anyhow::Result<SourceArg> {
        if let Some(path) = &self.image {
            Ok(SourceArg::Image(path.clone()))
        } else if let Some(path) = &self.video {
            Ok(SourceArg::Video(path.clone()))
        } else if let Some(device) = &self.camera {
            Ok(SourceArg::Camera(device.clone()))
        } else {
            anyhow::bail!("Aucune source visuelle spécifiée. Utilisez --image, --video ou --camera.")
        }
    }

    /// Apply the command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut ArtConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.cell_size.is_some() {
            config.cell_size = self.cell_size;
        }
        if self.font.is_some() {
            config.font_path.clone_from(&self.font);
        }
        if let Some(size) = self.font_size {
            config.font_size = size;
        }
        if self.charset.is_some() {
            config.charset.clone_from(&self.charset);
        }
        if let Some(levels) = self.color_levels {
            config.color_levels = levels;
        }
        if self.no_audio {
            config.play_audio = false;
        }
        if self.max_width.is_some() {
            config.max_width = self.max_width;
        }
    }
}
