use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{GlyphRamp, MAX_GLYPHS, RAMP_COLOR, RAMP_GRAY};
use crate::error::CoreError;

/// Cellule par défaut des modes bloc (pixels).
pub const DEFAULT_BLOCK_SIZE: u32 = 7;

/// Borne haute de `color_levels` : la palette compte L³ entrées.
pub const MAX_COLOR_LEVELS: u32 = 64;

/// Borne haute du cache du mode glyphe couleur (N glyphes × L³ couleurs).
pub const MAX_GLYPH_STAMPS: usize = 262_144;

/// Ratio largeur de cellule / taille de police des modes glyphe.
const GLYPH_CELL_RATIO: f32 = 0.6;

/// Configuration complète d'une session de conversion.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use ca_core::config::{ArtConfig, RenderMode};
/// let config = ArtConfig::default();
/// assert_eq!(config.mode, RenderMode::ColorGlyph);
/// assert_eq!(config.cell_size(), 7);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ArtConfig {
    // === Rendu ===
    /// Mode de rendu : glyphe ou bloc, gris ou couleur.
    pub mode: RenderMode,
    /// Pas d'échantillonnage (pixels) sur les deux axes. `None` = dérivé du mode.
    pub cell_size: Option<u32>,
    /// Taille de police des stamps de glyphes (pixels).
    pub font_size: f32,
    /// Police TrueType/OpenType. `None` = recherche dans les polices système.
    pub font_path: Option<PathBuf>,
    /// Rampe de glyphes (du plus clair au plus dense). `None` = rampe du mode.
    pub charset: Option<String>,
    /// Niveaux de quantification par canal (L).
    pub color_levels: u32,
    /// FPS cible de l'affichage (images fixes).
    pub target_fps: u32,
    /// Diviseur de la prévisualisation source (4 = quart de la taille).
    pub preview_divisor: u32,

    // === Source ===
    /// Lire la piste audio de la vidéo pendant la conversion.
    pub play_audio: bool,
    /// Largeur maximale de la source ; au-delà elle est réduite.
    pub max_width: Option<u32>,

    // === Sortie ===
    /// Dossier des snapshots et enregistrements.
    pub output_dir: PathBuf,
    /// FPS de l'enregistrement. `None` = FPS de la source, ou 25.
    pub record_fps: Option<f64>,
}

/// The four conversion modes: {glyph, block} × {gray, color}.
///
/// # Example
/// ```
/// use ca_core::config::RenderMode;
/// let mode: RenderMode = "color-block".parse().unwrap();
/// assert!(mode.is_color());
/// assert!(!mode.is_glyph());
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Glyphes blancs choisis par luminance.
    GrayGlyph,
    /// Glyphes choisis par luminance, teintés de la couleur quantifiée.
    #[default]
    ColorGlyph,
    /// Blocs pleins en niveaux de gris quantifiés.
    GrayBlock,
    /// Blocs pleins de la couleur quantifiée.
    ColorBlock,
}

impl RenderMode {
    /// All modes, in display order.
    pub const ALL: [Self; 4] = [
        Self::GrayGlyph,
        Self::ColorGlyph,
        Self::GrayBlock,
        Self::ColorBlock,
    ];

    /// True for the glyph modes (stamps rendered from a font).
    #[must_use]
    pub fn is_glyph(self) -> bool {
        matches!(self, Self::GrayGlyph | Self::ColorGlyph)
    }

    /// True for the color modes (3D palette quantization).
    #[must_use]
    pub fn is_color(self) -> bool {
        matches!(self, Self::ColorGlyph | Self::ColorBlock)
    }

    /// Kebab-case name, as accepted by `FromStr`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GrayGlyph => "gray-glyph",
            Self::ColorGlyph => "color-glyph",
            Self::GrayBlock => "gray-block",
            Self::ColorBlock => "color-block",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "mode inconnu '{s}' (attendu : gray-glyph, color-glyph, gray-block, color-block)"
                ))
            })
    }
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::ColorGlyph,
            cell_size: None,
            font_size: 12.0,
            font_path: None,
            charset: None,
            color_levels: 8,
            target_fps: 30,
            preview_divisor: 4,
            play_audio: true,
            max_width: None,
            output_dir: PathBuf::from("output"),
            record_fps: None,
        }
    }
}

impl ArtConfig {
    /// Effective sampling stride in pixels.
    ///
    /// Glyph modes: `floor(font_size × 0.6)`, at least 1. Block modes: 7.
    /// An explicit `cell_size` wins in both cases.
    #[must_use]
    pub fn cell_size(&self) -> u32 {
        self.cell_size.unwrap_or_else(|| {
            if self.mode.is_glyph() {
                ((self.font_size * GLYPH_CELL_RATIO) as u32).max(1)
            } else {
                DEFAULT_BLOCK_SIZE
            }
        })
    }

    /// Glyph ramp text: the configured charset, or the mode's default ramp.
    #[must_use]
    pub fn ramp_text(&self) -> &str {
        match self.charset.as_deref() {
            Some(custom) => custom,
            None if self.mode.is_color() => RAMP_COLOR,
            None => RAMP_GRAY,
        }
    }

    /// Build the glyph ramp for this configuration.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the ramp is invalid.
    pub fn ramp(&self) -> Result<GlyphRamp, CoreError> {
        GlyphRamp::new(self.ramp_text())
    }

    /// Clamp soft numeric fields to their valid ranges.
    /// Called after TOML deserialization and CLI overrides.
    pub fn clamp_all(&mut self) {
        let before = (
            self.font_size,
            self.target_fps,
            self.preview_divisor,
            self.record_fps,
        );
        self.font_size = self.font_size.clamp(4.0, 128.0);
        self.target_fps = self.target_fps.clamp(1, 240);
        self.preview_divisor = self.preview_divisor.clamp(1, 16);
        if let Some(fps) = self.record_fps {
            self.record_fps = Some(fps.clamp(1.0, 240.0));
        }
        let after = (
            self.font_size,
            self.target_fps,
            self.preview_divisor,
            self.record_fps,
        );
        if before != after {
            log::warn!("Config : valeurs hors bornes ramenées à {after:?} (font_size, target_fps, preview_divisor, record_fps)");
        }
    }

    /// Reject values that cannot produce a palette or a glyph cache.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] on the first invalid field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.cell_size == Some(0) {
            return Err(CoreError::Config("cell_size doit être ≥ 1".into()));
        }
        if self.color_levels < 2 {
            return Err(CoreError::Config(format!(
                "color_levels doit être ≥ 2, reçu {}",
                self.color_levels
            )));
        }
        if self.color_levels > MAX_COLOR_LEVELS {
            return Err(CoreError::Config(format!(
                "color_levels doit être ≤ {MAX_COLOR_LEVELS}, reçu {}",
                self.color_levels
            )));
        }
        if self.max_width == Some(0) {
            return Err(CoreError::Config("max_width doit être ≥ 1".into()));
        }
        let glyphs = self.ramp_text().chars().count();
        if !(2..=MAX_GLYPHS).contains(&glyphs) {
            return Err(CoreError::Config(format!(
                "la rampe doit contenir entre 2 et {MAX_GLYPHS} glyphes, reçu {glyphs}"
            )));
        }
        if self.mode == RenderMode::ColorGlyph {
            let colors = (self.color_levels as usize).pow(3);
            let stamps = glyphs * colors;
            if stamps > MAX_GLYPH_STAMPS {
                return Err(CoreError::Config(format!(
                    "{glyphs} glyphes × {colors} couleurs = {stamps} stamps, maximum {MAX_GLYPH_STAMPS} : réduire color_levels ou la rampe"
                )));
            }
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    render: RenderSection,
    #[serde(default)]
    source: SourceSection,
    #[serde(default)]
    output: OutputSection,
}

/// `[render]` section, all fields optional for partial override.
#[derive(Deserialize, Default)]
struct RenderSection {
    mode: Option<RenderMode>,
    cell_size: Option<u32>,
    font_size: Option<f32>,
    font_path: Option<PathBuf>,
    charset: Option<String>,
    color_levels: Option<u32>,
    target_fps: Option<u32>,
    preview_divisor: Option<u32>,
}

/// `[source]` section.
#[derive(Deserialize, Default)]
struct SourceSection {
    play_audio: Option<bool>,
    max_width: Option<u32>,
}

/// `[output]` section.
#[derive(Deserialize, Default)]
struct OutputSection {
    dir: Option<PathBuf>,
    record_fps: Option<f64>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use ca_core::config::{parse_config, RenderMode};
/// let config = parse_config("[render]\nmode = \"gray-block\"\ncell_size = 10\n").unwrap();
/// assert_eq!(config.mode, RenderMode::GrayBlock);
/// assert_eq!(config.cell_size(), 10);
/// ```
pub fn parse_config(content: &str) -> Result<ArtConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = ArtConfig::default();

    let r = file.render;
    if let Some(v) = r.mode {
        config.mode = v;
    }
    if r.cell_size.is_some() {
        config.cell_size = r.cell_size;
    }
    if let Some(v) = r.font_size {
        config.font_size = v;
    }
    if r.font_path.is_some() {
        config.font_path = r.font_path;
    }
    if r.charset.is_some() {
        config.charset = r.charset;
    }
    if let Some(v) = r.color_levels {
        config.color_levels = v;
    }
    if let Some(v) = r.target_fps {
        config.target_fps = v;
    }
    if let Some(v) = r.preview_divisor {
        config.preview_divisor = v;
    }

    let s = file.source;
    if let Some(v) = s.play_audio {
        config.play_audio = v;
    }
    if s.max_width.is_some() {
        config.max_width = s.max_width;
    }

    let o = file.output;
    if let Some(v) = o.dir {
        config.output_dir = v;
    }
    if o.record_fps.is_some() {
        config.record_fps = o.record_fps;
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use ca_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<ArtConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::info!("Config chargée : {} (mode {})", path.display(), config.mode);
    log::debug!("{config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ArtConfig::default().validate().is_ok());
    }

    #[test]
    fn cell_size_follows_mode() {
        let mut config = ArtConfig::default();
        config.font_size = 20.0;
        assert_eq!(config.cell_size(), 12);
        config.mode = RenderMode::GrayBlock;
        assert_eq!(config.cell_size(), DEFAULT_BLOCK_SIZE);
        config.cell_size = Some(3);
        assert_eq!(config.cell_size(), 3);
    }

    #[test]
    fn ramp_defaults_differ_between_gray_and_color() {
        let mut config = ArtConfig::default();
        assert_eq!(config.ramp_text(), RAMP_COLOR);
        config.mode = RenderMode::GrayGlyph;
        assert_eq!(config.ramp_text(), RAMP_GRAY);
        config.charset = Some(" #".into());
        assert_eq!(config.ramp_text(), " #");
    }

    #[test]
    fn validate_rejects_bad_levels_and_ramps() {
        let mut config = ArtConfig::default();
        config.color_levels = 1;
        assert!(config.validate().is_err());

        let mut config = ArtConfig::default();
        config.charset = Some("@".into());
        assert!(config.validate().is_err());

        let mut config = ArtConfig::default();
        config.cell_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn color_glyph_cache_size_is_bounded() {
        // rampe couleur : 16 glyphes
        let mut config = ArtConfig::default();
        config.color_levels = MAX_COLOR_LEVELS;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        config.color_levels = 16;
        assert!(config.validate().is_ok());

        config.color_levels = MAX_COLOR_LEVELS;
        config.mode = RenderMode::ColorBlock;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn mode_parsing_roundtrips_names() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.as_str().parse::<RenderMode>().unwrap(), mode);
        }
        assert!("ascii".parse::<RenderMode>().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config("[source]\nplay_audio = false\n").unwrap();
        assert!(!config.play_audio);
        assert_eq!(config.color_levels, 8);
        assert_eq!(config.mode, RenderMode::ColorGlyph);
    }

    #[test]
    fn file_values_are_clamped() {
        let config = parse_config("[render]\ntarget_fps = 0\npreview_divisor = 99\n").unwrap();
        assert_eq!(config.target_fps, 1);
        assert_eq!(config.preview_divisor, 16);
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.toml");
        std::fs::write(&path, "[render]\ncolor_levels = 4\n[output]\ndir = \"snaps\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.color_levels, 4);
        assert_eq!(config.output_dir, PathBuf::from("snaps"));
    }

    #[test]
    fn unknown_mode_in_file_is_an_error() {
        assert!(parse_config("[render]\nmode = \"braille\"\n").is_err());
    }
}
