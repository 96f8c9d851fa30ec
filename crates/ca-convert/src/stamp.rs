use ca_core::charset::GlyphRamp;
use ca_core::config::RenderMode;
use ca_core::error::CoreError;
use ca_core::frame::FrameBuffer;
use ca_core::traits::GlyphRenderer;
use rayon::prelude::*;

use crate::quantizer::{ColorKey, Palette, Quantizer};

/// Teinte unique des stamps en mode glyphe gris.
pub const GRAY_FOREGROUND: [u8; 3] = [255, 255, 255];

/// Clé de lookup d'une commande de dessin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StampKey {
    /// Glyphe seul (mode glyphe gris).
    Glyph(u8),
    /// Glyphe rendu dans une couleur de la palette (mode glyphe couleur).
    ColoredGlyph {
        /// Index dans la rampe.
        glyph: u8,
        /// Couleur quantifiée.
        color: ColorKey,
    },
    /// Bloc plein d'une couleur de la palette (mode bloc couleur).
    Block(ColorKey),
    /// Bloc plein du gris échantillonné, sans quantification (mode bloc gris).
    Shade(u8),
}

/// Ce que le compositeur pose pour une clé.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stamp<'a> {
    /// Image pré-rendue, pixels transparents non copiés.
    Image(&'a FrameBuffer),
    /// Rectangle plein `cell_size × cell_size`.
    Solid([u8; 3]),
}

/// Cache immuable des stamps, construit une fois avant la boucle de frames.
///
/// Contenu selon le mode :
/// - glyphe gris : N stamps ;
/// - glyphe couleur : N × L³ stamps, glyph-major ;
/// - bloc couleur : les L³ couleurs de la palette, sans image ;
/// - bloc gris : rien, le gris de la clé est peint tel quel.
#[derive(Debug)]
pub struct StampCache {
    mode: RenderMode,
    cell_size: u32,
    palette: Palette,
    stamps: Vec<FrameBuffer>,
}

impl StampCache {
    /// Build the cache for `mode`.
    ///
    /// Glyph modes render every stamp through `renderer`, in parallel. Any
    /// failure aborts the whole build: there is no partial cache.
    ///
    /// # Errors
    /// Returns [`CoreError::ResourceUnavailable`] if a glyph mode has no
    /// renderer or a glyph cannot be rendered, and [`CoreError::Config`] if
    /// `cell_size` is 0.
    pub fn build(
        mode: RenderMode,
        ramp: &GlyphRamp,
        quantizer: &Quantizer,
        renderer: Option<&dyn GlyphRenderer>,
        cell_size: u32,
    ) -> Result<Self, CoreError> {
        if cell_size == 0 {
            return Err(CoreError::Config("cell_size doit être ≥ 1".into()));
        }
        let palette = quantizer.palette().clone();

        let stamps = if mode.is_glyph() {
            let renderer = renderer.ok_or_else(|| CoreError::ResourceUnavailable {
                resource: "glyph renderer".into(),
                reason: format!("le mode {mode} a besoin d'une police"),
            })?;
            let glyphs: Vec<char> = ramp.iter().collect();
            if mode.is_color() {
                let colors: Vec<[u8; 3]> = palette.iter().map(|(_, rgb)| rgb).collect();
                (0..glyphs.len() * colors.len())
                    .into_par_iter()
                    .map(|i| {
                        renderer.render_glyph(glyphs[i / colors.len()], colors[i % colors.len()])
                    })
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                glyphs
                    .par_iter()
                    .map(|&ch| renderer.render_glyph(ch, GRAY_FOREGROUND))
                    .collect::<Result<Vec<_>, _>>()?
            }
        } else {
            Vec::new()
        };

        log::info!(
            "StampCache: mode={mode}, {} glyphes, {} stamps, cellule {cell_size}px",
            ramp.len(),
            stamps.len()
        );

        Ok(Self {
            mode,
            cell_size,
            palette,
            stamps,
        })
    }

    /// Sampling stride, also the side of block stamps.
    #[must_use]
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Number of pre-rendered glyph images.
    #[must_use]
    pub fn stamp_count(&self) -> usize {
        self.stamps.len()
    }

    /// Stamp for `key`.
    ///
    /// # Panics
    /// Panics if `key` does not belong to the cache's mode or is out of
    /// range: the sampler of the same configuration never produces such a
    /// key.
    #[inline]
    #[must_use]
    pub fn get(&self, key: StampKey) -> Stamp<'_> {
        match (self.mode, key) {
            (RenderMode::GrayGlyph, StampKey::Glyph(g)) => {
                Stamp::Image(&self.stamps[usize::from(g)])
            }
            (RenderMode::ColorGlyph, StampKey::ColoredGlyph { glyph, color }) => {
                let idx = usize::from(glyph) * self.palette.len() + self.palette.index_of(color);
                Stamp::Image(&self.stamps[idx])
            }
            (RenderMode::ColorBlock, StampKey::Block(color)) => {
                Stamp::Solid(self.palette.color(color))
            }
            (RenderMode::GrayBlock, StampKey::Shade(v)) => Stamp::Solid([v, v, v]),
            (mode, key) => panic!("clé {key:?} incompatible avec le mode {mode}"),
        }
    }
}
