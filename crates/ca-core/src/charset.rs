use crate::error::CoreError;

/// 19 caractères : rampe des modes glyphe en niveaux de gris.
pub const RAMP_GRAY: &str = " .\",:;!~+-xmo*#W&8@";

/// 16 caractères : rampe des modes glyphe en couleur (plus dense, la couleur
/// porte une partie de l'information).
pub const RAMP_COLOR: &str = " ixzao*#MW&8%B@$";

/// Taille maximale d'une rampe : un index de glyphe tient dans un `u8`.
pub const MAX_GLYPHS: usize = 256;

/// Ordered glyph sequence, sparsest/darkest first.
///
/// # Example
/// ```
/// use ca_core::charset::GlyphRamp;
/// let ramp = GlyphRamp::new(" .#").unwrap();
/// assert_eq!(ramp.len(), 3);
/// assert_eq!(ramp.glyph(2), '#');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    /// Build a ramp from a string, one glyph per `char`.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the ramp has fewer than 2 or more
    /// than [`MAX_GLYPHS`] glyphs.
    pub fn new(glyphs: &str) -> Result<Self, CoreError> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        if glyphs.len() < 2 {
            return Err(CoreError::Config(format!(
                "la rampe de glyphes doit contenir au moins 2 caractères, reçu {}",
                glyphs.len()
            )));
        }
        if glyphs.len() > MAX_GLYPHS {
            return Err(CoreError::Config(format!(
                "la rampe de glyphes est limitée à {MAX_GLYPHS} caractères, reçu {}",
                glyphs.len()
            )));
        }
        Ok(Self { glyphs })
    }

    /// Number of glyphs (N).
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false: a ramp holds at least two glyphs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyph at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index]
    }

    /// Iterate glyphs in ramp order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.iter().copied()
    }

    /// Luminance bucket width: `255 / (N - 1)`, integer division.
    #[must_use]
    pub fn bucket_step(&self) -> u8 {
        (255 / (self.glyphs.len() - 1)) as u8
    }
}

/// Lookup table mapping luminance [0..255] → glyph index.
///
/// Pre-computed at startup for O(1) per-sample cost. Index 0 means
/// "background": the sampler never emits it.
///
/// # Example
/// ```
/// use ca_core::charset::{GlyphRamp, GlyphSelector};
/// let ramp = GlyphRamp::new(" .#").unwrap();
/// let selector = GlyphSelector::new(&ramp);
/// assert_eq!(selector.index_for(0), 0);
/// assert_eq!(selector.index_for(128), 1);
/// assert_eq!(selector.index_for(255), 2);
/// ```
#[derive(Clone)]
pub struct GlyphSelector {
    lut: [u8; 256],
}

impl GlyphSelector {
    /// Build the table for `ramp`: `luminance / bucket_step`, capped at `N - 1`.
    ///
    /// The cap only matters when `255` is not a multiple of `N - 1` and the
    /// last bucket would overflow the ramp (e.g. N = 100).
    #[must_use]
    pub fn new(ramp: &GlyphRamp) -> Self {
        let step = usize::from(ramp.bucket_step());
        let last = ramp.len() - 1;
        let mut lut = [0u8; 256];
        for (lum, slot) in lut.iter_mut().enumerate() {
            *slot = (lum / step).min(last) as u8;
        }
        Self { lut }
    }

    /// Map a luminance value [0..255] to a glyph index.
    #[inline(always)]
    #[must_use]
    pub fn index_for(&self, luminance: u8) -> u8 {
        self.lut[luminance as usize]
    }
}
