use ca_core::config::MAX_COLOR_LEVELS;
use ca_core::error::CoreError;

/// Clé de couleur quantifiée : triple d'indices de bucket packé en `u32`
/// (`r << 16 | g << 8 | b`).
///
/// # Example
/// ```
/// use ca_convert::quantizer::ColorKey;
/// let key = ColorKey::new(1, 2, 3);
/// assert_eq!(key.components(), [1, 2, 3]);
/// assert!(!key.is_zero());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorKey(u32);

impl ColorKey {
    /// Pack three bucket indices.
    #[inline(always)]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Bucket a raw color: each channel is divided by `step` (floor).
    ///
    /// # Panics
    /// Panics if `step` is zero.
    #[inline(always)]
    #[must_use]
    pub fn quantize(rgb: [u8; 3], step: u8) -> Self {
        Self::new(rgb[0] / step, rgb[1] / step, rgb[2] / step)
    }

    /// Unpack into `[r, g, b]` bucket indices.
    #[inline(always)]
    #[must_use]
    pub const fn components(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    /// All three buckets are 0.
    #[inline(always)]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// Couleurs représentatives, une par combinaison de niveaux (L³ entrées).
///
/// Stockage dense indexé par `r·L² + g·L + b` : pas de hash au lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    levels: usize,
    colors: Vec<[u8; 3]>,
}

impl Palette {
    fn build(levels: &[u8]) -> Self {
        let l = levels.len();
        let mut colors = Vec::with_capacity(l * l * l);
        for &r in levels {
            for &g in levels {
                for &b in levels {
                    colors.push([r, g, b]);
                }
            }
        }
        Self { levels: l, colors }
    }

    /// Dense index of `key`.
    ///
    /// # Panics
    /// Panics if a bucket of `key` is outside `0..L`: such a key can only
    /// come from a step that does not belong to this palette.
    #[inline(always)]
    #[must_use]
    pub fn index_of(&self, key: ColorKey) -> usize {
        let [r, g, b] = key.components();
        let (r, g, b) = (usize::from(r), usize::from(g), usize::from(b));
        assert!(
            r < self.levels && g < self.levels && b < self.levels,
            "clé de couleur hors palette : {key:?} (L = {})",
            self.levels
        );
        (r * self.levels + g) * self.levels + b
    }

    /// Representative color for `key`.
    ///
    /// # Panics
    /// Same as [`Palette::index_of`].
    #[inline(always)]
    #[must_use]
    pub fn color(&self, key: ColorKey) -> [u8; 3] {
        self.colors[self.index_of(key)]
    }

    /// Number of entries (L³).
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Never true for a built palette.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Entries in dense-index order.
    pub fn iter(&self) -> impl Iterator<Item = (ColorKey, [u8; 3])> + '_ {
        let l = self.levels;
        self.colors.iter().enumerate().map(move |(i, &rgb)| {
            let key = ColorKey::new((i / (l * l)) as u8, (i / l % l) as u8, (i % l) as u8);
            (key, rgb)
        })
    }
}

/// Quantification uniforme à L niveaux par canal.
///
/// Les niveaux sont `floor(i·255 / (L-1))` (0 et 255 exacts), le pas de
/// bucket `255 / (L-1)` en division entière. Construit une fois, immuable.
///
/// # Example
/// ```
/// use ca_convert::quantizer::Quantizer;
/// let q = Quantizer::new(2).unwrap();
/// assert_eq!(q.step(), 255);
/// assert_eq!(q.levels(), &[0, 255]);
/// assert_eq!(q.palette().len(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct Quantizer {
    levels: Vec<u8>,
    step: u8,
    palette: Palette,
}

impl Quantizer {
    /// Build the levels, the step and the palette for `levels` per channel.
    ///
    /// A level count is only accepted if re-bucketing each representative
    /// value with the step gives back its own index. Otherwise a sampled
    /// pixel could produce a key with no palette entry (L = 17 is such a
    /// case: 255 / 16 = 15 and 255 / 15 = 17).
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `levels` is outside
    /// `2..=MAX_COLOR_LEVELS` or yields an inconsistent palette.
    pub fn new(levels: u32) -> Result<Self, CoreError> {
        if !(2..=MAX_COLOR_LEVELS).contains(&levels) {
            return Err(CoreError::Config(format!(
                "color_levels doit être entre 2 et {MAX_COLOR_LEVELS}, reçu {levels}"
            )));
        }
        let last = levels - 1;
        let step = (255 / last) as u8;
        let values: Vec<u8> = (0..levels).map(|i| (i * 255 / last) as u8).collect();

        for (i, &v) in values.iter().enumerate() {
            if usize::from(v / step) != i {
                return Err(CoreError::Config(format!(
                    "color_levels = {levels} : le niveau {v} retombe dans le bucket {} au lieu de {i}",
                    v / step
                )));
            }
        }

        let palette = Palette::build(&values);
        log::debug!(
            "Quantizer: L={levels}, step={step}, palette={} couleurs",
            palette.len()
        );
        Ok(Self {
            levels: values,
            step,
            palette,
        })
    }

    /// The L representative values, ascending, from 0 to 255.
    #[must_use]
    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    /// Bucket width `255 / (L-1)`.
    #[must_use]
    pub fn step(&self) -> u8 {
        self.step
    }

    /// Palette of the L³ representative colors.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted_levels() -> impl Iterator<Item = (u32, Quantizer)> {
        (2..=MAX_COLOR_LEVELS).filter_map(|l| Quantizer::new(l).ok().map(|q| (l, q)))
    }

    #[test]
    fn rejects_degenerate_levels() {
        assert!(matches!(Quantizer::new(0), Err(CoreError::Config(_))));
        assert!(matches!(Quantizer::new(1), Err(CoreError::Config(_))));
        assert!(matches!(
            Quantizer::new(MAX_COLOR_LEVELS + 1),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn rejects_levels_with_dangling_keys() {
        assert!(matches!(Quantizer::new(17), Err(CoreError::Config(_))));
    }

    #[test]
    fn common_levels_are_accepted() {
        for l in [2, 3, 4, 5, 6, 8, 16, 64] {
            assert!(Quantizer::new(l).is_ok(), "L = {l}");
        }
    }

    #[test]
    fn levels_are_evenly_spaced_from_0_to_255() {
        for (l, q) in accepted_levels() {
            let levels = q.levels();
            assert_eq!(levels.len(), l as usize);
            assert_eq!(levels[0], 0);
            assert_eq!(levels[levels.len() - 1], 255);
            assert_eq!(u32::from(q.step()), 255 / (l - 1));
            assert!(levels.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn representatives_rebucket_into_the_palette() {
        for (_, q) in accepted_levels().filter(|(l, _)| *l <= 32) {
            let palette = q.palette();
            for (key, rgb) in palette.iter() {
                assert_eq!(ColorKey::quantize(rgb, q.step()), key);
                assert_eq!(palette.color(key), rgb);
            }
        }
    }

    #[test]
    fn every_live_pixel_has_a_palette_entry() {
        for (_, q) in accepted_levels() {
            for v in 0..=255u8 {
                let key = ColorKey::quantize([v, v, v], q.step());
                let _ = q.palette().index_of(key);
            }
        }
    }

    #[test]
    fn two_levels_split_at_255() {
        let q = Quantizer::new(2).unwrap();
        assert_eq!(q.step(), 255);
        for v in 0..255u8 {
            assert!(ColorKey::quantize([v, v, v], q.step()).is_zero());
        }
        assert_eq!(q.palette().len(), 8);
        assert_eq!(
            ColorKey::quantize([255, 0, 254], q.step()),
            ColorKey::new(1, 0, 0)
        );
    }

    #[test]
    fn eight_levels_match_linear_spacing() {
        let q = Quantizer::new(8).unwrap();
        assert_eq!(q.levels(), &[0, 36, 72, 109, 145, 182, 218, 255]);
        assert_eq!(q.step(), 36);
        assert_eq!(q.palette().len(), 512);
        let key = ColorKey::quantize([120, 120, 120], q.step());
        assert_eq!(q.palette().color(key), [109, 109, 109]);
    }

    #[test]
    #[should_panic(expected = "hors palette")]
    fn foreign_key_panics() {
        let q = Quantizer::new(2).unwrap();
        let _ = q.palette().color(ColorKey::new(2, 0, 0));
    }
}
