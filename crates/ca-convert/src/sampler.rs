use ca_core::charset::{GlyphRamp, GlyphSelector};
use ca_core::config::RenderMode;
use ca_core::frame::FrameBuffer;

use crate::quantizer::{ColorKey, Quantizer};
use crate::stamp::StampKey;

/// Une cellule à dessiner : clé de stamp et coin haut-gauche dans le canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCommand {
    /// Stamp or color to draw.
    pub key: StampKey,
    /// Column of the sampled pixel.
    pub x: u32,
    /// Row of the sampled pixel.
    pub y: u32,
}

/// Échantillonne une frame sur une grille de pas fixe et produit les
/// commandes de dessin.
///
/// Le pas est le même sur les deux axes, quel que soit le ratio des
/// glyphes : l'étirement vertical qui en résulte fait partie du style.
///
/// # Example
/// ```
/// use ca_convert::quantizer::Quantizer;
/// use ca_convert::sampler::FrameSampler;
/// use ca_core::charset::GlyphRamp;
/// use ca_core::config::RenderMode;
/// use ca_core::frame::FrameBuffer;
///
/// let ramp = GlyphRamp::new(" .#").unwrap();
/// let q = Quantizer::new(2).unwrap();
/// let sampler = FrameSampler::new(RenderMode::GrayGlyph, 2, &ramp, &q);
/// let frame = FrameBuffer::new(4, 4);
/// assert_eq!(sampler.sample(&frame).count(), 0);
/// ```
#[derive(Clone)]
pub struct FrameSampler {
    mode: RenderMode,
    stride: u32,
    selector: GlyphSelector,
    step: u8,
}

impl FrameSampler {
    /// Create a sampler. `stride` is clamped to at least 1.
    #[must_use]
    pub fn new(mode: RenderMode, stride: u32, ramp: &GlyphRamp, quantizer: &Quantizer) -> Self {
        Self {
            mode,
            stride: stride.max(1),
            selector: GlyphSelector::new(ramp),
            step: quantizer.step(),
        }
    }

    /// Sampling stride in pixels.
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Lazily walk `frame` column by column: `(0, 0), (0, stride), …`, then
    /// the next column.
    ///
    /// Stamps larger than the stride overlap their neighbours; the walk
    /// order decides which one stays on top (the lower-right one).
    ///
    /// Skipped cells emit nothing: glyph index 0 in glyph modes, all color
    /// buckets 0 in color block mode, luminance 0 in gray block mode.
    pub fn sample<'a>(&'a self, frame: &'a FrameBuffer) -> Samples<'a> {
        Samples {
            sampler: self,
            frame,
            x: 0,
            y: 0,
        }
    }

    #[inline(always)]
    fn command_at(&self, frame: &FrameBuffer, x: u32, y: u32) -> Option<StampKey> {
        match self.mode {
            RenderMode::GrayGlyph => {
                let glyph = self.selector.index_for(frame.luminance(x, y));
                (glyph != 0).then_some(StampKey::Glyph(glyph))
            }
            RenderMode::ColorGlyph => {
                let glyph = self.selector.index_for(frame.luminance(x, y));
                (glyph != 0).then(|| StampKey::ColoredGlyph {
                    glyph,
                    color: ColorKey::quantize(frame.rgb(x, y), self.step),
                })
            }
            RenderMode::ColorBlock => {
                let color = ColorKey::quantize(frame.rgb(x, y), self.step);
                (!color.is_zero()).then_some(StampKey::Block(color))
            }
            RenderMode::GrayBlock => {
                let shade = frame.luminance(x, y);
                (shade != 0).then_some(StampKey::Shade(shade))
            }
        }
    }
}

/// Itérateur fini et non redémarrable sur les commandes d'une frame.
pub struct Samples<'a> {
    sampler: &'a FrameSampler,
    frame: &'a FrameBuffer,
    x: u32,
    y: u32,
}

impl Iterator for Samples<'_> {
    type Item = DrawCommand;

    fn next(&mut self) -> Option<DrawCommand> {
        let stride = self.sampler.stride;
        while self.x < self.frame.width {
            while self.y < self.frame.height {
                let (x, y) = (self.x, self.y);
                self.y = self.y.saturating_add(stride);
                if let Some(key) = self.sampler.command_at(self.frame, x, y) {
                    return Some(DrawCommand { key, x, y });
                }
            }
            self.y = 0;
            self.x = self.x.saturating_add(stride);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, rows: &[u8]) -> FrameBuffer {
        let luma: Vec<u8> = rows
            .iter()
            .flat_map(|&v| std::iter::repeat_n(v, width as usize))
            .collect();
        FrameBuffer::from_luma(width, rows.len() as u32, &luma).unwrap()
    }

    fn sampler(mode: RenderMode, stride: u32, ramp: &str, levels: u32) -> FrameSampler {
        let ramp = GlyphRamp::new(ramp).unwrap();
        let q = Quantizer::new(levels).unwrap();
        FrameSampler::new(mode, stride, &ramp, &q)
    }

    #[test]
    fn three_glyph_ramp_on_4x4_frame() {
        let frame = gray_frame(4, &[0, 128, 255, 0]);
        let s = sampler(RenderMode::GrayGlyph, 2, " .#", 2);
        let commands: Vec<_> = s.sample(&frame).collect();
        assert_eq!(
            commands,
            vec![
                DrawCommand {
                    key: StampKey::Glyph(2),
                    x: 0,
                    y: 2
                },
                DrawCommand {
                    key: StampKey::Glyph(2),
                    x: 2,
                    y: 2
                },
            ]
        );
    }

    #[test]
    fn black_frame_yields_nothing_in_every_mode() {
        let frame = gray_frame(9, &[0; 9]);
        for mode in RenderMode::ALL {
            let s = sampler(mode, 2, " .:#", 8);
            assert_eq!(s.sample(&frame).count(), 0, "{mode}");
        }
    }

    #[test]
    fn white_frame_uses_top_glyph_everywhere() {
        let frame = gray_frame(5, &[255; 5]);
        let s = sampler(RenderMode::GrayGlyph, 2, " .:#", 8);
        let commands: Vec<_> = s.sample(&frame).collect();
        assert_eq!(commands.len(), 9);
        let coords: Vec<_> = commands.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords[..4], [(0, 0), (0, 2), (0, 4), (2, 0)]);
        assert!(commands.iter().all(|c| c.key == StampKey::Glyph(3)));
    }

    #[test]
    fn sampling_is_deterministic() {
        let mut frame = FrameBuffer::new(17, 11);
        for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
            px.copy_from_slice(&[(i * 7) as u8, (i * 13) as u8, (i * 29) as u8, 255]);
        }
        for mode in RenderMode::ALL {
            let s = sampler(mode, 3, " .:-=+*#%@", 4);
            let a: Vec<_> = s.sample(&frame).collect();
            let b: Vec<_> = s.sample(&frame).collect();
            assert_eq!(a, b, "{mode}");
        }
    }

    #[test]
    fn color_glyph_carries_quantized_color() {
        let mut frame = FrameBuffer::new(1, 1);
        frame.fill([255, 254, 255]);
        let s = sampler(RenderMode::ColorGlyph, 1, " .#", 2);
        let commands: Vec<_> = s.sample(&frame).collect();
        assert_eq!(
            commands[0].key,
            StampKey::ColoredGlyph {
                glyph: 2,
                color: ColorKey::new(1, 0, 1)
            }
        );
    }

    #[test]
    fn color_block_keeps_dark_hues_that_glyph_modes_drop() {
        // luminance ≈ 29 : glyphe 0, mais le bucket bleu n'est pas nul
        let mut frame = FrameBuffer::new(1, 1);
        frame.fill([0, 0, 255]);
        let glyph = sampler(RenderMode::ColorGlyph, 1, " .:#", 2);
        assert_eq!(glyph.sample(&frame).count(), 0);
        let block = sampler(RenderMode::ColorBlock, 1, " .:#", 2);
        let commands: Vec<_> = block.sample(&frame).collect();
        assert_eq!(commands[0].key, StampKey::Block(ColorKey::new(0, 0, 1)));
    }

    #[test]
    fn gray_block_keeps_raw_luminance() {
        let frame = gray_frame(2, &[120, 1, 0]);
        let s = sampler(RenderMode::GrayBlock, 1, " #", 8);
        let commands: Vec<_> = s.sample(&frame).collect();
        let keys: Vec<_> = commands.iter().map(|c| (c.x, c.y, c.key)).collect();
        assert_eq!(
            keys,
            vec![
                (0, 0, StampKey::Shade(120)),
                (0, 1, StampKey::Shade(1)),
                (1, 0, StampKey::Shade(120)),
                (1, 1, StampKey::Shade(1)),
            ]
        );
    }

    #[test]
    fn columns_are_walked_before_rows() {
        let frame = gray_frame(3, &[255; 3]);
        let s = sampler(RenderMode::GrayGlyph, 1, " #", 2);
        let coords: Vec<_> = s.sample(&frame).map(|c| (c.x, c.y)).collect();
        assert_eq!(coords[..4], [(0, 0), (0, 1), (0, 2), (1, 0)]);
        assert_eq!(coords.len(), 9);
    }

    #[test]
    fn stride_larger_than_frame_samples_origin_only() {
        let frame = gray_frame(3, &[255; 3]);
        let s = sampler(RenderMode::GrayGlyph, 50, " #", 2);
        let commands: Vec<_> = s.sample(&frame).collect();
        assert_eq!(commands.len(), 1);
        assert_eq!((commands[0].x, commands[0].y), (0, 0));
    }
}
