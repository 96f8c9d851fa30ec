use ca_core::frame::FrameBuffer;
use ca_core::resize::Resizer;

use crate::sampler::DrawCommand;
use crate::stamp::{Stamp, StampCache};

/// Fond du canvas converti.
pub const BACKGROUND: [u8; 3] = [0, 0, 0];

/// Compositor : pose les stamps d'une frame sur le canvas et produit la
/// prévisualisation réduite de la source.
///
/// # Example
/// ```
/// use ca_convert::compositor::Compositor;
/// let c = Compositor::new(4);
/// assert_eq!(c.preview_divisor(), 4);
/// ```
pub struct Compositor {
    preview_divisor: u32,
    resizer: Resizer,
    preview: FrameBuffer,
}

impl Compositor {
    /// Create a compositor whose preview is the source divided by
    /// `preview_divisor` on both axes (at least 1).
    #[must_use]
    pub fn new(preview_divisor: u32) -> Self {
        Self {
            preview_divisor: preview_divisor.max(1),
            resizer: Resizer::new(),
            preview: FrameBuffer::new(0, 0),
        }
    }

    /// Preview reduction factor.
    #[must_use]
    pub fn preview_divisor(&self) -> u32 {
        self.preview_divisor
    }

    /// Clear `canvas` to black then draw every command, opaque, in order.
    ///
    /// Later commands overwrite earlier ones where stamps overlap. Nothing
    /// of the previous frame survives the clear.
    pub fn render<'c, I>(canvas: &mut FrameBuffer, commands: I, cache: &StampCache)
    where
        I: IntoIterator<Item = &'c DrawCommand>,
    {
        canvas.fill(BACKGROUND);
        let cell = cache.cell_size();
        for cmd in commands {
            match cache.get(cmd.key) {
                Stamp::Image(stamp) => canvas.blit_masked(stamp, cmd.x, cmd.y),
                Stamp::Solid(rgb) => canvas.fill_rect(cmd.x, cmd.y, cell, cell, rgb),
            }
        }
    }

    /// Downscale `frame` into the internal preview buffer (box filter).
    ///
    /// On a resize failure the previous preview is kept and a warning is
    /// logged: the preview is cosmetic.
    pub fn preview(&mut self, frame: &FrameBuffer) -> &FrameBuffer {
        if frame.width == 0 || frame.height == 0 {
            return &self.preview;
        }
        let w = (frame.width / self.preview_divisor).max(1);
        let h = (frame.height / self.preview_divisor).max(1);
        self.preview.ensure_size(w, h);
        if let Err(e) = self.resizer.resize_into(frame, &mut self.preview) {
            log::warn!("Prévisualisation impossible : {e:#}");
        }
        &self.preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantizer::{ColorKey, Quantizer};
    use crate::sampler::FrameSampler;
    use crate::stamp::StampKey;
    use crate::stamp::tests::SolidRenderer;
    use ca_core::charset::GlyphRamp;
    use ca_core::config::RenderMode;

    fn cmd(key: StampKey, x: u32, y: u32) -> DrawCommand {
        DrawCommand { key, x, y }
    }

    #[test]
    fn render_clears_previous_frame() {
        let q = Quantizer::new(2).unwrap();
        let ramp = GlyphRamp::new(" #").unwrap();
        let cache = StampCache::build(RenderMode::ColorBlock, &ramp, &q, None, 2).unwrap();
        let mut canvas = FrameBuffer::new(4, 4);
        canvas.fill([9, 9, 9]);
        Compositor::render(&mut canvas, &[cmd(StampKey::Block(ColorKey::new(1, 1, 1)), 2, 2)], &cache);
        assert_eq!(canvas.rgb(0, 0), BACKGROUND);
        assert_eq!(canvas.rgb(2, 2), [255, 255, 255]);
        assert_eq!(canvas.rgb(3, 3), [255, 255, 255]);
        let none: [DrawCommand; 0] = [];
        Compositor::render(&mut canvas, &none, &cache);
        assert!(canvas.data.chunks_exact(4).all(|px| px[..3] == BACKGROUND));
    }

    #[test]
    fn glyph_stamps_are_blitted_and_clipped() {
        let q = Quantizer::new(2).unwrap();
        let ramp = GlyphRamp::new(" #").unwrap();
        let renderer = SolidRenderer::new(3);
        let cache = StampCache::build(RenderMode::ColorGlyph, &ramp, &q, Some(&renderer), 2).unwrap();
        let mut canvas = FrameBuffer::new(4, 4);
        let key = StampKey::ColoredGlyph {
            glyph: 1,
            color: ColorKey::new(1, 0, 0),
        };
        Compositor::render(&mut canvas, &[cmd(key, 2, 2)], &cache);
        assert_eq!(canvas.rgb(3, 3), [255, 0, 0]);
        assert_eq!(canvas.rgb(1, 1), BACKGROUND);
    }

    #[test]
    fn later_commands_overwrite_earlier_ones() {
        let q = Quantizer::new(2).unwrap();
        let ramp = GlyphRamp::new(" #").unwrap();
        let cache = StampCache::build(RenderMode::ColorBlock, &ramp, &q, None, 3).unwrap();
        let mut canvas = FrameBuffer::new(4, 4);
        let commands = [
            cmd(StampKey::Block(ColorKey::new(1, 0, 0)), 0, 0),
            cmd(StampKey::Block(ColorKey::new(0, 1, 0)), 2, 0),
        ];
        Compositor::render(&mut canvas, &commands, &cache);
        assert_eq!(canvas.rgb(1, 0), [255, 0, 0]);
        assert_eq!(canvas.rgb(2, 0), [0, 255, 0]);
    }

    #[test]
    fn gray_block_paints_the_sampled_luminance() {
        let q = Quantizer::new(8).unwrap();
        let ramp = GlyphRamp::new(" #").unwrap();
        let cache = StampCache::build(RenderMode::GrayBlock, &ramp, &q, None, 1).unwrap();
        let sampler = FrameSampler::new(RenderMode::GrayBlock, 1, &ramp, &q);
        let frame = FrameBuffer::from_luma(1, 1, &[120]).unwrap();
        let commands: Vec<_> = sampler.sample(&frame).collect();
        let mut canvas = FrameBuffer::new(1, 1);
        Compositor::render(&mut canvas, &commands, &cache);
        assert_eq!(canvas.rgb(0, 0), [120, 120, 120]);
    }

    #[test]
    fn preview_divides_both_axes() {
        let mut compositor = Compositor::new(4);
        let mut frame = FrameBuffer::new(40, 20);
        frame.fill([100, 150, 200]);
        let preview = compositor.preview(&frame);
        assert_eq!((preview.width, preview.height), (10, 5));
        assert_eq!(preview.rgb(5, 2), [100, 150, 200]);
    }
}
