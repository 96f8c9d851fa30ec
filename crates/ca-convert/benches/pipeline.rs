use ca_convert::compositor::Compositor;
use ca_convert::quantizer::Quantizer;
use ca_convert::sampler::{DrawCommand, FrameSampler};
use ca_convert::stamp::StampCache;
use ca_core::charset::{GlyphRamp, RAMP_COLOR};
use ca_core::config::RenderMode;
use ca_core::error::CoreError;
use ca_core::frame::FrameBuffer;
use ca_core::traits::GlyphRenderer;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// Stamp 7×12 en damier : densité proche d'un vrai glyphe.
struct CheckerRenderer;

impl GlyphRenderer for CheckerRenderer {
    fn glyph_size(&self) -> (u32, u32) {
        (7, 12)
    }

    fn render_glyph(&self, _ch: char, rgb: [u8; 3]) -> Result<FrameBuffer, CoreError> {
        let mut fb = FrameBuffer::new(7, 12);
        for (i, px) in fb.data.chunks_exact_mut(4).enumerate() {
            if i % 2 == 0 {
                px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        }
        Ok(fb)
    }
}

fn gradient_frame(width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 4) as usize;
            frame.data[idx] = (x * 255 / width) as u8;
            frame.data[idx + 1] = (y * 255 / height) as u8;
            frame.data[idx + 2] = ((x + y) % 256) as u8;
            frame.data[idx + 3] = 255;
        }
    }
    frame
}

fn bench_pipeline(c: &mut Criterion) {
    let ramp = GlyphRamp::new(RAMP_COLOR).unwrap_or_else(|e| panic!("{e}"));
    let quantizer = Quantizer::new(8).unwrap_or_else(|e| panic!("{e}"));
    let frame = gradient_frame(1280, 720);
    let mut canvas = FrameBuffer::new(1280, 720);
    let mut commands: Vec<DrawCommand> = Vec::new();

    for mode in RenderMode::ALL {
        let renderer: Option<&dyn GlyphRenderer> = if mode.is_glyph() {
            Some(&CheckerRenderer)
        } else {
            None
        };
        let cache = StampCache::build(mode, &ramp, &quantizer, renderer, 7)
            .unwrap_or_else(|e| panic!("{e}"));
        let sampler = FrameSampler::new(mode, 7, &ramp, &quantizer);

        c.bench_function(&format!("sample_720p_{mode}"), |b| {
            b.iter(|| black_box(sampler.sample(black_box(&frame)).count()));
        });

        c.bench_function(&format!("sample_render_720p_{mode}"), |b| {
            b.iter(|| {
                commands.clear();
                commands.extend(sampler.sample(black_box(&frame)));
                Compositor::render(&mut canvas, &commands, &cache);
                black_box(&canvas);
            });
        });
    }

    let mut compositor = Compositor::new(4);
    c.bench_function("preview_720p", |b| {
        b.iter(|| black_box(compositor.preview(black_box(&frame)).width));
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
