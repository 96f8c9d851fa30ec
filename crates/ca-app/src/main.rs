use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use ca_convert::{Compositor, Driver, FrameSampler, Quantizer, StampCache};
use ca_core::config::ArtConfig;
use ca_core::traits::{GlyphRenderer, Source, SourceKind};
use ca_export::FontGlyphRenderer;
use ca_export::exporter::{DEFAULT_RECORD_FPS, MediaExporter};
use ca_render::fps::FrameClock;
use ca_render::{HeadlessDisplay, KeyControls, TerminalDisplay};
use ca_source::{AudioPlayback, FfmpegInput, ImageSource, VideoSource};
use clap::Parser;

use crate::cli::{Cli, SourceArg};

pub mod cli;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = Cli::parse();

    // 2. Initialiser le logging (stderr ; le TUI possède stdout)
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Config fichier + overrides CLI
    let config = resolve_config(&cli)?;
    let source_arg = cli.source()?;

    // 4. Ctrl-C → arrêt propre (finalise l'enregistrement)
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("Impossible d'installer le handler Ctrl-C")?;
    }

    // 5. Source
    let source = open_source(&source_arg, &config, !cli.headless)?;
    let (width, height) = source.native_size();
    let kind = source.kind();
    let record_fps = config
        .record_fps
        .or_else(|| source.frame_rate())
        .unwrap_or(DEFAULT_RECORD_FPS);
    log::info!(
        "Source {width}x{height} ({kind:?}), fps {:?}",
        source.frame_rate()
    );

    // 6. Structures immuables de conversion
    let (sampler, cache) = build_converter(&config)?;
    let compositor = Compositor::new(config.preview_divisor);

    // 7. Exporteur
    let mut exporter = MediaExporter::new(&config.output_dir, config.mode, record_fps);
    if let Some(output) = cli.output.clone() {
        exporter = match kind {
            SourceKind::Still => exporter.with_image_path(output),
            SourceKind::Stream => exporter.with_video_path(output),
        };
    }

    let mut driver = if cli.headless {
        let driver = Driver::new(
            source,
            sampler,
            cache,
            compositor,
            Box::new(HeadlessDisplay::new()),
        )
        .with_exporter(Box::new(exporter))
        .with_stop_flag(stop)
        .strict_export(true);
        match kind {
            SourceKind::Still => {
                let mut driver = driver.with_frame_limit(1);
                driver.request_snapshot();
                driver
            }
            SourceKind::Stream => driver.recording(true),
        }
    } else {
        let clock = (kind == SourceKind::Still)
            .then(|| FrameClock::new(f64::from(config.target_fps)));
        let display = TerminalDisplay::new(config.mode, clock)
            .context("Impossible d'initialiser le terminal")?;
        Driver::new(source, sampler, cache, compositor, Box::new(display))
            .with_controls(Box::new(KeyControls))
            .with_exporter(Box::new(exporter))
            .with_stop_flag(stop)
    };

    // 8. Bande son (vidéo interactive uniquement), coupée au drop
    let _audio = match &source_arg {
        SourceArg::Video(path) if config.play_audio && !cli.headless => {
            AudioPlayback::try_start(path)
        }
        _ => None,
    };

    // 9. Boucle principale
    let reason = driver.run();
    log::info!("Fin de session : {reason:?}");

    // 10. Finaliser les sorties (ferme le MP4)
    driver.finish()
}

/// Load the TOML config (defaults when missing), then apply CLI overrides.
fn resolve_config(cli: &Cli) -> Result<ArtConfig> {
    let mut config = if cli.config.exists() {
        ca_core::config::load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        ArtConfig::default()
    };
    cli.apply_overrides(&mut config);
    config.clamp_all();
    config.validate()?;
    Ok(config)
}

/// Open the visual source. `paced` follows the file's native frame rate.
fn open_source(arg: &SourceArg, config: &ArtConfig, paced: bool) -> Result<Box<dyn Source>> {
    Ok(match arg {
        SourceArg::Image(path) => Box::new(ImageSource::open(path, config.max_width)?),
        SourceArg::Video(path) => Box::new(VideoSource::open(
            FfmpegInput::File(path.clone()),
            config.max_width,
            paced,
        )?),
        SourceArg::Camera(device) => Box::new(VideoSource::open(
            FfmpegInput::Camera(device.clone()),
            config.max_width,
            paced,
        )?),
    })
}

/// Build the sampler and the stamp cache for the configured mode.
///
/// Glyph modes need a font; block modes never touch one.
fn build_converter(config: &ArtConfig) -> Result<(FrameSampler, StampCache)> {
    let quantizer = Quantizer::new(config.color_levels)?;
    let ramp = config.ramp()?;
    let cell_size = config.cell_size();

    let font = if config.mode.is_glyph() {
        Some(FontGlyphRenderer::open(
            config.font_path.as_deref(),
            config.font_size,
        )?)
    } else {
        None
    };
    let renderer = font.as_ref().map(|f| f as &dyn GlyphRenderer);

    let cache = StampCache::build(config.mode, &ramp, &quantizer, renderer, cell_size)?;
    let sampler = FrameSampler::new(config.mode, cell_size, &ramp, &quantizer);
    log::info!(
        "Mode {} : cellule {cell_size}px, palette {} couleurs, {} stamps",
        config.mode,
        quantizer.palette().len(),
        cache.stamp_count()
    );
    Ok((sampler, cache))
}
