use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ca_core::frame::FrameBuffer;
use ca_core::traits::{ControlEvent, Controls, Display, Exporter, PresentInfo, Source};

use crate::compositor::Compositor;
use crate::sampler::{DrawCommand, FrameSampler};
use crate::stamp::StampCache;

/// Pourquoi la boucle s'est arrêtée.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// La source n'a plus de frame (fin normale ou lecture cassée).
    EndOfStream,
    /// Signal d'arrêt externe ou touche quitter.
    QuitRequested,
    /// Nombre maximal de frames atteint.
    FrameLimit,
    /// Écriture d'export échouée en mode strict.
    ExportFailed,
}

/// État de la boucle de conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// En attente de la prochaine frame.
    WaitingFrame,
    /// Échantillonnage et composition en cours.
    Rendering,
    /// Terminal.
    Stopped(StopReason),
}

/// Orchestre une itération : frame source → commandes → canvas → affichage
/// et, si l'enregistrement est actif, export.
///
/// Mono-thread et synchrone : chaque frame est entièrement traitée avant
/// la suivante, dans l'ordre d'acquisition.
pub struct Driver {
    source: Box<dyn Source>,
    sampler: FrameSampler,
    cache: StampCache,
    compositor: Compositor,
    display: Box<dyn Display>,
    controls: Option<Box<dyn Controls>>,
    exporter: Option<Box<dyn Exporter>>,
    stop: Arc<AtomicBool>,
    frame_limit: Option<u64>,
    state: DriverState,
    canvas: FrameBuffer,
    commands: Vec<DrawCommand>,
    frames_rendered: u64,
    recording: bool,
    snapshot_pending: bool,
    strict_export: bool,
    export_error: Option<anyhow::Error>,
}

impl Driver {
    /// Assemble a driver. Recording is off and no frame limit is set.
    #[must_use]
    pub fn new(
        source: Box<dyn Source>,
        sampler: FrameSampler,
        cache: StampCache,
        compositor: Compositor,
        display: Box<dyn Display>,
    ) -> Self {
        Self {
            source,
            sampler,
            cache,
            compositor,
            display,
            controls: None,
            exporter: None,
            stop: Arc::new(AtomicBool::new(false)),
            frame_limit: None,
            state: DriverState::WaitingFrame,
            canvas: FrameBuffer::new(0, 0),
            commands: Vec::new(),
            frames_rendered: 0,
            recording: false,
            snapshot_pending: false,
            strict_export: false,
            export_error: None,
        }
    }

    /// Poll `controls` once per iteration.
    #[must_use]
    pub fn with_controls(mut self, controls: Box<dyn Controls>) -> Self {
        self.controls = Some(controls);
        self
    }

    /// Route snapshots and recorded frames to `exporter`.
    #[must_use]
    pub fn with_exporter(mut self, exporter: Box<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Share an external stop flag (Ctrl-C handler).
    #[must_use]
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Stop after `limit` rendered frames.
    #[must_use]
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Record every frame from the first one.
    #[must_use]
    pub fn recording(mut self, on: bool) -> Self {
        self.recording = on && self.exporter.is_some();
        self
    }

    /// Treat any export failure as fatal: the loop stops with
    /// [`StopReason::ExportFailed`] and [`Driver::finish`] returns the error.
    ///
    /// Off by default, where a failed write is logged and the session goes on.
    #[must_use]
    pub fn strict_export(mut self, on: bool) -> Self {
        self.strict_export = on;
        self
    }

    /// Write the next rendered canvas as an image.
    pub fn request_snapshot(&mut self) {
        self.snapshot_pending = true;
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Frames fully rendered and presented so far.
    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Whether frames are currently sent to the exporter.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Last composed canvas.
    #[must_use]
    pub fn canvas(&self) -> &FrameBuffer {
        &self.canvas
    }

    /// Run one iteration and return the resulting state.
    ///
    /// Once stopped, further calls do nothing.
    pub fn tick(&mut self) -> DriverState {
        if let DriverState::Stopped(_) = self.state {
            return self.state;
        }
        if self.stop.load(Ordering::Relaxed) {
            return self.halt(StopReason::QuitRequested);
        }
        if self.handle_controls() {
            return self.halt(StopReason::QuitRequested);
        }
        if self.frame_limit.is_some_and(|limit| self.frames_rendered >= limit) {
            return self.halt(StopReason::FrameLimit);
        }

        self.state = DriverState::WaitingFrame;
        let Some(frame) = self.source.next_frame() else {
            return self.halt(StopReason::EndOfStream);
        };

        self.state = DriverState::Rendering;
        self.canvas.ensure_size(frame.width, frame.height);
        self.commands.clear();
        self.commands.extend(self.sampler.sample(&frame));
        Compositor::render(&mut self.canvas, &self.commands, &self.cache);
        log::trace!(
            "frame {} : {} commandes",
            self.frames_rendered,
            self.commands.len()
        );

        let preview = self.compositor.preview(&frame);
        let info = PresentInfo {
            frame_index: self.frames_rendered,
            recording: self.recording,
        };
        self.display.present(&self.canvas, preview, info);
        drop(frame);

        self.frames_rendered += 1;
        self.export_frame();
        if self.snapshot_pending {
            self.write_snapshot();
        }
        if self.export_error.is_some() {
            return self.halt(StopReason::ExportFailed);
        }

        self.state = DriverState::WaitingFrame;
        self.state
    }

    /// Tick until stopped.
    pub fn run(&mut self) -> StopReason {
        loop {
            if let DriverState::Stopped(reason) = self.tick() {
                return reason;
            }
        }
    }

    /// Finalise the exporter (closes an open recording).
    ///
    /// The exporter is always closed, even after a strict export failure.
    ///
    /// # Errors
    /// Returns the first export failure recorded in strict mode, otherwise
    /// any error raised while the exporter closes its outputs.
    pub fn finish(&mut self) -> anyhow::Result<()> {
        let closed = match self.exporter.as_mut() {
            Some(exporter) => exporter.finish(),
            None => Ok(()),
        };
        match self.export_error.take() {
            Some(e) => {
                if let Err(close) = closed {
                    log::error!("Fermeture de l'export échouée : {close:#}");
                }
                Err(e)
            }
            None => closed,
        }
    }

    fn halt(&mut self, reason: StopReason) -> DriverState {
        if self.snapshot_pending && self.frames_rendered > 0 {
            self.write_snapshot();
        }
        log::info!(
            "Arrêt ({reason:?}) après {} frames",
            self.frames_rendered
        );
        self.state = DriverState::Stopped(reason);
        self.state
    }

    /// Drain pending events. Returns true on quit.
    fn handle_controls(&mut self) -> bool {
        let Some(controls) = self.controls.as_mut() else {
            return false;
        };
        while let Some(event) = controls.poll() {
            match event {
                ControlEvent::Quit => return true,
                ControlEvent::Snapshot => self.snapshot_pending = true,
                ControlEvent::ToggleRecording => {
                    if self.exporter.is_some() {
                        self.recording = !self.recording;
                        log::info!(
                            "Enregistrement {}",
                            if self.recording { "démarré" } else { "en pause" }
                        );
                    } else {
                        log::warn!("Enregistrement indisponible : aucun exporteur");
                    }
                }
            }
        }
        false
    }

    fn export_frame(&mut self) {
        if !self.recording {
            return;
        }
        let Some(exporter) = self.exporter.as_mut() else {
            return;
        };
        if let Err(e) = exporter.write_frame(&self.canvas) {
            log::error!("Écriture vidéo échouée, enregistrement coupé : {e:#}");
            self.recording = false;
            self.record_failure(e.context("Écriture vidéo échouée"));
        }
    }

    fn write_snapshot(&mut self) {
        self.snapshot_pending = false;
        let Some(exporter) = self.exporter.as_mut() else {
            log::warn!("Snapshot ignoré : aucun exporteur");
            return;
        };
        match exporter.write_image(&self.canvas) {
            Ok(path) => log::info!("Snapshot : {}", path.display()),
            Err(e) => {
                log::error!("Snapshot échoué : {e:#}");
                self.record_failure(e.context("Snapshot échoué"));
            }
        }
    }

    /// Keep the first failure when export errors are fatal.
    fn record_failure(&mut self, e: anyhow::Error) {
        if self.strict_export && self.export_error.is_none() {
            self.export_error = Some(e);
        }
    }
}
