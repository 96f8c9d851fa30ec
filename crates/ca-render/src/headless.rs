use std::time::{Duration, Instant};

use ca_core::frame::FrameBuffer;
use ca_core::traits::{Display, PresentInfo};

use crate::fps::FpsCounter;

/// Intervalle entre deux lignes de progression.
const REPORT_EVERY: Duration = Duration::from_secs(2);

/// Affichage sans terminal : journalise la progression de l'export.
pub struct HeadlessDisplay {
    fps: FpsCounter,
    last_report: Instant,
    presented: u64,
}

impl HeadlessDisplay {
    /// Create a headless display.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fps: FpsCounter::new(30),
            last_report: Instant::now(),
            presented: 0,
        }
    }

    /// Frames presented so far.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for HeadlessDisplay {
    fn present(&mut self, canvas: &FrameBuffer, _preview: &FrameBuffer, info: PresentInfo) {
        self.fps.tick();
        self.presented += 1;
        if self.last_report.elapsed() >= REPORT_EVERY {
            self.last_report = Instant::now();
            log::info!(
                "frame {} ({}x{}) {:.1} FPS{}",
                info.frame_index,
                canvas.width,
                canvas.height,
                self.fps.fps(),
                if info.recording { " [REC]" } else { "" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_presented_frames() {
        let mut display = HeadlessDisplay::new();
        let fb = FrameBuffer::new(2, 2);
        for i in 0..3 {
            display.present(
                &fb,
                &fb,
                PresentInfo {
                    frame_index: i,
                    recording: false,
                },
            );
        }
        assert_eq!(display.presented(), 3);
    }
}
