use std::io;

use ca_core::config::RenderMode;
use ca_core::frame::FrameBuffer;
use ca_core::traits::{Display, PresentInfo};
use ratatui::DefaultTerminal;

use crate::fps::{FpsCounter, FrameClock};
use crate::ui::{self, Status};

/// Affichage terminal plein écran (ratatui, écran alternatif, raw mode).
///
/// Le terminal est acquis à la construction et toujours restauré au
/// `Drop`, y compris quand la boucle s'arrête sur une erreur.
pub struct TerminalDisplay {
    terminal: DefaultTerminal,
    mode: RenderMode,
    fps: FpsCounter,
    clock: Option<FrameClock>,
}

impl TerminalDisplay {
    /// Take over the terminal. `clock` caps the presentation rate.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be switched to raw mode.
    pub fn new(mode: RenderMode, clock: Option<FrameClock>) -> io::Result<Self> {
        let terminal = ratatui::try_init()?;
        Ok(Self {
            terminal,
            mode,
            fps: FpsCounter::new(30),
            clock,
        })
    }
}

impl Display for TerminalDisplay {
    fn present(&mut self, canvas: &FrameBuffer, preview: &FrameBuffer, info: PresentInfo) {
        if let Some(clock) = self.clock.as_mut() {
            clock.wait();
        }
        self.fps.tick();
        let status = Status {
            mode: self.mode,
            fps: self.fps.fps(),
            frame_index: info.frame_index,
            recording: info.recording,
        };
        if let Err(e) = self
            .terminal
            .draw(|frame| ui::draw(frame, canvas, preview, &status))
        {
            log::error!("Affichage terminal échoué : {e}");
        }
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        ratatui::restore();
    }
}
