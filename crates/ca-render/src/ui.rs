use ca_core::config::RenderMode;
use ca_core::frame::FrameBuffer;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::canvas::FrameWidget;

/// Ce que la barre d'état affiche.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Status {
    /// Mode de rendu courant.
    pub mode: RenderMode,
    /// FPS mesuré.
    pub fps: f64,
    /// Numéro de la frame affichée.
    pub frame_index: u64,
    /// Enregistrement en cours.
    pub recording: bool,
}

/// Draw the full UI: converted canvas | source preview, status bar below.
pub fn draw(frame: &mut Frame, canvas: &FrameBuffer, preview: &FrameBuffer, status: &Status) {
    let [main, bar] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(75), Constraint::Percentage(25)]).areas(main);

    draw_panel(frame, left, " charart ", canvas);
    draw_panel(frame, right, " source ", preview);
    frame.render_widget(Paragraph::new(status_line(status)), bar);
}

fn draw_panel(frame: &mut Frame, area: Rect, title: &str, fb: &FrameBuffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(FrameWidget::new(fb), inner);
}

/// Status bar: mode, measured FPS, frame number, REC flag and key help.
#[must_use]
pub fn status_line(status: &Status) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", status.mode),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ),
        Span::raw(format!(" {:.0} FPS ", status.fps)),
        Span::styled(
            format!(" #{} ", status.frame_index),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if status.recording {
        spans.push(Span::styled(
            " ● REC ",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        " s:snapshot  r:record  q:quit",
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn status_shows_rec_only_while_recording() {
        let mut status = Status {
            mode: RenderMode::ColorBlock,
            fps: 24.4,
            frame_index: 7,
            recording: false,
        };
        let idle = text(&status_line(&status));
        assert!(idle.contains("color-block"));
        assert!(idle.contains("24 FPS"));
        assert!(!idle.contains("REC"));
        status.recording = true;
        assert!(text(&status_line(&status)).contains("REC"));
    }
}
