use std::time::Duration;

use ca_core::traits::{ControlEvent, Controls};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Traduit une touche en commande.
///
/// `q`, `Esc`, `Ctrl+C` : quitter. `s` : snapshot. `r` : enregistrement.
///
/// # Example
/// ```
/// use ca_core::traits::ControlEvent;
/// use ca_render::controls::map_key;
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
/// let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);
/// assert_eq!(map_key(&key), Some(ControlEvent::Snapshot));
/// ```
#[must_use]
pub fn map_key(key: &KeyEvent) -> Option<ControlEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ControlEvent::Quit)
        }
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(ControlEvent::Quit),
        KeyCode::Char('s' | 'S') => Some(ControlEvent::Snapshot),
        KeyCode::Char('r' | 'R') => Some(ControlEvent::ToggleRecording),
        _ => None,
    }
}

/// Commandes clavier lues dans le terminal, sans bloquer.
#[derive(Default)]
pub struct KeyControls;

impl Controls for KeyControls {
    fn poll(&mut self) -> Option<ControlEvent> {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    log::warn!("Lecture clavier impossible : {e}");
                    return None;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) => {
                    if let Some(cmd) = map_key(&key) {
                        return Some(cmd);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Lecture clavier impossible : {e}");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        for key in [
            press(KeyCode::Char('q'), KeyModifiers::NONE),
            press(KeyCode::Esc, KeyModifiers::NONE),
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert_eq!(map_key(&key), Some(ControlEvent::Quit));
        }
    }

    #[test]
    fn record_toggle_and_unbound_keys() {
        assert_eq!(
            map_key(&press(KeyCode::Char('r'), KeyModifiers::NONE)),
            Some(ControlEvent::ToggleRecording)
        );
        assert_eq!(map_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(map_key(&press(KeyCode::Enter, KeyModifiers::NONE)), None);
    }

    #[test]
    fn releases_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('s'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(&release), None);
    }
}
