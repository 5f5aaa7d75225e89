//! src/controller/keymap.rs
//!
//! Terminal events to [`Action`]s. Vim-style letters and arrow keys both work.

use crossterm::event::{Event as TerminalEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::controller::actions::Action;

#[must_use]
pub fn map_terminal_event(event: &TerminalEvent) -> Option<Action> {
    match event {
        TerminalEvent::Key(key_event) => map_key(key_event),

        TerminalEvent::Resize(width, height) => Some(Action::Resize(*width, *height)),

        _ => None,
    }
}

#[must_use]
pub fn map_key(key_event: &KeyEvent) -> Option<Action> {
    // Windows reports releases too.
    if key_event.kind == KeyEventKind::Release {
        return None;
    }

    match (key_event.code, key_event.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Some(Action::Quit),

        (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
            Some(Action::MoveSelectionUp)
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
            Some(Action::MoveSelectionDown)
        }

        (KeyCode::Enter, _) | (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
            Some(Action::EnterSelected)
        }
        (KeyCode::Backspace, _) | (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
            Some(Action::GoToParent)
        }

        (KeyCode::PageUp, _) => Some(Action::PageUp),
        (KeyCode::PageDown, _) => Some(Action::PageDown),
        (KeyCode::Home, _) | (KeyCode::Char('g'), KeyModifiers::NONE) => Some(Action::SelectFirst),
        (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(Action::SelectLast),

        (KeyCode::F(5), _) | (KeyCode::Char('r'), KeyModifiers::NONE) => {
            Some(Action::ReloadDirectory)
        }

        _ => None,
    }
}
