use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::snake::Direction;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Turn(Direction),
    Restart,
    TogglePause,
    Quit,
}

/// A stream of player input.
pub trait InputSource {
    /// Events received since the last call, oldest first. Never blocks.
    fn poll_events(&mut self) -> Result<Vec<InputEvent>>;

    /// Blocks until a key is pressed. `None` for keys with no meaning.
    fn wait_key(&mut self) -> Result<Option<InputEvent>>;
}

pub fn map_key(ev: &KeyEvent) -> Option<InputEvent> {
    if is_ctrl_c(ev) {
        return Some(InputEvent::Quit);
    }

    let event = match ev.code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => InputEvent::Turn(Direction::Up),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => InputEvent::Turn(Direction::Left),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => InputEvent::Turn(Direction::Down),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => InputEvent::Turn(Direction::Right),
        KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => InputEvent::Restart,
        KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('P') => InputEvent::TogglePause,
        KeyCode::Char('q') | KeyCode::Char('Q') => InputEvent::Quit,
        _ => return None,
    };

    Some(event)
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
