use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tracing::trace;

/// Logical joystick direction as consumed by the navigation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Middle,
}

impl Direction {
    /// Physical-to-logical mapping for the fixed 270-degree mounting of the
    /// joystick. Applied exactly once, at ingestion; the machine itself is
    /// rotation-agnostic.
    pub fn rotate_270(self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Right => Direction::Down,
            Direction::Middle => Direction::Middle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoystickEvent {
    pub direction: Direction,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Joystick(JoystickEvent),
    Quit,
}

/// Terminal stand-in for the joystick: arrow keys are the *physical*
/// directions, Enter/Space the middle press. Rotation happens here so the
/// machine sees the same logical stream a rotated hardware stick would
/// produce.
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Drain every currently pending event without blocking, preserving
    /// arrival order.
    pub fn drain(&mut self) -> Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if let Some(input) = Self::key_to_input(key) {
                    trace!(?input, "input event");
                    events.push(input);
                }
            }
        }
        Ok(events)
    }

    fn key_to_input(key: KeyEvent) -> Option<InputEvent> {
        let action = match key.kind {
            KeyEventKind::Press => Action::Pressed,
            KeyEventKind::Release => Action::Released,
            _ => return None,
        };

        // Raw mode swallows SIGINT; ctrl-c arrives here as a key event.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(InputEvent::Quit);
        }

        let physical = match key.code {
            KeyCode::Up => Direction::Up,
            KeyCode::Down => Direction::Down,
            KeyCode::Left => Direction::Left,
            KeyCode::Right => Direction::Right,
            KeyCode::Enter | KeyCode::Char(' ') => Direction::Middle,
            KeyCode::Char('q') | KeyCode::Esc => return Some(InputEvent::Quit),
            _ => return None,
        };

        Some(InputEvent::Joystick(JoystickEvent {
            direction: physical.rotate_270(),
            action,
        }))
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
