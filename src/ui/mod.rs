// Terminal lifecycle + the joystick-driven navigation machine

mod app;
pub mod events;

pub use app::{startup_marquee, App, Mode, CHAR_LIST};
pub use events::{Action, Direction, EventHandler, InputEvent, JoystickEvent};

use anyhow::Result;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;

/// Raw-mode + alternate-screen guard. Keeping the restore logic in a Drop
/// impl means the terminal comes back even when the loop unwinds.
pub struct TerminalManager {
    _cleanup_guard: CleanupGuard,
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }
}

impl TerminalManager {
    pub fn new() -> Result<Self> {
        // Ensure clean terminal state first
        let _ = disable_raw_mode();

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        Ok(Self {
            _cleanup_guard: CleanupGuard,
        })
    }
}
