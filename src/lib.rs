// gridtune - music player for an 8x8 pixel matrix and a 5-way joystick
// Started life on a Sense HAT wedged on top of a Pi; the terminal backend
// keeps it hackable anywhere

pub mod audio;   // scanning, metadata, playlist, playback
pub mod config;  // settings and preferences
pub mod display; // the 8x8 matrix and its backends
pub mod ui;      // joystick input and the navigation machine

// Export the stuff other modules actually use
pub use audio::{Library, MusicScanner, Playback, Playlist, RodioPlayer, Track, TrackMetadata};
pub use config::Config;
pub use display::{Matrix, TermMatrix};
pub use ui::{App, EventHandler, TerminalManager};
