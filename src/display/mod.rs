// 8x8 matrix abstraction - the navigation machine only ever talks to the
// Matrix trait, the shipped backend draws into the terminal.

pub mod font;
mod term;

pub use term::TermMatrix;

use std::time::Duration;

pub const GRID_SIDE: usize = 8;
pub const GRID_PIXELS: usize = GRID_SIDE * GRID_SIDE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const RED: Rgb = Rgb::new(255, 0, 0);
pub const GREEN: Rgb = Rgb::new(0, 255, 0);
pub const BLUE: Rgb = Rgb::new(0, 0, 255);
pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
pub const ORANGE: Rgb = Rgb::new(255, 165, 0);
pub const CYAN: Rgb = Rgb::new(0, 255, 255);

/// Render contract for the 8x8 matrix. Commands are fire-and-forget: a
/// backend that cannot paint logs and drops the frame rather than erroring
/// back into navigation. `scroll_text` deliberately blocks for its whole
/// duration and leaves the display cleared; the one-user-one-display design
/// treats that as a scheduling pause between input events.
pub trait Matrix {
    fn clear(&mut self);
    fn show_glyph(&mut self, ch: char, color: Rgb);
    fn scroll_text(&mut self, text: &str, fg: Rgb, bg: Rgb, per_column: Duration);
    fn set_pixels(&mut self, pixels: &[Rgb; GRID_PIXELS]);
}

/// A hollow square ring centered on the grid. `radius` 0 is the middle 2x2
/// block, 3 is the outer border.
pub fn square_frame(radius: usize, color: Rgb) -> [Rgb; GRID_PIXELS] {
    let mut pixels = [BLACK; GRID_PIXELS];
    let radius = radius.min(3);
    let (lo, hi) = (3 - radius, 4 + radius);
    for y in lo..=hi {
        for x in lo..=hi {
            if x == lo || x == hi || y == lo || y == hi {
                pixels[y * GRID_SIDE + x] = color;
            }
        }
    }
    pixels
}

const SQUARE_FRAME_HOLD: Duration = Duration::from_millis(80);

/// Startup flourish: square rings growing out from the center.
pub fn animate_square_grow<M: Matrix + ?Sized>(matrix: &mut M, color: Rgb) {
    for radius in 0..=3 {
        matrix.set_pixels(&square_frame(radius, color));
        std::thread::sleep(SQUARE_FRAME_HOLD);
    }
    matrix.clear();
}

/// Shutdown flourish: the reverse of [`animate_square_grow`].
pub fn animate_square_shrink<M: Matrix + ?Sized>(matrix: &mut M, color: Rgb) {
    for radius in (0..=3).rev() {
        matrix.set_pixels(&square_frame(radius, color));
        std::thread::sleep(SQUARE_FRAME_HOLD);
    }
    matrix.clear();
}
