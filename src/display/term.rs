use super::font::{self, GLYPH_ROWS};
use super::{Matrix, Rgb, BLACK, GRID_PIXELS, GRID_SIDE};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, SetForegroundColor};
use std::io::{self, Write};
use std::time::Duration;
use tracing::warn;

/// Terminal-backed matrix: each pixel is a pair of full blocks, painted in
/// place on the alternate screen the [`crate::ui::TerminalManager`] set up.
/// A paint failure is logged and dropped; display output must never feed an
/// error back into navigation.
pub struct TermMatrix {
    pixels: [Rgb; GRID_PIXELS],
    low_light: bool,
}

impl TermMatrix {
    pub fn new(low_light: bool) -> Self {
        Self {
            pixels: [BLACK; GRID_PIXELS],
            low_light,
        }
    }

    fn paint(&self) -> io::Result<()> {
        let mut out = io::stdout();
        for y in 0..GRID_SIDE {
            queue!(out, MoveTo(0, y as u16))?;
            for x in 0..GRID_SIDE {
                let Rgb { r, g, b } = self.scaled(self.pixels[y * GRID_SIDE + x]);
                queue!(out, SetForegroundColor(Color::Rgb { r, g, b }), Print("██"))?;
            }
        }
        out.flush()
    }

    fn repaint(&self) {
        if let Err(e) = self.paint() {
            warn!(error = %e, "matrix paint failed, dropping frame");
        }
    }

    fn scaled(&self, color: Rgb) -> Rgb {
        if self.low_light {
            Rgb::new(color.r / 3, color.g / 3, color.b / 3)
        } else {
            color
        }
    }

    fn glyph_pixels(ch: char, fg: Rgb, bg: Rgb) -> [Rgb; GRID_PIXELS] {
        let mut pixels = [bg; GRID_PIXELS];
        for (i, column) in font::glyph(ch).iter().enumerate() {
            let x = i + 1; // five columns, centered on the grid
            for y in 0..GLYPH_ROWS {
                if column & (1 << y) != 0 {
                    pixels[y * GRID_SIDE + x] = fg;
                }
            }
        }
        pixels
    }

    /// Lay the message out as one long column strip with a blank lead-in and
    /// run-out of one grid width each, so the text enters from the right
    /// edge and fully exits left.
    fn text_columns(text: &str) -> Vec<u8> {
        let mut strip = vec![0u8; GRID_SIDE];
        for ch in text.chars() {
            strip.extend(font::glyph(ch));
            strip.push(0);
        }
        strip.extend(std::iter::repeat(0).take(GRID_SIDE));
        strip
    }
}

impl Matrix for TermMatrix {
    fn clear(&mut self) {
        self.pixels = [BLACK; GRID_PIXELS];
        self.repaint();
    }

    fn show_glyph(&mut self, ch: char, color: Rgb) {
        self.pixels = Self::glyph_pixels(ch, color, BLACK);
        self.repaint();
    }

    fn scroll_text(&mut self, text: &str, fg: Rgb, bg: Rgb, per_column: Duration) {
        let strip = Self::text_columns(text);
        for offset in 0..=strip.len() - GRID_SIDE {
            let mut pixels = [bg; GRID_PIXELS];
            for x in 0..GRID_SIDE {
                let column = strip[offset + x];
                for y in 0..GLYPH_ROWS {
                    if column & (1 << y) != 0 {
                        pixels[y * GRID_SIDE + x] = fg;
                    }
                }
            }
            self.pixels = pixels;
            self.repaint();
            std::thread::sleep(per_column);
        }
        self.clear();
    }

    fn set_pixels(&mut self, pixels: &[Rgb; GRID_PIXELS]) {
        self.pixels = *pixels;
        self.repaint();
    }
}
