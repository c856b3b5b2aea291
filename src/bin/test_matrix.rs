// Visual smoke test for the terminal matrix backend: runs the startup
// flourish, walks a few glyphs, scrolls a message, then shuts down clean.

use gridtune::display::{self, Matrix, TermMatrix, BLACK, CYAN, GREEN, ORANGE, YELLOW};
use gridtune::TerminalManager;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let _terminal = TerminalManager::new()?;
    let mut matrix = TermMatrix::new(false);
    let scroll = Duration::from_millis(80);

    display::animate_square_grow(&mut matrix, GREEN);

    for ch in ['#', '1', 'A', 'M', 'Z'] {
        matrix.show_glyph(ch, ORANGE);
        std::thread::sleep(Duration::from_millis(400));
    }

    matrix.scroll_text("MATRIX OK!", YELLOW, BLACK, scroll);
    matrix.scroll_text("Vol 70%", CYAN, BLACK, scroll);

    display::animate_square_shrink(&mut matrix, GREEN);
    matrix.clear();

    Ok(())
}
