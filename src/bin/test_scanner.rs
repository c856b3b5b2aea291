use gridtune::audio::Library;
use gridtune::{Config, MusicScanner};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    println!("🎵 gridtune Library Scanner Test");
    println!("================================");

    let music_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Config::default().music_dir);

    println!("📁 Scanning music directory: {:?}", music_dir);

    let scanner = MusicScanner::new();
    let tracks = match scanner.scan_directory(&music_dir) {
        Ok(tracks) => tracks,
        Err(e) => {
            println!("❌ Scan failed: {}", e);
            return Ok(());
        }
    };

    println!("✅ Found {} music files", tracks.len());
    println!();

    let library = Library::new(tracks);

    // Show the first 10 tracks with their resolved metadata
    for (i, track) in library.tracks().iter().take(10).enumerate() {
        let metadata = library.metadata(track);
        println!("{}. {}", i + 1, metadata.title);
        println!("   Artist: {}", metadata.artist);
        println!("   Album: {}", metadata.album);
        println!("   Format: {:?}", track.format());
    }

    if library.len() > 10 {
        println!("   ... and {} more", library.len() - 10);
    }

    // Exercise the character filter the way the selection menu will
    println!();
    for ch in ['#', '1', 'A', 'S'] {
        let matches = library.filter_by_char(ch);
        println!("Filter '{}': {} titles", ch, matches.len());
    }

    Ok(())
}
