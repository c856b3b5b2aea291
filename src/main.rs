use anyhow::Result;
use clap::Parser;
use gridtune::audio::{Library, MusicScanner, Playlist, RodioPlayer, ScanError};
use gridtune::config::Config;
use gridtune::display::{Matrix, TermMatrix, BLACK, RED};
use gridtune::ui::{self, App, EventHandler, TerminalManager};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridtune")]
#[command(about = "Music player driven by a 5-way joystick on an 8x8 pixel matrix")]
struct Args {
    /// Music directory (overrides the config file)
    #[arg(long)]
    music_dir: Option<PathBuf>,

    /// Startup volume 0-100 (overrides the config file)
    #[arg(long)]
    volume: Option<u8>,

    /// Developer mode: keep stderr attached for debug output
    #[arg(long)]
    dev: bool,
}

fn init_logging() -> Result<()> {
    // The terminal is the display surface, so logs only ever go to a file
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "gridtune.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gridtune=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Keep the non-blocking writer alive for the whole process
    std::mem::forget(guard);

    Ok(())
}

/// ALSA spews setup chatter on stderr, which would land in the middle of the
/// matrix. Point stderr at /dev/null unless running with --dev.
fn redirect_stderr_to_null() -> Result<()> {
    unsafe {
        let null_fd = libc::open(
            b"/dev/null\0".as_ptr() as *const libc::c_char,
            libc::O_WRONLY,
        );
        if null_fd == -1 {
            return Err(anyhow::anyhow!("Failed to open /dev/null"));
        }

        if libc::dup2(null_fd, libc::STDERR_FILENO) == -1 {
            libc::close(null_fd);
            return Err(anyhow::anyhow!("Failed to redirect stderr"));
        }
        libc::close(null_fd);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    if !args.dev {
        if let Err(e) = redirect_stderr_to_null() {
            debug!(error = %e, "could not silence stderr, continuing anyway");
        }
    }

    let mut config = Config::load()?;
    if let Some(dir) = args.music_dir {
        config.music_dir = dir;
    }
    if let Some(volume) = args.volume {
        config.default_volume = volume.min(100);
    }

    info!(music_dir = %config.music_dir.display(), "gridtune starting");

    let _terminal = TerminalManager::new()?;
    let mut matrix = TermMatrix::new(config.low_light);
    let scroll = Duration::from_secs_f32(config.scroll_speed);
    ui::startup_marquee(&mut matrix, scroll);

    // Both scan failures are fatal: report on the matrix, then exit non-zero
    let scanner = MusicScanner::new();
    let tracks = match scanner.scan_directory(&config.music_dir) {
        Ok(tracks) => tracks,
        Err(e) => {
            error!(error = %e, "fatal startup error");
            let notice = match &e {
                ScanError::DirectoryNotFound(_) => "NO DIR!",
                ScanError::NoAudioFiles(_) => "NO MUSIC!",
            };
            matrix.scroll_text(notice, RED, BLACK, scroll);
            return Err(e.into());
        }
    };

    let library = Library::new(tracks);
    let playlist = Playlist::new(library.tracks().to_vec())?;
    let player = RodioPlayer::new(config.default_volume)?;
    let mut events = EventHandler::new();

    let mut app = App::new(config, library, playlist, matrix, player);
    app.run(&mut events).await?;

    info!("player gracefully shut down");
    Ok(())
}
