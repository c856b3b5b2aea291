use super::events::{Action, Direction, EventHandler, InputEvent, JoystickEvent};
use crate::audio::{Library, Playback, PlaybackState, Playlist, Track, TrackMetadata};
use crate::config::Config;
use crate::display::{self, Matrix, Rgb, BLACK, BLUE, CYAN, GREEN, ORANGE, RED, YELLOW};
use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Character-select alphabet: the symbols bucket, the digits bucket, then
/// the letters. Entry to CharacterSelect always lands on index 0.
pub const CHAR_LIST: [char; 28] = [
    '#', '1', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q',
    'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

const POLL_QUANTUM: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Startup,
    PlayingNow,
    CharacterSelect,
    TitleSelect,
}

/// The navigation machine: owns the mode, the per-mode substate, the
/// playlist, and the collaborator handles. All state is touched from the
/// single polling loop; nothing here is shared across threads.
pub struct App<M: Matrix, P: Playback> {
    config: Config,
    library: Library,
    playlist: Playlist,
    matrix: M,
    player: P,

    mode: Mode,
    player_state: PlaybackState,
    now_playing: Option<TrackMetadata>,

    // CharacterSelect substate
    char_cursor: usize,
    // TitleSelect substate
    filtered: Vec<Track>,
    filtered_cursor: usize,
    last_selected_char: char,
    // PlayingNow substate
    last_idle_refresh: Instant,

    shutdown_done: bool,
}

impl<M: Matrix, P: Playback> App<M, P> {
    pub fn new(config: Config, library: Library, playlist: Playlist, matrix: M, player: P) -> Self {
        Self {
            config,
            library,
            playlist,
            matrix,
            player,
            mode: Mode::Startup,
            player_state: PlaybackState::Stopped,
            now_playing: None,
            char_cursor: 0,
            filtered: Vec::new(),
            filtered_cursor: 0,
            last_selected_char: CHAR_LIST[0],
            last_idle_refresh: Instant::now(),
            shutdown_done: false,
        }
    }

    /// The polling loop. Each iteration drains pending input oldest-first,
    /// checks the end-of-track signal once, runs the idle display tick once,
    /// then sleeps the quantum. The shutdown path runs on every exit route.
    pub async fn run(&mut self, events: &mut EventHandler) -> Result<()> {
        let result = self.event_loop(events).await;
        self.shutdown();
        result
    }

    async fn event_loop(&mut self, events: &mut EventHandler) -> Result<()> {
        self.begin_playback();

        loop {
            for event in events.drain()? {
                match event {
                    InputEvent::Quit => {
                        info!("quit requested");
                        return Ok(());
                    }
                    InputEvent::Joystick(joystick) => self.dispatch(joystick),
                }
            }

            self.poll_auto_advance();
            self.idle_display_tick();

            tokio::time::sleep(POLL_QUANTUM).await;
        }
    }

    /// Leave Startup: announce readiness and start the first shuffled track.
    fn begin_playback(&mut self) {
        self.flash("READY!", GREEN);
        self.playlist.jump_to_start();
        self.mode = Mode::PlayingNow;
        if let Err(e) = self.play_current() {
            error!(error = %e, "first track refused to play");
            self.player_state = PlaybackState::Stopped;
            self.flash("ERROR!", RED);
            return;
        }
        self.refresh_now_playing();
    }

    /// Feed one joystick event through the transition table. Errors stay
    /// local: log, flash, and keep the loop alive for the next event.
    pub fn dispatch(&mut self, event: JoystickEvent) {
        if event.action != Action::Pressed {
            return;
        }
        if let Err(e) = self.handle_pressed(event.direction) {
            error!(mode = ?self.mode, error = %e, "input event failed");
            self.flash("ERROR!", RED);
        }
    }

    fn handle_pressed(&mut self, direction: Direction) -> Result<()> {
        debug!(mode = ?self.mode, ?direction, "pressed");
        match self.mode {
            Mode::Startup => Ok(()),
            Mode::PlayingNow => self.playing_now_input(direction),
            Mode::CharacterSelect => self.character_select_input(direction),
            Mode::TitleSelect => self.title_select_input(direction),
        }
    }

    fn playing_now_input(&mut self, direction: Direction) -> Result<()> {
        match direction {
            Direction::Up => self.change_volume(10),
            Direction::Down => self.change_volume(-10),
            Direction::Right => self.play_next(),
            Direction::Left => {
                self.enter_character_select();
                Ok(())
            }
            Direction::Middle => self.toggle_play_pause(),
        }
    }

    fn character_select_input(&mut self, direction: Direction) -> Result<()> {
        match direction {
            Direction::Up => {
                self.matrix.clear();
                self.mode = Mode::PlayingNow;
            }
            Direction::Down => {
                // Shortcut past the filter: browse the whole index by title.
                let all = self.library.all_by_title();
                self.enter_title_select(all, CHAR_LIST[self.char_cursor]);
            }
            Direction::Left => {
                self.char_cursor = (self.char_cursor + CHAR_LIST.len() - 1) % CHAR_LIST.len();
                self.show_current_char();
            }
            Direction::Right => {
                self.char_cursor = (self.char_cursor + 1) % CHAR_LIST.len();
                self.show_current_char();
            }
            Direction::Middle => {
                let selected = CHAR_LIST[self.char_cursor];
                let matches = self.library.filter_by_char(selected);
                if matches.is_empty() {
                    self.flash("No Match!", RED);
                    self.show_current_char();
                } else {
                    self.enter_title_select(matches, selected);
                }
            }
        }
        Ok(())
    }

    fn title_select_input(&mut self, direction: Direction) -> Result<()> {
        match direction {
            Direction::Up => {
                // Back out, reminding which character fed this list
                let last = self.last_selected_char.to_string();
                self.flash(&last, ORANGE);
                self.enter_character_select();
            }
            Direction::Down | Direction::Right => {
                if self.filtered.is_empty() {
                    self.flash("No Titles!", RED);
                } else {
                    self.filtered_cursor = (self.filtered_cursor + 1) % self.filtered.len();
                    self.show_current_title();
                }
            }
            Direction::Left => {
                if self.filtered.is_empty() {
                    self.flash("No Titles!", RED);
                } else {
                    let len = self.filtered.len();
                    self.filtered_cursor = (self.filtered_cursor + len - 1) % len;
                    self.show_current_title();
                }
            }
            Direction::Middle => {
                let Some(selected) = self.filtered.get(self.filtered_cursor).cloned() else {
                    self.flash("Select Song!", RED);
                    return Ok(());
                };
                self.playlist.promote_and_play(&selected)?;
                self.play_current()?;
                self.mode = Mode::PlayingNow;
                self.refresh_now_playing();
            }
        }
        Ok(())
    }

    // --- mode entry ---

    fn enter_character_select(&mut self) {
        self.char_cursor = 0;
        self.filtered.clear();
        self.mode = Mode::CharacterSelect;
        self.show_current_char();
        debug!("entered character select");
    }

    /// Entering with an empty selection bounces straight back to
    /// CharacterSelect so the machine can never sit on an empty list.
    fn enter_title_select(&mut self, selection: Vec<Track>, last_char: char) {
        self.last_selected_char = last_char;
        if selection.is_empty() {
            self.flash("No Songs!", RED);
            self.enter_character_select();
            return;
        }
        info!(count = selection.len(), "entered title select");
        self.filtered = selection;
        self.filtered_cursor = 0;
        self.mode = Mode::TitleSelect;
        self.show_current_title();
    }

    // --- playback commands ---

    fn play_current(&mut self) -> Result<()> {
        let track = self
            .playlist
            .current()
            .cloned()
            .ok_or_else(|| anyhow!("no track at the playlist cursor"))?;
        let metadata = self.library.metadata(&track);
        info!(title = %metadata.title, artist = %metadata.artist, "playing");

        self.player.load(&track.path)?;
        self.player.play();
        self.player_state = PlaybackState::Playing;
        self.now_playing = Some(metadata);
        self.flash("PLAY", GREEN);
        Ok(())
    }

    fn play_next(&mut self) -> Result<()> {
        self.playlist.next();
        self.play_current()
    }

    fn toggle_play_pause(&mut self) -> Result<()> {
        if self.player.is_playing() {
            self.player.pause();
            self.player_state = PlaybackState::Paused;
            info!("paused");
            self.flash("PAUSE", BLUE);
        } else if self.player_state == PlaybackState::Paused {
            self.player.play();
            self.player_state = PlaybackState::Playing;
            info!("resumed");
            self.flash("PLAY", GREEN);
        } else if !self.playlist.is_empty() {
            // Stopped with nothing loaded: start from the head of the shuffle
            self.playlist.jump_to_start();
            self.play_current()?;
        }
        Ok(())
    }

    fn change_volume(&mut self, delta: i16) -> Result<()> {
        let current = i16::from(self.player.volume());
        let next = (current + delta).clamp(0, 100) as u8;
        self.player.set_volume(next);
        info!(volume = next, "volume changed");
        self.flash(&format!("Vol {next}%"), CYAN);
        Ok(())
    }

    // --- periodic checks ---

    /// End-of-track means a synthetic "next": same path as a right-press in
    /// PlayingNow, no input event required.
    fn poll_auto_advance(&mut self) {
        if self.player_state != PlaybackState::Playing || !self.player.has_ended() {
            return;
        }
        info!("track ended, auto-advancing");
        if let Err(e) = self.play_next() {
            error!(error = %e, "auto-advance failed");
            self.player_state = PlaybackState::Stopped;
            self.flash("ERROR!", RED);
        }
    }

    fn idle_display_tick(&mut self) {
        if self.mode != Mode::PlayingNow {
            return;
        }
        match self.player_state {
            PlaybackState::Playing if self.last_idle_refresh.elapsed() >= self.idle_interval() => {
                self.refresh_now_playing();
            }
            PlaybackState::Stopped => self.matrix.clear(),
            _ => {}
        }
    }

    // --- display ---

    fn refresh_now_playing(&mut self) {
        if let Some(metadata) = self.now_playing.clone() {
            let speed = self.scroll_speed();
            self.matrix
                .scroll_text(&metadata.display_line(), YELLOW, BLACK, speed);
        }
        self.last_idle_refresh = Instant::now();
    }

    fn show_current_char(&mut self) {
        let ch = CHAR_LIST[self.char_cursor];
        self.last_selected_char = ch;
        self.matrix.show_glyph(ch, ORANGE);
    }

    fn show_current_title(&mut self) {
        let Some(track) = self.filtered.get(self.filtered_cursor).cloned() else {
            self.matrix.clear();
            return;
        };
        let title = self.library.title_of(&track);
        let speed = self.scroll_speed();
        self.matrix.scroll_text(&title, YELLOW, BLACK, speed);
    }

    fn flash(&mut self, message: &str, color: Rgb) {
        let speed = self.scroll_speed();
        self.matrix.scroll_text(message, color, BLACK, speed);
    }

    fn scroll_speed(&self) -> Duration {
        Duration::from_secs_f32(self.config.scroll_speed)
    }

    fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.config.idle_interval_secs)
    }

    /// Idempotent; runs on every exit route exactly once.
    fn shutdown(&mut self) {
        if self.shutdown_done {
            return;
        }
        self.shutdown_done = true;
        info!("shutting down");
        self.player.stop();
        self.player_state = PlaybackState::Stopped;
        display::animate_square_shrink(&mut self.matrix, BLUE);
        self.matrix.clear();
    }
}

/// Startup marquee shown before the library scan begins.
pub fn startup_marquee<M: Matrix>(matrix: &mut M, per_column: Duration) {
    display::animate_square_grow(matrix, GREEN);
    matrix.scroll_text("GRIDTUNE", GREEN, BLACK, per_column);
    matrix.scroll_text("LOADING...", YELLOW, BLACK, per_column);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::GRID_PIXELS;
    use anyhow::bail;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    #[derive(Debug, PartialEq, Eq)]
    enum DisplayCall {
        Clear,
        Glyph(char),
        Scroll(String),
        Pixels,
    }

    #[derive(Default)]
    struct FakeMatrix {
        calls: Vec<DisplayCall>,
    }

    impl Matrix for FakeMatrix {
        fn clear(&mut self) {
            self.calls.push(DisplayCall::Clear);
        }
        fn show_glyph(&mut self, ch: char, _color: Rgb) {
            self.calls.push(DisplayCall::Glyph(ch));
        }
        fn scroll_text(&mut self, text: &str, _fg: Rgb, _bg: Rgb, _per_column: Duration) {
            self.calls.push(DisplayCall::Scroll(text.to_string()));
        }
        fn set_pixels(&mut self, _pixels: &[Rgb; GRID_PIXELS]) {
            self.calls.push(DisplayCall::Pixels);
        }
    }

    #[derive(Default)]
    struct FakePlayer {
        volume: u8,
        playing: bool,
        ended: bool,
        fail_load: bool,
        loaded: Option<PathBuf>,
    }

    impl Playback for FakePlayer {
        fn load(&mut self, path: &std::path::Path) -> Result<()> {
            if self.fail_load {
                bail!("decoder exploded");
            }
            self.loaded = Some(path.to_path_buf());
            self.playing = false;
            self.ended = false;
            Ok(())
        }
        fn play(&mut self) {
            self.playing = self.loaded.is_some();
        }
        fn pause(&mut self) {
            self.playing = false;
        }
        fn stop(&mut self) {
            self.loaded = None;
            self.playing = false;
        }
        fn set_volume(&mut self, percent: u8) {
            self.volume = percent.min(100);
        }
        fn volume(&self) -> u8 {
            self.volume
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn has_ended(&self) -> bool {
            self.ended
        }
    }

    fn press(direction: Direction) -> JoystickEvent {
        JoystickEvent {
            direction,
            action: Action::Pressed,
        }
    }

    fn test_app(names: &[&str]) -> App<FakeMatrix, FakePlayer> {
        let tracks: Vec<Track> = names
            .iter()
            .map(|n| Track::new(PathBuf::from(format!("/music/{n}.mp3"))))
            .collect();
        let library = Library::new(tracks.clone());
        let playlist = Playlist::with_rng(tracks, StdRng::seed_from_u64(42)).unwrap();
        let mut app = App::new(
            Config::default(),
            library,
            playlist,
            FakeMatrix::default(),
            FakePlayer::default(),
        );
        app.mode = Mode::PlayingNow;
        app.player.volume = 70;
        app
    }

    fn scrolled(app: &App<FakeMatrix, FakePlayer>) -> Vec<&str> {
        app.matrix
            .calls
            .iter()
            .filter_map(|c| match c {
                DisplayCall::Scroll(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_volume_clamps_at_the_top() {
        let mut app = test_app(&["a", "b"]);
        app.player.volume = 95;
        app.dispatch(press(Direction::Up));
        assert_eq!(app.player.volume(), 100);
        assert!(scrolled(&app).contains(&"Vol 100%"));
    }

    #[test]
    fn test_volume_clamps_at_the_bottom() {
        let mut app = test_app(&["a", "b"]);
        app.player.volume = 5;
        app.dispatch(press(Direction::Down));
        assert_eq!(app.player.volume(), 0);
    }

    #[test]
    fn test_released_events_are_ignored() {
        let mut app = test_app(&["a", "b"]);
        app.player.volume = 50;
        app.dispatch(JoystickEvent {
            direction: Direction::Up,
            action: Action::Released,
        });
        assert_eq!(app.player.volume(), 50);
        assert_eq!(app.mode, Mode::PlayingNow);
    }

    #[test]
    fn test_left_enters_character_select_at_first_char() {
        let mut app = test_app(&["a", "b"]);
        app.char_cursor = 17; // stale substate from an earlier visit
        app.dispatch(press(Direction::Left));
        assert_eq!(app.mode, Mode::CharacterSelect);
        assert_eq!(app.char_cursor, 0);
        assert_eq!(app.matrix.calls.last(), Some(&DisplayCall::Glyph('#')));
    }

    #[test]
    fn test_character_cursor_wraps_both_ways() {
        let mut app = test_app(&["a"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Left));
        assert_eq!(app.char_cursor, CHAR_LIST.len() - 1);
        app.dispatch(press(Direction::Right));
        assert_eq!(app.char_cursor, 0);
    }

    #[test]
    fn test_character_select_up_returns_to_playing_now() {
        let mut app = test_app(&["a"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Up));
        assert_eq!(app.mode, Mode::PlayingNow);
    }

    #[test]
    fn test_middle_with_no_match_stays_in_character_select() {
        let mut app = test_app(&["Apple"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Right)); // '#' -> '1'
        app.dispatch(press(Direction::Middle));
        assert_eq!(app.mode, Mode::CharacterSelect);
        assert!(scrolled(&app).contains(&"No Match!"));
    }

    #[test]
    fn test_middle_with_match_enters_title_select() {
        let mut app = test_app(&["Apple", "Apricot", "Banana"]);
        app.enter_character_select();
        // '#' -> '1' -> 'A'
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Middle));
        assert_eq!(app.mode, Mode::TitleSelect);
        assert_eq!(app.filtered.len(), 2);
        assert_eq!(app.filtered_cursor, 0);
    }

    #[test]
    fn test_down_browses_the_whole_index() {
        let mut app = test_app(&["Apple", "Banana", "7 Nation"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Down));
        assert_eq!(app.mode, Mode::TitleSelect);
        assert_eq!(app.filtered.len(), 3);
    }

    #[test]
    fn test_empty_title_select_bounces_back_to_character_select() {
        let mut app = test_app(&["a"]);
        app.enter_character_select();
        app.enter_title_select(Vec::new(), 'Q');
        assert_eq!(app.mode, Mode::CharacterSelect);
        assert!(scrolled(&app).contains(&"No Songs!"));
    }

    #[test]
    fn test_title_cursor_wraps_and_scrolls_titles() {
        let mut app = test_app(&["Apple", "Apricot"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Middle));

        app.dispatch(press(Direction::Down));
        assert_eq!(app.filtered_cursor, 1);
        app.dispatch(press(Direction::Down));
        assert_eq!(app.filtered_cursor, 0);
        app.dispatch(press(Direction::Left));
        assert_eq!(app.filtered_cursor, 1);
        assert!(scrolled(&app).contains(&"Apricot"));
    }

    #[test]
    fn test_title_select_up_remembers_last_character() {
        let mut app = test_app(&["Apple"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Middle));
        assert_eq!(app.mode, Mode::TitleSelect);

        app.dispatch(press(Direction::Up));
        assert_eq!(app.mode, Mode::CharacterSelect);
        // the remembered character is flashed on the way out
        assert!(scrolled(&app).contains(&"A"));
        assert_eq!(app.char_cursor, 0);
    }

    #[test]
    fn test_selecting_a_title_promotes_and_plays_it() {
        let mut app = test_app(&["Apple", "Banana", "Cherry"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Middle)); // 'A' filter -> ["Apple"]
        app.dispatch(press(Direction::Middle)); // pick it

        assert_eq!(app.mode, Mode::PlayingNow);
        assert_eq!(app.player_state, PlaybackState::Playing);
        let current = app.playlist.current().unwrap();
        assert_eq!(current.file_stem(), "Apple");
        assert_eq!(app.player.loaded.as_ref(), Some(&current.path));
    }

    #[test]
    fn test_failed_selection_leaves_mode_and_loop_intact() {
        let mut app = test_app(&["Apple", "Banana"]);
        app.enter_character_select();
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Right));
        app.dispatch(press(Direction::Middle));
        assert_eq!(app.mode, Mode::TitleSelect);

        app.player.fail_load = true;
        app.dispatch(press(Direction::Middle));
        assert_eq!(app.mode, Mode::TitleSelect);
        assert!(scrolled(&app).contains(&"ERROR!"));

        // the next event is still processed normally
        app.player.fail_load = false;
        app.dispatch(press(Direction::Middle));
        assert_eq!(app.mode, Mode::PlayingNow);
    }

    #[test]
    fn test_toggle_pauses_and_resumes() {
        let mut app = test_app(&["a", "b"]);
        app.playlist.jump_to_start();
        app.play_current().unwrap();

        app.dispatch(press(Direction::Middle));
        assert_eq!(app.player_state, PlaybackState::Paused);
        assert!(!app.player.is_playing());

        app.dispatch(press(Direction::Middle));
        assert_eq!(app.player_state, PlaybackState::Playing);
        assert!(app.player.is_playing());
    }

    #[test]
    fn test_toggle_from_stopped_starts_the_shuffle_head() {
        let mut app = test_app(&["a", "b"]);
        app.dispatch(press(Direction::Middle));
        assert_eq!(app.player_state, PlaybackState::Playing);
        assert_eq!(
            app.player.loaded.as_deref(),
            Some(app.playlist.tracks()[0].path.as_path())
        );
    }

    #[test]
    fn test_ended_signal_advances_then_right_presses_wrap() {
        let mut app = test_app(&["a", "b", "c"]);
        app.playlist.jump_to_start();
        app.play_current().unwrap();
        let order: Vec<PathBuf> = app.playlist.tracks().iter().map(|t| t.path.clone()).collect();

        app.player.ended = true;
        app.poll_auto_advance();
        assert_eq!(app.player.loaded.as_ref(), Some(&order[1]));

        app.dispatch(press(Direction::Right));
        assert_eq!(app.player.loaded.as_ref(), Some(&order[2]));

        app.dispatch(press(Direction::Right));
        assert_eq!(app.player.loaded.as_ref(), Some(&order[0]));
    }

    #[test]
    fn test_no_auto_advance_while_paused() {
        let mut app = test_app(&["a", "b"]);
        app.playlist.jump_to_start();
        app.play_current().unwrap();
        app.dispatch(press(Direction::Middle)); // pause
        let before = app.player.loaded.clone();

        app.player.ended = true;
        app.poll_auto_advance();
        assert_eq!(app.player.loaded, before);
    }

    #[test]
    fn test_idle_tick_clears_while_stopped() {
        let mut app = test_app(&["a"]);
        app.player_state = PlaybackState::Stopped;
        app.idle_display_tick();
        assert_eq!(app.matrix.calls.last(), Some(&DisplayCall::Clear));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut app = test_app(&["a"]);
        app.playlist.jump_to_start();
        app.play_current().unwrap();

        app.shutdown();
        assert!(app.player.loaded.is_none());
        let calls_after_first = app.matrix.calls.len();

        app.shutdown();
        assert_eq!(app.matrix.calls.len(), calls_after_first);
    }
}
