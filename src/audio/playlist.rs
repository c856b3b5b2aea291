use super::Track;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("cannot build a playlist from an empty library")]
    EmptyLibrary,
    #[error("track not in playlist: {}", .0.display())]
    TrackNotFound(PathBuf),
}

/// The active play sequence: a shuffled permutation of the library plus a
/// play cursor. `cursor == None` means nothing has played yet.
pub struct Playlist {
    tracks: Vec<Track>,
    cursor: Option<usize>,
    rng: StdRng,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Result<Self, PlaylistError> {
        Self::with_rng(tracks, StdRng::from_entropy())
    }

    /// Deterministic construction for tests; `new` seeds from entropy.
    pub fn with_rng(mut tracks: Vec<Track>, mut rng: StdRng) -> Result<Self, PlaylistError> {
        if tracks.is_empty() {
            return Err(PlaylistError::EmptyLibrary);
        }
        tracks.shuffle(&mut rng);
        info!(count = tracks.len(), "playlist shuffled");
        Ok(Self {
            tracks,
            cursor: None,
            rng,
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.tracks.get(i))
    }

    /// Move the cursor to the head of the sequence (startup playback).
    pub fn jump_to_start(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.cursor = Some(0);
        self.current()
    }

    /// Advance with wraparound. From the unplayed state this lands on the
    /// first track.
    pub fn next(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let next = match self.cursor {
            Some(i) => (i + 1) % self.tracks.len(),
            None => 0,
        };
        self.cursor = Some(next);
        self.current()
    }

    /// Retreat with wraparound. From the unplayed state this lands on the
    /// last track.
    pub fn previous(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let len = self.tracks.len();
        let prev = match self.cursor {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        self.cursor = Some(prev);
        self.current()
    }

    /// Make an explicitly selected track "now playing" while keeping shuffled
    /// continuation: remove it, reshuffle the remainder, reinsert at the
    /// head, cursor to 0.
    pub fn promote_and_play(&mut self, track: &Track) -> Result<(), PlaylistError> {
        let pos = self
            .tracks
            .iter()
            .position(|t| t == track)
            .ok_or_else(|| PlaylistError::TrackNotFound(track.path.clone()))?;
        let chosen = self.tracks.remove(pos);
        self.tracks.shuffle(&mut self.rng);
        self.tracks.insert(0, chosen);
        self.cursor = Some(0);
        Ok(())
    }
}
