use super::{Track, TrackMetadata};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// The fixed set of tracks discovered at startup, in a stable
/// case-insensitive filename order, plus a lazily filled metadata cache.
/// The track set never changes after construction; there is no live re-scan.
pub struct Library {
    tracks: Vec<Track>,
    metadata_cache: RefCell<HashMap<PathBuf, TrackMetadata>>,
}

impl Library {
    pub fn new(mut tracks: Vec<Track>) -> Self {
        tracks.sort_by_key(|t| t.file_name().to_lowercase());
        Self {
            tracks,
            metadata_cache: RefCell::new(HashMap::new()),
        }
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

    /// Cached metadata lookup. First access per track reads the file's tags;
    /// unreadable files get filename-derived placeholders, never an error.
    pub fn metadata(&self, track: &Track) -> TrackMetadata {
        if let Some(cached) = self.metadata_cache.borrow().get(&track.path) {
            return cached.clone();
        }
        let metadata = TrackMetadata::read_from(track);
        self.metadata_cache
            .borrow_mut()
            .insert(track.path.clone(), metadata.clone());
        metadata
    }

    pub fn title_of(&self, track: &Track) -> String {
        self.metadata(track).title
    }

    /// Tracks whose title matches the selected character, sorted by
    /// case-folded title. `'#'` collects titles starting with neither a
    /// letter nor a digit, `'1'` collects digit-leading titles, a letter
    /// matches case-folded equality on the first character.
    pub fn filter_by_char(&self, selected: char) -> Vec<Track> {
        let mut matched: Vec<Track> = self
            .tracks
            .iter()
            .filter(|t| Self::title_matches(&self.title_of(t), selected))
            .cloned()
            .collect();
        self.sort_by_title(&mut matched);
        debug!(selected = %selected, count = matched.len(), "character filter");
        matched
    }

    /// The whole index sorted by title, for the "all songs" shortcut.
    pub fn all_by_title(&self) -> Vec<Track> {
        let mut all = self.tracks.clone();
        self.sort_by_title(&mut all);
        all
    }

    fn sort_by_title(&self, tracks: &mut [Track]) {
        tracks.sort_by_key(|t| self.title_of(t).to_lowercase());
    }

    fn title_matches(title: &str, selected: char) -> bool {
        let Some(first) = title.trim().chars().next() else {
            return false;
        };
        match selected {
            '#' => !first.is_alphabetic() && !first.is_numeric(),
            '1' => first.is_numeric(),
            letter => first.to_lowercase().eq(letter.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Paths deliberately do not exist: metadata falls back to the filename
    // stem, which doubles as the title fixture.
    fn library_of(names: &[&str]) -> Library {
        Library::new(
            names
                .iter()
                .map(|n| Track::new(PathBuf::from(format!("/fixtures/{n}"))))
                .collect(),
        )
    }

    fn titles(tracks: &[Track]) -> Vec<String> {
        tracks.iter().map(Track::file_stem).collect()
    }

    #[test]
    fn test_tracks_sorted_by_filename_case_insensitive() {
        let library = library_of(&["b.mp3", "A.mp3", "c.mp3"]);
        let names: Vec<String> = library.tracks().iter().map(Track::file_name).collect();
        assert_eq!(names, vec!["A.mp3", "b.mp3", "c.mp3"]);
    }

    #[test]
    fn test_filter_symbol_digit_and_letter_buckets() {
        let library = library_of(&["7 Nation.mp3", "!Boom.mp3", "Apple.mp3"]);

        assert_eq!(titles(&library.filter_by_char('#')), vec!["!Boom"]);
        assert_eq!(titles(&library.filter_by_char('1')), vec!["7 Nation"]);
        assert_eq!(titles(&library.filter_by_char('A')), vec!["Apple"]);
    }

    #[test]
    fn test_filter_letter_is_case_folded() {
        let library = library_of(&["apple.mp3", "Apricot.mp3", "Banana.mp3"]);
        assert_eq!(titles(&library.filter_by_char('A')), vec!["apple", "Apricot"]);
    }

    #[test]
    fn test_filter_no_match_is_empty() {
        let library = library_of(&["Apple.mp3"]);
        assert!(library.filter_by_char('Z').is_empty());
    }

    #[test]
    fn test_filter_results_sorted_by_title() {
        let library = library_of(&["ab.mp3", "Aa.mp3", "AC.mp3"]);
        assert_eq!(titles(&library.filter_by_char('A')), vec!["Aa", "ab", "AC"]);
    }

    #[test]
    fn test_all_by_title_covers_whole_index() {
        let library = library_of(&["b.mp3", "a.mp3", "1.mp3"]);
        assert_eq!(titles(&library.all_by_title()), vec!["1", "a", "b"]);
    }

    #[test]
    fn test_metadata_is_cached() {
        let library = library_of(&["Apple.mp3"]);
        let track = library.tracks()[0].clone();
        let first = library.metadata(&track);
        let second = library.metadata(&track);
        assert_eq!(first, second);
        assert_eq!(library.metadata_cache.borrow().len(), 1);
    }
}
