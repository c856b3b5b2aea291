use super::AudioFormat;
use id3::TagLike;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A discovered audio file. Identity is the path; everything else is
/// derived on demand through [`TrackMetadata::read_from`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track {
    pub path: PathBuf,
}

impl Track {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn format(&self) -> AudioFormat {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(AudioFormat::from_extension)
            .unwrap_or(AudioFormat::Unknown)
    }

    /// Filename including extension, used for the library's stable sort order.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
            .to_string()
    }

    /// Filename without extension, the fallback title when tags are missing.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Unknown")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TrackMetadata {
    /// Read tags for `track`, substituting filename-derived values when the
    /// file is unreadable or untagged. Metadata lookup never fails; a bad
    /// file degrades to placeholders instead of aborting navigation.
    pub fn read_from(track: &Track) -> Self {
        let tags = match track.format() {
            AudioFormat::Mp3 => Self::read_id3(&track.path),
            AudioFormat::Mp4 => Self::read_mp4(&track.path),
            _ => None,
        };

        match tags {
            Some(metadata) => metadata.or_fallback(track),
            None => {
                debug!(path = %track.path.display(), "no readable tags, using filename");
                Self::fallback_for(track)
            }
        }
    }

    fn read_id3(path: &Path) -> Option<RawTags> {
        let tag = id3::Tag::read_from_path(path).ok()?;
        Some(RawTags {
            title: tag.title().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            album: tag.album().map(|s| s.to_string()),
        })
    }

    fn read_mp4(path: &Path) -> Option<RawTags> {
        let tag = mp4ameta::Tag::read_from_path(path).ok()?;
        Some(RawTags {
            title: tag.title().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            album: tag.album().map(|s| s.to_string()),
        })
    }

    pub fn fallback_for(track: &Track) -> Self {
        Self {
            title: track.file_stem(),
            artist: "Unknown".to_string(),
            album: "Unknown".to_string(),
        }
    }

    /// One-line form for the now-playing scroll. The artist is omitted when
    /// it is only a placeholder.
    pub fn display_line(&self) -> String {
        if self.artist.is_empty() || self.artist == "Unknown" {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.artist)
        }
    }
}

/// Tag fields as read from the file, before fallback substitution.
struct RawTags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
}

impl RawTags {
    fn or_fallback(self, track: &Track) -> TrackMetadata {
        TrackMetadata {
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| track.file_stem()),
            artist: self
                .artist
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            album: self
                .album
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}
