use super::Track;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Fatal startup conditions. Anything that goes wrong during the walk other
/// than these two is skipped per entry, not propagated.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("music directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("no supported audio files under {}", .0.display())]
    NoAudioFiles(PathBuf),
}

#[derive(Clone)]
pub struct MusicScanner {
    supported_extensions: Vec<String>,
}

impl MusicScanner {
    pub fn new() -> Self {
        Self {
            supported_extensions: vec![
                "mp3".to_string(),
                "flac".to_string(),
                "ogg".to_string(),
                "oga".to_string(),
                "mp4".to_string(),
                "m4a".to_string(),
                "aac".to_string(),
                "wav".to_string(),
            ],
        }
    }

    /// Walk `root` and collect every supported audio file. The result is the
    /// library's initial track set; order is left to [`super::Library`].
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<Track>, ScanError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(ScanError::DirectoryNotFound(root.to_path_buf()));
        }

        let mut tracks = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            // Skip hidden files (dotfiles)
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with('.'))
            {
                continue;
            }

            // Skip empty files and anything absurdly large
            match fs::metadata(path) {
                Ok(metadata) if metadata.len() == 0 || metadata.len() > 1_000_000_000 => continue,
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            }

            if self.is_supported_file(path) {
                tracks.push(Track::new(path.to_path_buf()));
            }
        }

        if tracks.is_empty() {
            return Err(ScanError::NoAudioFiles(root.to_path_buf()));
        }

        info!(count = tracks.len(), root = %root.display(), "library scan complete");
        Ok(tracks)
    }

    fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let normalized = ext.to_ascii_lowercase();
                self.supported_extensions.contains(&normalized)
            })
            .unwrap_or(false)
    }
}

impl Default for MusicScanner {
    fn default() -> Self {
        Self::new()
    }
}
