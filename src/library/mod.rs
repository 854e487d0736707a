//! Music library - resolves track names against the asset root

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Background-music assets indexed by file name
#[derive(Debug, Clone, Default)]
pub struct MusicLibrary {
    tracks: HashMap<String, PathBuf>,
}

impl MusicLibrary {
    /// Scan the asset root for audio files. A missing directory yields an
    /// empty library; track resolution then degrades to PARTIAL warnings.
    pub fn scan(root: &Path) -> Self {
        if !root.is_dir() {
            warn!(root = %root.display(), "music asset root missing, library empty");
            return Self::default();
        }

        let mut tracks = HashMap::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let is_audio = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "mp3" | "wav" | "ogg" | "m4a" | "flac"))
                .unwrap_or(false);
            if is_audio {
                let name = entry.file_name().to_string_lossy().to_lowercase();
                tracks.insert(name, entry.path().to_path_buf());
            }
        }

        debug!(tracks = tracks.len(), root = %root.display(), "scanned music library");
        Self { tracks }
    }

    /// Build a library from explicit entries (used by tests)
    pub fn from_entries(entries: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        Self {
            tracks: entries
                .into_iter()
                .map(|(name, path)| (name.to_lowercase(), path))
                .collect(),
        }
    }

    /// Resolve a track name to its asset path, case-insensitively
    pub fn resolve(&self, track: &str) -> Option<&PathBuf> {
        self.tracks.get(&track.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
