//! Music library - lists the tracks available on disk

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Audio extension the jukebox serves
pub const TRACK_EXTENSION: &str = "mp3";

/// A directory of audio files; track ids are file names without extension
#[derive(Debug, Clone)]
pub struct MusicLibrary {
    dir: PathBuf,
}

impl MusicLibrary {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Track ids of the regular `.mp3` files directly inside the directory
    ///
    /// The extension match is case-insensitive. A missing or unreadable
    /// directory yields an empty list; unreadable entries are skipped.
    pub async fn list_track_ids(&self) -> Vec<String> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Cannot read music directory");
                return Vec::new();
            }
        };

        let mut tracks = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "Error while listing music directory");
                    break;
                }
            };

            let path = entry.path();
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            }

            if let Some(id) = track_id_for(&path) {
                tracks.push(id);
            }
        }

        tracks.sort();
        debug!(dir = %self.dir.display(), count = tracks.len(), "Listed music files");
        tracks
    }
}

/// Track id for an audio file path, or `None` if it is not a track
pub fn track_id_for(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?;
    if !extension.eq_ignore_ascii_case(TRACK_EXTENSION) {
        return None;
    }
    path.file_stem()?.to_str().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_track_id_for() {
        assert_eq!(track_id_for(Path::new("music/Song One.mp3")), Some("Song One".to_string()));
        assert_eq!(track_id_for(Path::new("LOUD.MP3")), Some("LOUD".to_string()));
        assert_eq!(track_id_for(Path::new("cover.jpg")), None);
        assert_eq!(track_id_for(Path::new("README")), None);
    }

    #[tokio::test]
    async fn test_lists_only_mp3_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b_side.mp3"), b"").unwrap();
        fs::write(temp_dir.path().join("A_Side.Mp3"), b"").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(temp_dir.path().join("folder.mp3")).unwrap();

        let library = MusicLibrary::new(temp_dir.path());
        assert_eq!(library.list_track_ids().await, vec!["A_Side", "b_side"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let library = MusicLibrary::new(temp_dir.path().join("nope"));

        assert!(library.list_track_ids().await.is_empty());
    }
}
