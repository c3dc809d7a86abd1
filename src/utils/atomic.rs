//! Atomic file operations
//!
//! Store snapshots are written with the temp-file pattern so the file on
//! disk is always either the previous complete snapshot or the new one:
//!
//! 1. Write to `<name>.tmp` next to the destination
//! 2. `sync_all()` to flush to disk
//! 3. Rename over the destination (atomic on most filesystems)

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temp file used while writing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically write content using a writer function
///
/// # Example
///
/// ```ignore
/// atomic_write_with("jukebox.db.jsonl", |out| {
///     writeln!(out, "line1")?;
///     Ok(())
/// })?;
/// ```
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(&temp_path)?);
    let written = write_fn(&mut writer).and_then(|_| writer.flush());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Remove a temp file left behind by an interrupted write of `path`
///
/// Returns `true` if a stale file was removed.
pub fn remove_stale_temp<P: AsRef<Path>>(path: P) -> io::Result<bool> {
    let temp_path = temp_path_for(path.as_ref());
    if !temp_path.exists() {
        return Ok(false);
    }
    fs::remove_file(&temp_path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_keeps_full_name() {
        let path = Path::new("/data/jukebox.db.jsonl");
        assert_eq!(temp_path_for(path), PathBuf::from("/data/jukebox.db.jsonl.tmp"));
    }

    #[test]
    fn test_atomic_write_with() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.jsonl");

        atomic_write_with(&path, |out| {
            writeln!(out, "Line 1")?;
            writeln!(out, "Line 2")?;
            Ok(())
        })
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Line 1\nLine 2\n");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("subdir").join("nested").join("store.jsonl");

        atomic_write_with(&path, |out| out.write_all(b"nested")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "nested");
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.jsonl");
        fs::write(&path, "old content").unwrap();

        let result = atomic_write_with(&path, |out| {
            out.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "interrupted"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old content");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_remove_stale_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.jsonl");
        fs::write(temp_path_for(&path), "half written").unwrap();
        fs::write(temp_dir.path().join("other.tmp"), "unrelated").unwrap();

        assert!(remove_stale_temp(&path).unwrap());
        assert!(!remove_stale_temp(&path).unwrap());
        assert!(temp_dir.path().join("other.tmp").exists());
    }
}
