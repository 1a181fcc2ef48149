//! Filesystem helpers for vault files and export bundles.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write `data` to `path` so that readers see either the old file or the
/// complete new one.
///
/// The bytes go to a sibling temp file that is synced and then renamed over
/// the destination. A failed write leaves the destination untouched.
///
/// # Errors
///
/// Returns an error if the temp file cannot be created, written, synced or
/// moved into place.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = temp_sibling(path)?;

    let result = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()
    })();
    if let Err(err) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    replace_file(&temp_path, path)
}

fn temp_sibling(path: &Path) -> io::Result<PathBuf> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid destination filename"))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("System time error: {}", e)))?
        .as_nanos();
    let temp_name = format!(".{}.{}.tmp", filename, nanos);
    Ok(match path.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    })
}

/// Rename `temp_path` over `destination`.
///
/// Some platforms refuse to rename onto an existing file, so on failure the
/// destination is removed and the rename retried once. The temp file is
/// removed if both attempts fail.
fn replace_file(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_new_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("export.json");

        write_atomic(&dest, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "{}");
    }

    #[test]
    fn test_write_overwrites_existing() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("export.json");
        fs::write(&dest, b"old").unwrap();

        write_atomic(&dest, b"new").unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("export.json");

        write_atomic(&dest, b"one").unwrap();
        write_atomic(&dest, b"two").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("export.json")]);
    }

    #[test]
    fn test_missing_parent_fails_cleanly() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("missing").join("export.json");

        assert!(write_atomic(&dest, b"data").is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("a").join("b").join("notes.vault");

        ensure_parent_dir(&dest).unwrap();

        assert!(dir.path().join("a").join("b").is_dir());
    }
}
