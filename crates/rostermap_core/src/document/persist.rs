//! Atomic document writes with numbered backups.
//!
//! # Invariants
//! - The target is replaced only after the new content is fully written.
//! - An existing backup is never overwritten; the first free name wins.

use super::error::{DocumentError, DocumentResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// First free backup name: `<stem>.bak`, then `<stem>-1.bak`, `<stem>-2.bak`, ...
pub fn next_backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut candidate = path.with_file_name(format!("{stem}.bak"));
    let mut counter = 1usize;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{stem}-{counter}.bak"));
        counter += 1;
    }
    candidate
}

/// Writes `contents` to `path`, optionally moving the old file aside first.
///
/// Returns the backup path when one was made.
pub(crate) fn write_with_backup(
    path: &Path,
    contents: &str,
    backup: bool,
) -> DocumentResult<Option<PathBuf>> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut staged =
        NamedTempFile::new_in(&directory).map_err(|err| DocumentError::io(&directory, err))?;
    staged
        .write_all(contents.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|err| DocumentError::io(staged.path(), err))?;

    let existing = fs::metadata(path).ok().filter(|meta| meta.is_file());
    if let Some(meta) = &existing {
        staged
            .as_file()
            .set_permissions(meta.permissions())
            .map_err(|err| DocumentError::io(staged.path(), err))?;
    }

    let backup_path = match existing {
        Some(_) if backup => {
            let backup_path = next_backup_path(path);
            fs::rename(path, &backup_path).map_err(|err| DocumentError::io(path, err))?;
            Some(backup_path)
        }
        _ => None,
    };

    staged
        .persist(path)
        .map_err(|err| DocumentError::io(path, err.error))?;
    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::{next_backup_path, write_with_backup};
    use std::fs;

    #[test]
    fn backup_names_skip_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("map.svg");
        assert_eq!(next_backup_path(&target), dir.path().join("map.bak"));

        fs::write(dir.path().join("map.bak"), "old").unwrap();
        assert_eq!(next_backup_path(&target), dir.path().join("map-1.bak"));

        fs::write(dir.path().join("map-1.bak"), "older").unwrap();
        assert_eq!(next_backup_path(&target), dir.path().join("map-2.bak"));
    }

    #[test]
    fn write_without_existing_target_makes_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("list.svg");
        let backup = write_with_backup(&target, "<svg />\n", true).unwrap();
        assert!(backup.is_none());
        assert_eq!(fs::read_to_string(&target).unwrap(), "<svg />\n");
    }

    #[test]
    fn write_moves_previous_content_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("map.svg");
        fs::write(&target, "first").unwrap();

        let backup = write_with_backup(&target, "second", true).unwrap();
        assert_eq!(backup, Some(dir.path().join("map.bak")));
        assert_eq!(fs::read_to_string(dir.path().join("map.bak")).unwrap(), "first");
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    }

    #[test]
    fn write_without_backup_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("map.svg");
        fs::write(&target, "first").unwrap();

        let backup = write_with_backup(&target, "second", false).unwrap();
        assert!(backup.is_none());
        assert!(!dir.path().join("map.bak").exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    }
}
