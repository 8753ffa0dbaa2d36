//! Timestamped backups of replaced note files.
//!
//! Before a note is overwritten, the previous file is moved into a sibling
//! `backup` folder as `<stem>_<MMM-DD-YYYY_HH.MM.SS><ext>`. The timestamp is
//! the replaced file's last-modified time in local time, so two backups of
//! files modified within the same second share a name. They are not
//! deduplicated.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::constants::{BACKUP_DIR, BACKUP_TIMESTAMP_FORMAT};
use crate::error::NavigatorError;

/// Backup folder used for notes stored next to `path`.
pub fn backup_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(|parent| parent.join(BACKUP_DIR))
        .unwrap_or_else(|| PathBuf::from(BACKUP_DIR))
}

/// Backup file name for `path` last modified at `modified`.
pub fn backup_name(path: &Path, modified: SystemTime) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let timestamp = DateTime::<Local>::from(modified).format(BACKUP_TIMESTAMP_FORMAT);

    format!("{}_{}{}", stem, timestamp, suffix)
}

/// Move an existing file at `path` into its backup folder.
///
/// Returns the backup location, or `None` when there was nothing to back up.
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>, NavigatorError> {
    if !path.is_file() {
        return Ok(None);
    }

    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| NavigatorError::io(path, e))?;

    let dir = backup_dir(path);
    std::fs::create_dir_all(&dir).map_err(|e| NavigatorError::io(&dir, e))?;

    let target = dir.join(backup_name(path, modified));
    std::fs::rename(path, &target).map_err(|e| NavigatorError::io(path, e))?;

    log::debug!("Backed up {:?} to {:?}", path, target);
    Ok(Some(target))
}

/// Write `text` to `path`, first moving any previous content to a backup.
pub fn save_with_backup(path: &Path, text: &str) -> Result<Option<PathBuf>, NavigatorError> {
    let backup = backup_existing(path)?;
    std::fs::write(path, text).map_err(|e| NavigatorError::io(path, e))?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn local_time(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> SystemTime {
        SystemTime::from(Local.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap())
    }

    #[test]
    fn test_backup_name_format() {
        let name = backup_name(Path::new("/x/readme.txt"), local_time(2024, 3, 7, 14, 5, 9));
        assert_eq!(name, "readme_Mar-07-2024_14.05.09.txt");
    }

    #[test]
    fn test_backup_name_without_extension() {
        let name = backup_name(Path::new("notes"), local_time(2023, 12, 31, 23, 59, 58));
        assert_eq!(name, "notes_Dec-31-2023_23.59.58");
    }

    #[test]
    fn test_first_save_creates_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");

        let backup = save_with_backup(&path, "first").unwrap();

        assert!(backup.is_none());
        assert!(!dir.path().join(BACKUP_DIR).exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_overwrite_moves_prior_content_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        fs::write(&path, "old \u{00e9} bytes\r\n").unwrap();
        let modified = local_time(2022, 1, 2, 3, 4, 5);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        let backup = save_with_backup(&path, "new").unwrap().unwrap();

        assert_eq!(
            backup,
            dir.path().join("backup").join("readme_Jan-02-2022_03.04.05.txt")
        );
        assert_eq!(fs::read(&backup).unwrap(), "old \u{00e9} bytes\r\n".as_bytes());
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path().join("backup")).unwrap().count(), 1);
    }
}
