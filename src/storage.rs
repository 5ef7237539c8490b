//! Atomic file writes
//!
//! Media files are rewritten on every update. To avoid leaving a truncated
//! file behind when a write fails, content is first written to a staging
//! file next to the destination and then renamed over it.

use std::fs::{self, File};
use std::io::{self, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Suffix of staging files
const STAGING_SUFFIX: &str = ".tmp";

/// Guard for a staging file that removes it on drop unless it was committed
#[derive(Debug)]
pub(crate) struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Creates a uniquely named staging file for `destination`
    ///
    /// The staging file lives in the same directory as the destination so
    /// the final rename stays on one filesystem. Its name is generated using
    /// ULID (monotonic, sortable unique identifier).
    fn create(destination: &Path) -> io::Result<(Self, File)> {
        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let ulid = ulid::Ulid::new();
        let path = parent.join(format!(".{}.{}{}", name, ulid, STAGING_SUFFIX));

        let file = File::create(&path)?;

        Ok((
            Self {
                path,
                committed: false,
            },
            file,
        ))
    }

    /// Moves the staging file over `destination`
    fn commit(mut self, destination: &Path) -> io::Result<()> {
        fs::rename(&self.path, destination)?;
        self.committed = true;
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            // Silently ignore errors during cleanup
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl Deref for StagedFile {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path()
    }
}

/// Writes `contents` to `destination`, replacing any existing file
///
/// Either the complete new content is in place afterwards or the previous
/// file is left untouched. The staging file is removed on every error path.
pub(crate) fn write_atomically(destination: &Path, contents: &str) -> io::Result<()> {
    let (staged, mut file) = StagedFile::create(destination)?;

    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    staged.commit(destination)
}

/// Returns true if `file_name` is a staging file left by a crash
///
/// Staging files are named `.<name>.<ulid>.tmp`; other hidden files do not
/// match.
pub(crate) fn is_staging_file(file_name: &str) -> bool {
    let Some(inner) = file_name
        .strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(STAGING_SUFFIX))
    else {
        return false;
    };

    match inner.rsplit_once('.') {
        Some((name, ulid)) => !name.is_empty() && ulid::Ulid::from_string(ulid).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomically_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EBook-1.txt");

        write_atomically(&path, "1,Dune,1965,false,22").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1,Dune,1965,false,22");
    }

    #[test]
    fn test_write_atomically_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EBook-1.txt");
        fs::write(&path, "old content that is longer than the new one").unwrap();

        write_atomically(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_no_staging_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EBook-1.txt");

        write_atomically(&path, "content").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["EBook-1.txt".to_string()]);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("EBook-1.txt");

        assert!(write_atomically(&path, "content").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_staged_file_cleanup_on_drop() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("MusicCD-2.txt");

        let path = {
            let (staged, _file) = StagedFile::create(&destination).unwrap();
            let path = staged.to_path_buf();
            assert!(path.exists());
            assert!(is_staging_file(&path.file_name().unwrap().to_string_lossy()));
            path
        };

        assert!(!path.exists());
        assert!(!destination.exists());
    }

    #[test]
    fn test_is_staging_file() {
        let ulid = ulid::Ulid::new();
        assert!(is_staging_file(&format!(".EBook-1.txt.{}.tmp", ulid)));
        assert!(!is_staging_file("EBook-1.txt"));
        assert!(!is_staging_file(".hidden"));
        assert!(!is_staging_file(".notes.tmp"));
        assert!(!is_staging_file(".EBook-3.txt.tmp"));
        assert!(!is_staging_file(&format!(".{}.tmp", ulid)));
    }
}
