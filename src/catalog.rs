//! Catalog of media items backed by a directory
//!
//! The catalog owns the in-memory collection of media items for one loaded
//! directory and is the only component that knows which directory is active.
//! It loads every file of a directory at once, persists items on every
//! change, and answers title searches and rentals.

use crate::clock::{Clock, SystemClock};
use crate::codec::{self, MediaCreationError};
use crate::media::Media;
use crate::storage;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while persisting media items
#[derive(Debug, Error)]
pub enum MediaUpdateError {
    /// No directory has been loaded yet
    #[error("No directory available to save")]
    NoDirectory,

    /// A media item with the same id is already in the catalog
    #[error("Media with id {0} already exists")]
    DuplicateId(i32),

    /// Failed to write the media file
    #[error("Failed to write media file {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// Errors returned by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Directory contains no media files
    #[error("No media files found in directory: {0}")]
    NoMediaFiles(PathBuf),

    /// Directory is missing or cannot be listed
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed { path: PathBuf, source: io::Error },

    /// No media item has the requested id
    #[error("Could not find media for id: {0}")]
    MediaNotFound(i32),

    /// No media item at the requested position
    #[error("No media available at index: {0}")]
    IndexOutOfRange(usize),

    /// A media file could not be turned into a media item
    #[error("Unable to create media: {0}")]
    Creation(#[from] MediaCreationError),

    /// A media item could not be persisted
    #[error("Unable to update media: {0}")]
    Update(#[from] MediaUpdateError),
}

/// Coarse classification of catalog errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed file name, malformed line or unreadable media file
    Creation,
    /// Empty or unreadable directory, or unknown media id
    NotFound,
    /// Failure to persist a media item
    Update,
}

impl CatalogError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CatalogError::NoMediaFiles(_)
            | CatalogError::ReadDirectoryFailed { .. }
            | CatalogError::MediaNotFound(_)
            | CatalogError::IndexOutOfRange(_) => ErrorCategory::NotFound,
            CatalogError::Creation(_) => ErrorCategory::Creation,
            CatalogError::Update(_) => ErrorCategory::Update,
        }
    }
}

/// Progress event emitted while loading a directory
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// Listing the directory
    Scanning { directory: PathBuf },

    /// Media files found in the directory
    FilesFound { count: usize },

    /// A media file was parsed
    Parsed {
        index: usize,
        total: usize,
        path: PathBuf,
        id: i32,
    },

    /// Load complete, the catalog now holds `count` items
    Loaded { count: usize },
}

/// In-memory collection of media items for one directory
///
/// Items are kept sorted by ascending id after each load; items added later
/// are appended. The clock decides which year counts as "current" for
/// rental fees.
#[derive(Debug)]
pub struct Catalog<C: Clock = SystemClock> {
    directory: Option<PathBuf>,
    media: Vec<Media>,
    clock: C,
}

impl Catalog<SystemClock> {
    /// Creates an empty catalog using the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Catalog<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Catalog<C> {
    /// Creates an empty catalog using the given clock
    pub fn with_clock(clock: C) -> Self {
        Self {
            directory: None,
            media: Vec::new(),
            clock,
        }
    }

    /// Loads all media files of a directory
    ///
    /// See [`Catalog::load_with_progress`].
    pub fn load(&mut self, directory: &Path) -> Result<(), CatalogError> {
        self.load_with_progress(directory, |_| {})
    }

    /// Loads all media files of a directory, reporting progress
    ///
    /// Every entry of the directory (non-recursive) must be a media file
    /// named `<tag>-<id>.txt`. Loading is all-or-nothing: if the directory is
    /// empty or unreadable, or any single file fails to parse, the catalog is
    /// left empty with no active directory and the error is returned.
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory to load
    /// * `progress_callback` - Closure called with progress events
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_rental::{Catalog, LoadEvent};
    /// use std::path::Path;
    ///
    /// let mut catalog = Catalog::new();
    /// catalog
    ///     .load_with_progress(Path::new("/path/to/media"), |event| {
    ///         if let LoadEvent::Loaded { count } = event {
    ///             println!("Loaded {} item(s)", count);
    ///         }
    ///     })
    ///     .unwrap();
    /// ```
    pub fn load_with_progress<F>(
        &mut self,
        directory: &Path,
        mut progress_callback: F,
    ) -> Result<(), CatalogError>
    where
        F: FnMut(LoadEvent),
    {
        match read_directory(directory, &mut progress_callback) {
            Ok(mut media) => {
                // Catalog order is by id, independent of directory order
                media.sort_by_key(|m| m.id());
                info!(
                    directory = %directory.display(),
                    count = media.len(),
                    "Loaded media catalog"
                );
                progress_callback(LoadEvent::Loaded { count: media.len() });

                self.media = media;
                self.directory = Some(directory.to_path_buf());
                Ok(())
            }
            Err(e) => {
                // Nothing of the previous catalog survives a failed load
                warn!(directory = %directory.display(), error = %e, "Failed to load media catalog");
                self.media.clear();
                self.directory = None;
                Err(e)
            }
        }
    }

    /// Writes a media item to its file in the active directory
    ///
    /// The file is named `<tag>-<id>.txt` and replaced if it exists.
    pub fn save(&self, media: &Media) -> Result<(), MediaUpdateError> {
        let directory = self
            .directory
            .as_ref()
            .ok_or(MediaUpdateError::NoDirectory)?;

        let path = directory.join(codec::file_name_for(media));
        let line = codec::format_line(media);

        storage::write_atomically(&path, &line).map_err(|e| MediaUpdateError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

        debug!(path = %path.display(), "Saved media");
        Ok(())
    }

    /// Saves a new media item and appends it to the catalog
    ///
    /// The item is only added once it has been written successfully. An
    /// item whose id is already present is rejected without writing.
    pub fn add(&mut self, media: Media) -> Result<(), CatalogError> {
        if self.get_by_id(media.id()).is_some() {
            return Err(MediaUpdateError::DuplicateId(media.id()).into());
        }

        self.save(&media)?;

        info!(id = media.id(), kind = %media.kind(), title = media.title(), "Added media");
        self.media.push(media);
        Ok(())
    }

    /// Returns all media items whose title contains `title`, ignoring case
    pub fn find(&self, title: &str) -> Vec<&Media> {
        let needle = title.to_lowercase();

        self.media
            .iter()
            .filter(|m| m.title().to_lowercase().contains(&needle))
            .collect()
    }

    /// Returns all media items in catalog order
    pub fn all(&self) -> &[Media] {
        &self.media
    }

    /// Returns the media item at the given position
    pub fn get(&self, index: usize) -> Result<&Media, CatalogError> {
        self.media
            .get(index)
            .ok_or(CatalogError::IndexOutOfRange(index))
    }

    /// Returns the first media item with the given id
    pub fn get_by_id(&self, id: i32) -> Option<&Media> {
        self.media.iter().find(|m| m.id() == id)
    }

    /// Rents the media item with the given id and returns its rental fee
    ///
    /// The item is marked as rented and saved. If saving fails the rented
    /// flag is restored to its previous value and the error is returned.
    pub fn rent(&mut self, id: i32) -> Result<f64, CatalogError> {
        let index = self
            .media
            .iter()
            .position(|m| m.id() == id)
            .ok_or(CatalogError::MediaNotFound(id))?;

        // Mark first, then persist; roll back if the file cannot be written
        let was_rented = self.media[index].is_rented();
        self.media[index].mark_rented();

        if let Err(e) = self.save(&self.media[index]) {
            warn!(id, error = %e, "Failed to save rental, restoring previous state");
            self.media[index].restore_rented(was_rented);
            return Err(e.into());
        }

        let fee = self.media[index].rental_fee(self.clock.current_year());
        info!(id, fee, "Rented media");
        Ok(fee)
    }

    /// Returns the directory of the last successful load
    pub fn active_directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Returns the clock used for rental fees
    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

/// Reads and parses every media file in a directory
fn read_directory<F>(directory: &Path, progress_callback: &mut F) -> Result<Vec<Media>, CatalogError>
where
    F: FnMut(LoadEvent),
{
    progress_callback(LoadEvent::Scanning {
        directory: directory.to_path_buf(),
    });

    let read_failed = |e: io::Error| CatalogError::ReadDirectoryFailed {
        path: directory.to_path_buf(),
        source: e,
    };

    // Collect every entry except leftovers of interrupted saves
    let mut paths = Vec::new();
    for entry in fs::read_dir(directory).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;

        if storage::is_staging_file(&entry.file_name().to_string_lossy()) {
            debug!(path = %entry.path().display(), "Skipping staging file");
            continue;
        }

        paths.push(entry.path());
    }

    // An empty directory is treated like a missing one
    if paths.is_empty() {
        return Err(CatalogError::NoMediaFiles(directory.to_path_buf()));
    }

    progress_callback(LoadEvent::FilesFound { count: paths.len() });

    // Parse each file; the first failure aborts the whole load
    let total = paths.len();
    let mut media = Vec::with_capacity(total);

    for (index, path) in paths.into_iter().enumerate() {
        let item = codec::read_media_file(&path)?;
        debug!(path = %path.display(), id = item.id(), "Parsed media file");

        progress_callback(LoadEvent::Parsed {
            index,
            total,
            path,
            id: item.id(),
        });
        media.push(item);
    }

    Ok(media)
}
