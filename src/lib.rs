//! MediaRental - Track rentable media stored as flat text files
//!
//! This library provides the core of a small media rental system: e-books,
//! music CDs and movie DVDs are kept one per file in a directory, loaded into
//! a [`Catalog`], searched by title and rented for a fee.

mod catalog;
mod clock;
mod codec;
mod media;
mod settings;
mod storage;

// Re-export error types
pub use catalog::{CatalogError, ErrorCategory, MediaUpdateError};
pub use codec::MediaCreationError;
pub use settings::SettingsError;

pub use catalog::{Catalog, LoadEvent};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{file_name_for, format_line, parse_line, read_media_file, resolve_kind};
pub use media::{
    BASE_RENTAL_FEE, CURRENT_YEAR_SURCHARGE, EBOOK_RATE, MUSIC_CD_RATE, Media, MediaDetails,
    MediaKind, UnknownKindTag, base_rental_fee,
};
pub use settings::{Settings, SettingsStore};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for MediaRental operations
#[derive(Debug, Error)]
pub enum MediaRentalError {
    /// Neither an explicit nor a remembered directory is available
    #[error("No media directory given and none remembered from a previous load")]
    NoDirectorySelected,

    /// Error during a catalog operation
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error while reading or writing settings
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Opens a catalog for the given or remembered directory
///
/// If `directory` is `None`, the directory of the last successful load is
/// taken from the settings store. After a successful load the directory is
/// remembered for the next run.
///
/// # Arguments
///
/// * `directory` - The directory to load, or `None` to reuse the last one
/// * `store` - Settings store holding the remembered directory
/// * `progress_callback` - Closure called with load progress events
///
/// # Returns
///
/// The loaded catalog, using the system clock for rental fees
///
/// # Examples
///
/// ```no_run
/// use media_rental::{open_catalog, SettingsStore};
/// use std::path::Path;
///
/// let store = SettingsStore::open().unwrap();
///
/// // Load a directory and remember it
/// let catalog = open_catalog(Some(Path::new("/path/to/media")), &store, |_| {}).unwrap();
///
/// // Later: reuse the remembered directory
/// let catalog = open_catalog(None, &store, |_| {}).unwrap();
/// for media in catalog.find("dune") {
///     println!("{} {}", media.id(), media.title());
/// }
/// ```
pub fn open_catalog<F>(
    directory: Option<&Path>,
    store: &SettingsStore,
    progress_callback: F,
) -> Result<Catalog, MediaRentalError>
where
    F: FnMut(LoadEvent),
{
    let mut settings = store.load()?;

    let directory: PathBuf = match directory {
        Some(dir) => dir.to_path_buf(),
        None => settings
            .last_directory
            .clone()
            .ok_or(MediaRentalError::NoDirectorySelected)?,
    };

    let mut catalog = Catalog::new();
    catalog.load_with_progress(&directory, progress_callback)?;

    if settings.last_directory.as_deref() != Some(directory.as_path()) {
        settings.last_directory = Some(directory);
        store.store(&settings)?;
    }

    Ok(catalog)
}
