//! Media data model
//!
//! This module defines the rentable items tracked by the catalog: e-books,
//! music CDs and movie DVDs. Each item shares a common set of attributes
//! (id, title, year of publication, rental status) and carries exactly one
//! kind-specific attribute that drives its rental fee.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default rental fee, used by kinds that do not define their own rule
pub const BASE_RENTAL_FEE: f64 = 3.50;

/// Fee per chapter of an e-book
pub const EBOOK_RATE: f64 = 0.10;

/// Fee per minute of a music CD
pub const MUSIC_CD_RATE: f64 = 0.02;

/// Added to per-unit fees when the item was published in the current year
pub const CURRENT_YEAR_SURCHARGE: f64 = 1.00;

/// The closed set of media kinds
///
/// Every kind has a fixed tag which is used as the file name prefix of its
/// backing file (`<tag>-<id>.txt`). Adding a kind means extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// An electronic book, priced by chapter count
    EBook,
    /// A music CD, priced by playing length
    MusicCd,
    /// A movie DVD, priced at the base fee
    MovieDvd,
}

impl MediaKind {
    /// Returns the file name tag for this kind
    pub fn tag(&self) -> &'static str {
        match self {
            MediaKind::EBook => "EBook",
            MediaKind::MusicCd => "MusicCD",
            MediaKind::MovieDvd => "MovieDVD",
        }
    }

    /// Returns all known kinds
    pub fn all() -> [MediaKind; 3] {
        [MediaKind::EBook, MediaKind::MusicCd, MediaKind::MovieDvd]
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a string is not one of the known kind tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKindTag(pub String);

impl fmt::Display for UnknownKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown media kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKindTag {}

impl FromStr for MediaKind {
    type Err = UnknownKindTag;

    /// Matches the tag exactly (case-sensitive), as file names are written
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaKind::all()
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| UnknownKindTag(s.to_string()))
    }
}

/// The kind-specific attribute of a media item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum MediaDetails {
    /// E-book with its number of chapters
    EBook { chapters: i32 },
    /// Music CD with its length in minutes
    #[serde(rename = "MusicCD")]
    MusicCd { length_minutes: i32 },
    /// Movie DVD with its size in megabytes
    #[serde(rename = "MovieDVD")]
    MovieDvd { size_mb: f64 },
}

impl MediaDetails {
    /// Returns the kind these details belong to
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaDetails::EBook { .. } => MediaKind::EBook,
            MediaDetails::MusicCd { .. } => MediaKind::MusicCd,
            MediaDetails::MovieDvd { .. } => MediaKind::MovieDvd,
        }
    }
}

/// A single rentable item
///
/// The id is fixed at creation. The rental flag only ever moves from
/// `false` to `true` through [`Media::mark_rented`]; there is no return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Media {
    id: i32,
    title: String,
    year_published: i32,
    rented: bool,
    details: MediaDetails,
}

impl Media {
    /// Creates a media item from explicit field values
    pub fn new(
        id: i32,
        title: impl Into<String>,
        year_published: i32,
        rented: bool,
        details: MediaDetails,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            year_published,
            rented,
            details,
        }
    }

    /// Creates an e-book that has not been rented yet
    pub fn ebook(id: i32, title: impl Into<String>, year_published: i32, chapters: i32) -> Self {
        Self::new(
            id,
            title,
            year_published,
            false,
            MediaDetails::EBook { chapters },
        )
    }

    /// Creates a music CD that has not been rented yet
    pub fn music_cd(
        id: i32,
        title: impl Into<String>,
        year_published: i32,
        length_minutes: i32,
    ) -> Self {
        Self::new(
            id,
            title,
            year_published,
            false,
            MediaDetails::MusicCd { length_minutes },
        )
    }

    /// Creates a movie DVD that has not been rented yet
    pub fn movie_dvd(id: i32, title: impl Into<String>, year_published: i32, size_mb: f64) -> Self {
        Self::new(
            id,
            title,
            year_published,
            false,
            MediaDetails::MovieDvd { size_mb },
        )
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn year_published(&self) -> i32 {
        self.year_published
    }

    pub fn set_year_published(&mut self, year_published: i32) {
        self.year_published = year_published;
    }

    pub fn is_rented(&self) -> bool {
        self.rented
    }

    /// Marks the item as rented
    pub fn mark_rented(&mut self) {
        self.rented = true;
    }

    /// Restores the rental flag after a failed save
    pub(crate) fn restore_rented(&mut self, rented: bool) {
        self.rented = rented;
    }

    pub fn kind(&self) -> MediaKind {
        self.details.kind()
    }

    pub fn details(&self) -> &MediaDetails {
        &self.details
    }

    /// Replaces the kind-specific attribute
    ///
    /// Returns `false` and leaves the item untouched if the new details
    /// belong to a different kind.
    pub fn set_details(&mut self, details: MediaDetails) -> bool {
        if details.kind() != self.kind() {
            return false;
        }
        self.details = details;
        true
    }

    /// Returns a one-line description of the kind-specific attribute
    ///
    /// # Examples
    ///
    /// ```
    /// use media_rental::Media;
    ///
    /// assert_eq!(Media::ebook(1, "Dune", 1965, 12).additional_info(), "chapters: 12");
    /// assert_eq!(Media::movie_dvd(2, "Alien", 1979, 700.0).additional_info(), "size: 700.00MB");
    /// ```
    pub fn additional_info(&self) -> String {
        match &self.details {
            MediaDetails::EBook { chapters } => format!("chapters: {}", chapters),
            MediaDetails::MusicCd { length_minutes } => format!("length: {} minutes", length_minutes),
            MediaDetails::MovieDvd { size_mb } => format!("size: {:.2}MB", size_mb),
        }
    }

    /// Calculates the rental fee for this item
    ///
    /// E-books and music CDs are priced per unit and cost an extra
    /// [`CURRENT_YEAR_SURCHARGE`] when published in `current_year`.
    /// Movie DVDs use the base fee.
    ///
    /// # Arguments
    ///
    /// * `current_year` - The calendar year the rental happens in
    pub fn rental_fee(&self, current_year: i32) -> f64 {
        match &self.details {
            MediaDetails::EBook { chapters } => {
                per_unit_fee(f64::from(*chapters) * EBOOK_RATE, self.year_published, current_year)
            }
            MediaDetails::MusicCd { length_minutes } => per_unit_fee(
                f64::from(*length_minutes) * MUSIC_CD_RATE,
                self.year_published,
                current_year,
            ),
            MediaDetails::MovieDvd { .. } => base_rental_fee(),
        }
    }
}

/// The fee charged by kinds without a rule of their own
pub fn base_rental_fee() -> f64 {
    BASE_RENTAL_FEE
}

fn per_unit_fee(fee: f64, year_published: i32, current_year: i32) -> f64 {
    if year_published == current_year {
        fee + CURRENT_YEAR_SURCHARGE
    } else {
        fee
    }
}
