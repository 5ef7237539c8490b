//! Flat-file codec for media items
//!
//! Every media item lives in its own file named `<tag>-<id>.txt`, holding a
//! single comma-delimited line:
//!
//! ```text
//! id,title,yearPublished,rented,kindSpecificValue
//! ```
//!
//! Fields are not quoted or escaped. A title containing a comma cannot be
//! read back correctly; the format is kept as-is for compatibility with
//! existing data directories.

use crate::media::{Media, MediaDetails, MediaKind};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Number of fields shared by every media kind
const BASE_FIELD_COUNT: usize = 4;

/// Number of fields once the kind-specific value is included
const KIND_FIELD_COUNT: usize = 5;

/// Errors that can occur while materializing a media item
#[derive(Debug, Error)]
pub enum MediaCreationError {
    /// File name could not be interpreted
    #[error("Incorrect name format for media file: {0}")]
    InvalidFileName(PathBuf),

    /// File name prefix is not one of the known kind tags
    #[error("Could not determine media type for file: {0}")]
    UnknownKind(String),

    /// Line has fewer fields than required
    #[error("Incorrect {kind} data format: expected at least {expected} fields, found {found}")]
    TooFewFields {
        kind: MediaKind,
        expected: usize,
        found: usize,
    },

    /// A numeric field could not be parsed
    #[error("Unable to read media: invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    /// Failed to open or read the media file
    #[error("Media file could not be read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Media file contains no line at all
    #[error("Could not read data from file: {0}")]
    EmptyFile(PathBuf),
}

/// Resolves the media kind from a file name
///
/// The kind tag is the part of the name before the first `-`. A name
/// without any `-` is compared as a whole.
///
/// # Examples
///
/// ```
/// use media_rental::{MediaKind, resolve_kind};
///
/// assert_eq!(resolve_kind("EBook-12.txt").unwrap(), MediaKind::EBook);
/// assert!(resolve_kind("Book-12.txt").is_err());
/// ```
pub fn resolve_kind(file_name: &str) -> Result<MediaKind, MediaCreationError> {
    let tag = file_name.split('-').next().unwrap_or(file_name);

    tag.parse::<MediaKind>()
        .map_err(|_| MediaCreationError::UnknownKind(file_name.to_string()))
}

/// Parses one line of a media file into a media item of the given kind
///
/// # Arguments
///
/// * `kind` - The kind resolved from the file name
/// * `line` - The comma-delimited data line
///
/// # Returns
///
/// The parsed `Media`, or a `MediaCreationError` if the line has too few
/// fields or a numeric field is malformed. The rented flag is `true` only
/// for the text `true` in any letter case; every other value reads as
/// `false` without error.
pub fn parse_line(kind: MediaKind, line: &str) -> Result<Media, MediaCreationError> {
    let fields: Vec<&str> = line.split(',').collect();

    if fields.len() < BASE_FIELD_COUNT {
        return Err(MediaCreationError::TooFewFields {
            kind,
            expected: BASE_FIELD_COUNT,
            found: fields.len(),
        });
    }

    let id: i32 = parse_field(fields[0], "id")?;
    let title = fields[1];
    let year_published: i32 = parse_field(fields[2], "year")?;
    let rented = fields[3].eq_ignore_ascii_case("true");

    if fields.len() < KIND_FIELD_COUNT {
        return Err(MediaCreationError::TooFewFields {
            kind,
            expected: KIND_FIELD_COUNT,
            found: fields.len(),
        });
    }

    let value = fields[4];
    let details = match kind {
        MediaKind::EBook => MediaDetails::EBook {
            chapters: parse_field(value, "chapters")?,
        },
        MediaKind::MusicCd => MediaDetails::MusicCd {
            length_minutes: parse_field(value, "length")?,
        },
        MediaKind::MovieDvd => MediaDetails::MovieDvd {
            // Sizes tolerate surrounding whitespace, integers do not
            size_mb: parse_field(value.trim(), "size")?,
        },
    };

    Ok(Media::new(id, title, year_published, rented, details))
}

fn parse_field<T: FromStr>(value: &str, field: &'static str) -> Result<T, MediaCreationError> {
    value.parse().map_err(|_| MediaCreationError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Formats a media item as its single data line
///
/// The title is written verbatim; see the module docs for the comma caveat.
pub fn format_line(media: &Media) -> String {
    let value = match media.details() {
        MediaDetails::EBook { chapters } => chapters.to_string(),
        MediaDetails::MusicCd { length_minutes } => length_minutes.to_string(),
        MediaDetails::MovieDvd { size_mb } => format_size(*size_mb),
    };

    format!(
        "{},{},{},{},{}",
        media.id(),
        media.title(),
        media.year_published(),
        media.is_rented(),
        value
    )
}

/// Whole sizes keep a trailing `.0`, matching existing data files
fn format_size(size_mb: f64) -> String {
    if size_mb.is_finite() && size_mb.fract() == 0.0 {
        format!("{:.1}", size_mb)
    } else {
        size_mb.to_string()
    }
}

/// Returns the file name a media item is stored under
pub fn file_name_for(media: &Media) -> String {
    format!("{}-{}.txt", media.kind().tag(), media.id())
}

/// Reads a media item from its backing file
///
/// The kind is resolved from the file name, then the first line of the
/// file is parsed. Anything after the first line is ignored.
pub fn read_media_file(path: &Path) -> Result<Media, MediaCreationError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| MediaCreationError::InvalidFileName(path.to_path_buf()))?;

    let kind = resolve_kind(file_name)?;

    let file = File::open(path).map_err(|e| MediaCreationError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let line = match BufReader::new(file).lines().next() {
        Some(Ok(line)) => line,
        Some(Err(e)) => {
            return Err(MediaCreationError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
        None => return Err(MediaCreationError::EmptyFile(path.to_path_buf())),
    };

    parse_line(kind, &line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_kind() {
        assert_eq!(resolve_kind("EBook-1.txt").unwrap(), MediaKind::EBook);
        assert_eq!(resolve_kind("MusicCD-22.txt").unwrap(), MediaKind::MusicCd);
        assert_eq!(resolve_kind("MovieDVD-3-extra.txt").unwrap(), MediaKind::MovieDvd);
    }

    #[test]
    fn test_resolve_kind_rejects_unknown_prefix() {
        assert!(matches!(
            resolve_kind("Vinyl-1.txt"),
            Err(MediaCreationError::UnknownKind(_))
        ));
        assert!(resolve_kind("ebook-1.txt").is_err());
        assert!(resolve_kind("EBook").is_ok());
        assert!(resolve_kind("notes.txt").is_err());
    }

    #[test]
    fn test_parse_ebook_line() {
        let media = parse_line(MediaKind::EBook, "7,Dune,1965,false,22").unwrap();
        assert_eq!(media.id(), 7);
        assert_eq!(media.title(), "Dune");
        assert_eq!(media.year_published(), 1965);
        assert!(!media.is_rented());
        assert_eq!(media.details(), &MediaDetails::EBook { chapters: 22 });
    }

    #[test]
    fn test_parse_movie_line() {
        let media = parse_line(MediaKind::MovieDvd, "3,Alien,1979,TRUE,700.0").unwrap();
        assert!(media.is_rented());
        assert_eq!(media.details(), &MediaDetails::MovieDvd { size_mb: 700.0 });
    }

    #[test]
    fn test_parse_negative_counts() {
        let media = parse_line(MediaKind::EBook, "1,Odd,2000,false,-5").unwrap();
        assert_eq!(media.details(), &MediaDetails::EBook { chapters: -5 });

        let media = parse_line(MediaKind::MusicCd, "2,Odd,2000,false,-10").unwrap();
        assert_eq!(media.details(), &MediaDetails::MusicCd { length_minutes: -10 });
    }

    #[test]
    fn test_parse_size_with_surrounding_whitespace() {
        let media = parse_line(MediaKind::MovieDvd, "3,Alien,1979,false, 700.0 ").unwrap();
        assert_eq!(media.details(), &MediaDetails::MovieDvd { size_mb: 700.0 });

        assert!(matches!(
            parse_line(MediaKind::EBook, "1,Dune,1965,false, 22"),
            Err(MediaCreationError::InvalidNumber { field: "chapters", .. })
        ));
    }

    #[test]
    fn test_parse_rented_falls_back_to_false() {
        let media = parse_line(MediaKind::MusicCd, "1,Blue,1959,yes,45").unwrap();
        assert!(!media.is_rented());
        let media = parse_line(MediaKind::MusicCd, "1,Blue,1959,,45").unwrap();
        assert!(!media.is_rented());
    }

    #[test]
    fn test_parse_too_few_fields() {
        assert!(matches!(
            parse_line(MediaKind::EBook, "1,Dune,1965"),
            Err(MediaCreationError::TooFewFields {
                expected: 4,
                found: 3,
                ..
            })
        ));
        assert!(matches!(
            parse_line(MediaKind::EBook, "1,Dune,1965,false"),
            Err(MediaCreationError::TooFewFields {
                expected: 5,
                found: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_invalid_numbers() {
        assert!(matches!(
            parse_line(MediaKind::EBook, "x,Dune,1965,false,3"),
            Err(MediaCreationError::InvalidNumber { field: "id", .. })
        ));
        assert!(matches!(
            parse_line(MediaKind::EBook, "1,Dune,MCMLXV,false,3"),
            Err(MediaCreationError::InvalidNumber { field: "year", .. })
        ));
        assert!(matches!(
            parse_line(MediaKind::MusicCd, "1,Blue,1959,false,long"),
            Err(MediaCreationError::InvalidNumber { field: "length", .. })
        ));
        assert!(matches!(
            parse_line(MediaKind::MovieDvd, "1,Alien,1979,false,big"),
            Err(MediaCreationError::InvalidNumber { field: "size", .. })
        ));
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(&Media::ebook(7, "Dune", 1965, 22)),
            "7,Dune,1965,false,22"
        );
        assert_eq!(
            format_line(&Media::music_cd(8, "Blue", 1959, 45)),
            "8,Blue,1959,false,45"
        );
        assert_eq!(
            format_line(&Media::movie_dvd(9, "Alien", 1979, 700.0)),
            "9,Alien,1979,false,700.0"
        );
        assert_eq!(
            format_line(&Media::movie_dvd(9, "Alien", 1979, 4.7)),
            "9,Alien,1979,false,4.7"
        );
    }

    #[test]
    fn test_format_then_parse_preserves_media() {
        let mut rented = Media::music_cd(2, "Abbey Road", 1969, 47);
        rented.mark_rented();

        for media in [
            Media::ebook(1, "Dune", 1965, 22),
            rented,
            Media::movie_dvd(3, "Alien", 1979, 4.7),
        ] {
            let parsed = parse_line(media.kind(), &format_line(&media)).unwrap();
            assert_eq!(parsed, media);
        }
    }

    #[test]
    fn test_title_with_comma_is_not_preserved() {
        let media = Media::ebook(1, "Crime, and Punishment", 1866, 40);
        let line = format_line(&media);

        // "Crime" becomes the title and " and Punishment" the year
        assert!(matches!(
            parse_line(MediaKind::EBook, &line),
            Err(MediaCreationError::InvalidNumber { field: "year", .. })
        ));
    }

    #[test]
    fn test_file_name_for() {
        assert_eq!(file_name_for(&Media::ebook(12, "a", 2000, 1)), "EBook-12.txt");
        assert_eq!(file_name_for(&Media::music_cd(3, "b", 2000, 1)), "MusicCD-3.txt");
        assert_eq!(
            file_name_for(&Media::movie_dvd(40, "c", 2000, 1.0)),
            "MovieDVD-40.txt"
        );
    }

    #[test]
    fn test_read_media_file_uses_first_line_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EBook-5.txt");
        fs::write(&path, "5,Emma,1815,false,55\ngarbage\n").unwrap();

        let media = read_media_file(&path).unwrap();
        assert_eq!(media, Media::ebook(5, "Emma", 1815, 55));
    }

    #[test]
    fn test_read_media_file_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EBook-5.txt");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            read_media_file(&path),
            Err(MediaCreationError::EmptyFile(_))
        ));
    }

    #[test]
    fn test_read_media_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EBook-404.txt");

        assert!(matches!(
            read_media_file(&path),
            Err(MediaCreationError::ReadFailed { .. })
        ));
    }
}
