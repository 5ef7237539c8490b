use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use media_rental::{LoadEvent, Media, SettingsStore, file_name_for, open_catalog};
use std::path::PathBuf;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn parse_dir(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Track rentable e-books, music CDs and movie DVDs
#[derive(Parser, Debug)]
#[command(name = "media-rental", version)]
struct CliArgs {
    /// Media directory to use (defaults to the last loaded directory)
    #[arg(long, global = true, value_parser = parse_dir)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a media directory, show its contents and remember it
    Load {
        #[arg(value_parser = parse_dir)]
        directory: PathBuf,
    },

    /// List all media
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Search media by title (case-insensitive substring)
    Find {
        text: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rent the media with the given id
    Rent {
        id: i32,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Add new media to the directory
    Add {
        #[command(subcommand)]
        kind: AddKind,
    },
}

#[derive(Subcommand, Debug)]
enum AddKind {
    /// Add an e-book
    Ebook {
        #[command(flatten)]
        common: CommonFields,

        /// Number of chapters
        #[arg(long)]
        chapters: i32,
    },

    /// Add a music CD
    MusicCd {
        #[command(flatten)]
        common: CommonFields,

        /// Length in minutes
        #[arg(long)]
        length: i32,
    },

    /// Add a movie DVD
    MovieDvd {
        #[command(flatten)]
        common: CommonFields,

        /// Size in megabytes
        #[arg(long)]
        size: f64,
    },
}

#[derive(Args, Debug)]
struct CommonFields {
    /// Unique id of the media
    #[arg(long)]
    id: i32,

    /// Title (must not contain commas)
    #[arg(long)]
    title: String,

    /// 4-digit year of publication
    #[arg(long)]
    year: i32,
}

/// Handles load progress events and prints formatted output to stdout
fn handle_load_event(event: LoadEvent) {
    match event {
        LoadEvent::Scanning { directory } => {
            println!("Loading media from {}...", directory.display());
        }
        LoadEvent::FilesFound { count } => {
            println!("Found {} media file(s)", count);
        }
        LoadEvent::Parsed { .. } => {}
        LoadEvent::Loaded { count } => {
            println!("Loaded {} media item(s)\n", count);
        }
    }
}

fn print_table(media: &[&Media]) {
    let headers = ["ID", "Type", "Title", "Year", "Rented", "Info"];
    let rows: Vec<[String; 6]> = media
        .iter()
        .map(|m| {
            [
                m.id().to_string(),
                m.kind().to_string(),
                m.title().to_string(),
                m.year_published().to_string(),
                if m.is_rented() { "yes" } else { "no" }.to_string(),
                m.additional_info(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[&str]| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_row(&headers[..]));
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", format_row(&cells[..]));
    }
}

fn print_media(media: &[&Media], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(media)?);
    } else {
        print_table(media);
    }
    Ok(())
}

fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;
    Ok(())
}

fn run(cli_args: CliArgs) -> Result<()> {
    let store = SettingsStore::open()?;
    let dir = cli_args.dir.as_deref();

    match cli_args.command {
        Command::Load { directory } => {
            let catalog = open_catalog(Some(directory.as_path()), &store, handle_load_event)
                .context("Unable to load media")?;
            let all: Vec<&Media> = catalog.all().iter().collect();
            print_table(&all);
        }
        Command::List { json } => {
            let catalog = open_catalog(dir, &store, |_| {})?;
            let all: Vec<&Media> = catalog.all().iter().collect();
            print_media(&all, json)?;
        }
        Command::Find { text, json } => {
            let catalog = open_catalog(dir, &store, |_| {})?;
            let matches = catalog.find(&text);
            if matches.is_empty() && !json {
                println!("No media was found matching this title");
                return Ok(());
            }
            print_media(&matches, json)?;
        }
        Command::Rent { id, yes } => {
            let mut catalog = open_catalog(dir, &store, |_| {})?;

            if let Some(media) = catalog.get_by_id(id) {
                if media.is_rented() {
                    println!("This media is already rented");
                    return Ok(());
                }

                if !yes {
                    let confirmed = Confirm::new()
                        .with_prompt(format!("Rent item: {}-{}?", media.kind(), media.title()))
                        .default(false)
                        .interact()?;
                    if !confirmed {
                        println!("Rental cancelled.");
                        return Ok(());
                    }
                }
            }

            let fee = catalog.rent(id).context("Unable to rent media")?;
            println!("Media Rental Price: ${:.2}", fee);
        }
        Command::Add { kind } => {
            let media = build_media(kind)?;
            let mut catalog = open_catalog(dir, &store, |_| {})?;
            let file_name = file_name_for(&media);
            catalog.add(media).context("Unable to add media")?;
            println!("Added {}", file_name);
        }
    }

    Ok(())
}

fn build_media(kind: AddKind) -> Result<Media> {
    let (common, media) = match kind {
        AddKind::Ebook { common, chapters } => {
            let media = Media::ebook(common.id, common.title.as_str(), common.year, chapters);
            (common, media)
        }
        AddKind::MusicCd { common, length } => {
            let media = Media::music_cd(common.id, common.title.as_str(), common.year, length);
            (common, media)
        }
        AddKind::MovieDvd { common, size } => {
            let media = Media::movie_dvd(common.id, common.title.as_str(), common.year, size);
            (common, media)
        }
    };

    // Titles are stored unescaped in a comma-delimited line
    if common.title.contains(',') {
        bail!("Title must not contain commas: {}", common.title);
    }

    Ok(media)
}

fn main() {
    let cli_args = CliArgs::parse();

    if let Err(e) = init_logging() {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    if let Err(e) = run(cli_args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_build_media_rejects_commas() {
        let kind = AddKind::Ebook {
            common: CommonFields {
                id: 1,
                title: "Crime, and Punishment".to_string(),
                year: 1866,
            },
            chapters: 40,
        };
        assert!(build_media(kind).is_err());
    }

    #[test]
    fn test_build_media() {
        let kind = AddKind::MovieDvd {
            common: CommonFields {
                id: 3,
                title: "Alien".to_string(),
                year: 1979,
            },
            size: 700.0,
        };
        assert_eq!(build_media(kind).unwrap(), Media::movie_dvd(3, "Alien", 1979, 700.0));
    }

    #[test]
    fn test_cli_parses_add_subcommand() {
        let args = CliArgs::try_parse_from([
            "media-rental",
            "--dir",
            "/tmp",
            "add",
            "music-cd",
            "--id",
            "4",
            "--title",
            "Blue",
            "--year",
            "1959",
            "--length",
            "45",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            Command::Add {
                kind: AddKind::MusicCd { length: 45, .. }
            }
        ));
    }

    #[test]
    fn test_parse_dir_keeps_missing_paths_absolute() {
        let path = parse_dir("definitely-missing-media-dir").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with(Path::new("definitely-missing-media-dir")));
    }
}
