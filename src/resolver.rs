//! Metadata resolution
//!
//! Turns the raw captures of a [`ConventionMatch`] into an [`EpisodeRecord`]
//! the media library understands. Libraries only accept numeric seasons and
//! episodes, so every convention gets mapped onto integers here.

use crate::convention::{ConventionMatch, SessionCapture, WeekendCapture};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:19|20)[0-9]{2}").expect("year pattern is valid"));

/// Errors that can occur while resolving a match into a record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A captured field that has to be numeric is not
    #[error("Field '{field}' is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// The session label has no season number assigned
    #[error("Unknown session label: {0:?}")]
    UnknownSession(String),
}

/// Session types that map onto library seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Session {
    Practice,
    Qualifying,
    Race,
}

impl Session {
    /// Season number used for this session in the library
    pub fn season_number(&self) -> u32 {
        match self {
            Session::Practice => 1,
            Session::Qualifying => 2,
            Session::Race => 3,
        }
    }
}

impl FromStr for Session {
    type Err = ResolveError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "Practice" => Ok(Session::Practice),
            "Qualifying" => Ok(Session::Qualifying),
            "Race" => Ok(Session::Race),
            other => Err(ResolveError::UnknownSession(other.to_string())),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Practice => f.write_str("Practice"),
            Session::Qualifying => f.write_str("Qualifying"),
            Session::Race => f.write_str("Race"),
        }
    }
}

/// A single episode as handed to the media library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeRecord {
    /// Display title, e.g. "2024x24: Abu Dhabi GP Weekend"
    pub title: String,
    /// Session code or round number, depending on the convention
    pub season: u32,
    /// Orders the parts of a season; not unique across seasons
    pub episode: u32,
    /// Short synopsis
    pub description: String,
    pub year: u32,
    /// Files backing this episode, in playback order
    pub parts: Vec<PathBuf>,
}

/// Key used to look up artwork for a race weekend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLookup {
    pub year: u32,
    pub round: u32,
    /// Normalized session label, see [`normalize_session_label`]
    pub session_label: String,
    pub location: String,
}

/// A resolved record plus the artwork lookup key, if the convention has one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEpisode {
    pub record: EpisodeRecord,
    pub lookup: Option<EventLookup>,
}

/// Resolves a convention match into an episode record
///
/// # Arguments
///
/// * `matched` - The convention match for the file
/// * `relative_name` - The file path relative to the scan root, as matched
/// * `part` - The full path of the file, stored as the record's only part
/// * `fallback_year` - Year used by the catch-all when the name has none
///
/// # Errors
///
/// Structured conventions fail when a numeric field does not parse or the
/// session label is unknown. The fallback never fails.
pub fn resolve(
    matched: &ConventionMatch,
    relative_name: &str,
    part: &Path,
    fallback_year: u32,
) -> Result<ResolvedEpisode, ResolveError> {
    let mut resolved = match matched {
        ConventionMatch::Smcgill1969(capture) => resolve_session(capture)?,
        ConventionMatch::Egortech(capture) => resolve_weekend(capture)?,
        ConventionMatch::Fallback => ResolvedEpisode {
            record: resolve_fallback(relative_name, fallback_year),
            lookup: None,
        },
    };

    resolved.record.parts.push(part.to_path_buf());
    Ok(resolved)
}

fn resolve_session(capture: &SessionCapture) -> Result<ResolvedEpisode, ResolveError> {
    let year = parse_number("year", &capture.year)?;
    let round = parse_number("raceno", &capture.raceno)?;
    let episode = parse_number("episode", &capture.episode)?;
    let location = normalize_location(&capture.location);
    let session: Session = capture.session.parse()?;
    let season = session.season_number();

    let description = format!("{} {}", location, season).replace('.', " ");
    let title = format!("{}x{:02}: {} {}", year, round, location, season);

    tracing::debug!(year, round, %session, season, episode, %location, %title, "Resolved session release");

    let lookup_text = format!("{} {}", capture.session, capture.description);
    Ok(ResolvedEpisode {
        record: EpisodeRecord {
            title,
            season,
            episode,
            description,
            year,
            parts: Vec::new(),
        },
        lookup: Some(EventLookup {
            year,
            round,
            session_label: normalize_session_label(&lookup_text),
            location,
        }),
    })
}

fn resolve_weekend(capture: &WeekendCapture) -> Result<ResolvedEpisode, ResolveError> {
    let year = parse_number("year", &capture.year)?;
    let round = parse_number("raceno", &capture.raceno)?;
    let episode = parse_number("episode", &capture.episode)?;
    let location = normalize_location(&capture.location);

    let description = capture.description.replace('.', " ");
    let title = format!("{}x{:02}: {} GP Weekend", year, round, location);

    tracing::debug!(year, round, episode, %location, %description, %title, "Resolved weekend release");

    Ok(ResolvedEpisode {
        record: EpisodeRecord {
            title,
            season: round,
            episode,
            description,
            year,
            parts: Vec::new(),
        },
        lookup: Some(EventLookup {
            year,
            round,
            session_label: normalize_session_label(&capture.description),
            location,
        }),
    })
}

/// Builds a record for a file no convention recognized
fn resolve_fallback(relative_name: &str, fallback_year: u32) -> EpisodeRecord {
    let year = RE_YEAR
        .find(relative_name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(fallback_year);

    let stem = match relative_name.rsplit_once('.') {
        Some((stem, _extension)) => stem,
        None => relative_name,
    };
    let description: String = stem
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' => ' ',
            c => c,
        })
        .collect();
    let description = description.trim().to_string();

    EpisodeRecord {
        title: description.clone(),
        season: 0,
        episode: 0,
        description,
        year,
        parts: Vec::new(),
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<u32, ResolveError> {
    value
        .trim()
        .parse()
        .map_err(|_| ResolveError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn normalize_location(raw: &str) -> String {
    raw.replace(['-', '.'], " ")
}

/// Maps free-form session text onto the event naming used by TheSportsDB
///
/// The checks are case-insensitive and match whole words only, in priority
/// order: shootout, sprint, qualifying, race. Text that contains none of
/// these words is returned trimmed but otherwise unchanged.
///
/// # Examples
///
/// ```
/// use formula1_scanner::normalize_session_label;
///
/// assert_eq!(normalize_session_label("Race Session"), "Grand Prix");
/// assert_eq!(normalize_session_label("Sprint Qualifying"), "Grand Prix Sprint");
/// ```
pub fn normalize_session_label(text: &str) -> String {
    let words: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '.' | '_' | '-' | '/' => ' ',
            c => c,
        })
        .collect();
    let padded = format!(" {} ", words);

    if padded.contains(" shootout ") {
        "Sprint Shootout".to_string()
    } else if padded.contains(" sprint ") {
        "Grand Prix Sprint".to_string()
    } else if padded.contains(" qualifying ") {
        "Qualifying".to_string()
    } else if padded.contains(" race ") {
        "Grand Prix".to_string()
    } else {
        text.trim().to_string()
    }
}
