//! Naming convention recognition
//!
//! Every distributor of F1 broadcasts names its releases differently. This
//! module holds one pattern per known naming convention and picks the first
//! one that matches a file's path (relative to the library root). `.mp4` and
//! `.mkv` files that match none of them fall through to
//! [`ConventionMatch::Fallback`]; anything else is not matched at all.

use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

// Formula.1.2020x05.70th-Anniversary-GB.Race.SkyF1HD.1080p/02.Race.Session.mp4
static RE_SMCGILL1969: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Formula.1[\._ ](?P<year>[0-9]{4})x(?P<raceno>[0-9]{2})[\._ ](?P<location>.*)[\._ ](?P<session>.*?).SkyF1U?HD.(1080p|SD)/(?P<episode>.*?)[\._ ](?P<description>.*?).mp4",
    )
    .expect("smcgill1969 pattern is valid")
});

// 01.F1.2024.R24.Abu.Dhabi.Grand.Prix.Drivers.Press.Conference.Sky.Sports.F1.UHD.2160P.mkv
static RE_EGORTECH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<episode>[0-9]{2}).F1.(?P<year>[0-9]{4}).R(?P<raceno>[0-9]{2}).(?P<location>.*?).Grand.Prix.(?P<description>.*?).Sky.Sports.F1.UHD.(?P<quality>[0-9]+(P|p)).mkv",
    )
    .expect("egortech pattern is valid")
});

static RE_FALLBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(mp4|mkv)$").expect("fallback pattern is valid"));

/// Identifier of a naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConventionId {
    /// One folder per session, numbered files inside
    Smcgill1969,
    /// One flat bundle per race weekend
    Egortech,
    /// Catch-all for any `.mp4` or `.mkv` file
    Fallback,
}

impl ConventionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConventionId::Smcgill1969 => "smcgill1969",
            ConventionId::Egortech => "egortech",
            ConventionId::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ConventionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields captured from a smcgill1969 release
///
/// These releases put every session into its own folder, so the session
/// label comes from the folder name and the numbered files inside are the
/// parts of that session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCapture {
    pub year: String,
    pub raceno: String,
    pub location: String,
    pub session: String,
    pub episode: String,
    pub description: String,
}

/// Fields captured from an egortech release
///
/// A whole race weekend lives in a single folder; the leading number orders
/// the files and the description names the segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekendCapture {
    pub episode: String,
    pub year: String,
    pub raceno: String,
    pub location: String,
    pub description: String,
    pub quality: String,
}

/// Outcome of matching a path against the known conventions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConventionMatch {
    Smcgill1969(SessionCapture),
    Egortech(WeekendCapture),
    /// No specific convention matched; everything has to be derived from the
    /// raw filename.
    Fallback,
}

impl ConventionMatch {
    /// Returns the identifier of the convention that produced this match
    pub fn id(&self) -> ConventionId {
        match self {
            ConventionMatch::Smcgill1969(_) => ConventionId::Smcgill1969,
            ConventionMatch::Egortech(_) => ConventionId::Egortech,
            ConventionMatch::Fallback => ConventionId::Fallback,
        }
    }
}

/// A named filename pattern together with the extractor for its captures
#[derive(Clone)]
pub struct NamingConvention {
    id: ConventionId,
    pattern: Regex,
    extract: fn(&Captures<'_>) -> Option<ConventionMatch>,
}

impl NamingConvention {
    pub fn new(
        id: ConventionId,
        pattern: Regex,
        extract: fn(&Captures<'_>) -> Option<ConventionMatch>,
    ) -> Self {
        Self {
            id,
            pattern,
            extract,
        }
    }

    pub fn id(&self) -> ConventionId {
        self.id
    }

    /// Checks whether the pattern matches anywhere in the given path
    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Searches the path and extracts the typed capture on success
    pub fn capture(&self, path: &str) -> Option<ConventionMatch> {
        let captures = self.pattern.captures(path)?;
        (self.extract)(&captures)
    }
}

impl fmt::Debug for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingConvention")
            .field("id", &self.id)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

fn group(captures: &Captures<'_>, name: &str) -> Option<String> {
    captures.name(name).map(|m| m.as_str().to_string())
}

fn extract_smcgill1969(captures: &Captures<'_>) -> Option<ConventionMatch> {
    Some(ConventionMatch::Smcgill1969(SessionCapture {
        year: group(captures, "year")?,
        raceno: group(captures, "raceno")?,
        location: group(captures, "location")?,
        session: group(captures, "session")?,
        episode: group(captures, "episode")?,
        description: group(captures, "description")?,
    }))
}

fn extract_egortech(captures: &Captures<'_>) -> Option<ConventionMatch> {
    Some(ConventionMatch::Egortech(WeekendCapture {
        episode: group(captures, "episode")?,
        year: group(captures, "year")?,
        raceno: group(captures, "raceno")?,
        location: group(captures, "location")?,
        description: group(captures, "description")?,
        quality: group(captures, "quality")?,
    }))
}

/// Returns the built-in conventions in matching order
pub fn builtin_conventions() -> Vec<NamingConvention> {
    vec![
        NamingConvention::new(
            ConventionId::Smcgill1969,
            RE_SMCGILL1969.clone(),
            extract_smcgill1969,
        ),
        NamingConvention::new(ConventionId::Egortech, RE_EGORTECH.clone(), extract_egortech),
    ]
}

/// Picks the naming convention for a file path
///
/// Conventions are tried in order and the first match wins, so more specific
/// patterns have to come first. The catch-all is not part of the list: it is
/// tried by [`PatternMatcher::match_path`] after everything else.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    conventions: Vec<NamingConvention>,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher {
    /// Creates a matcher with the built-in conventions
    pub fn new() -> Self {
        Self::with_conventions(builtin_conventions())
    }

    pub fn with_conventions(conventions: Vec<NamingConvention>) -> Self {
        Self { conventions }
    }

    pub fn conventions(&self) -> &[NamingConvention] {
        &self.conventions
    }

    /// Matches a path relative to the scan root
    ///
    /// Returns `None` when neither a convention nor the `.mp4`/`.mkv`
    /// catch-all matches.
    pub fn match_path(&self, path: &str) -> Option<ConventionMatch> {
        for convention in &self.conventions {
            match convention.capture(path) {
                Some(matched) => {
                    tracing::debug!(convention = %convention.id(), path, "Convention matched");
                    return Some(matched);
                }
                None => {
                    tracing::trace!(convention = %convention.id(), path, "Convention did not match");
                }
            }
        }

        if RE_FALLBACK.is_match(path) {
            tracing::debug!(path, "Using fallback convention");
            Some(ConventionMatch::Fallback)
        } else {
            tracing::debug!(path, "No convention matched");
            None
        }
    }
}
