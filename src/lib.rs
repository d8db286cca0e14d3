//! Formula 1 Scanner - Identify F1 broadcast recordings in media libraries
//!
//! This library recognizes the naming conventions used by common F1 release
//! groups, derives season/episode style metadata that media libraries can
//! index, and fetches matching artwork from TheSportsDB.

mod artwork;
mod cache;
mod config;
mod convention;
mod file_resolver;
mod resolver;
mod stack;
mod temp;
mod throttle;

pub use artwork::{
    ArtType, ArtworkError, ArtworkFetcher, ArtworkOutcome, ArtworkRequest, EventsProvider,
    HttpImageDownloader, ImageDownloader, SportsDbProvider, SportsEvent, select_artwork,
};
pub use cache::CacheError;
pub use config::{ArtworkConfig, DEFAULT_FALLBACK_YEAR, ScannerConfig};
pub use convention::{
    ConventionId, ConventionMatch, NamingConvention, PatternMatcher, SessionCapture,
    WeekendCapture, builtin_conventions,
};
pub use file_resolver::{
    DirectoryListing, ExtensionDiscovery, FileResolverError, VIDEO_EXTENSIONS, VideoDiscovery,
    list_directory,
};
pub use resolver::{
    EpisodeRecord, EventLookup, ResolveError, ResolvedEpisode, Session, normalize_session_label,
    resolve,
};
pub use stack::{PartStacker, Stacker};
pub use throttle::RateGate;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Progress event emitted during a scan
///
/// These events allow library users to track progress and provide feedback
/// during the scan.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Scan started
    Started { directory: PathBuf },

    /// A directory level is about to be processed
    ScanningDirectory { directory: PathBuf, file_count: usize },

    /// Processing a specific file
    ProcessingFile {
        index: usize,
        total: usize,
        path: PathBuf,
    },

    /// The file matched a naming convention
    ConventionMatched {
        path: PathBuf,
        convention: ConventionId,
    },

    /// A record was added to the output
    RecordCreated { title: String, season: u32, episode: u32 },

    /// The file could not be turned into a record
    FileSkipped { path: PathBuf, reason: String },

    /// An artwork file was checked
    Artwork {
        target: PathBuf,
        outcome: ArtworkOutcome,
    },

    /// Scan complete
    Complete { record_count: usize },
}

/// Top-level error type for scanner operations
///
/// Problems with individual files never surface here; they are logged and the
/// file is skipped.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Error while listing a directory
    #[error("File resolution error: {0}")]
    FileResolver(#[from] FileResolverError),

    /// Error while setting up the artwork fetcher
    #[error("Artwork error: {0}")]
    Artwork(#[from] ArtworkError),
}

/// What the host hands to a scan of one directory level
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Directory being scanned
    pub path: PathBuf,
    /// Candidate files of this directory
    pub files: Vec<PathBuf>,
    /// Candidate subdirectories, scanned recursively
    pub subdirs: Vec<PathBuf>,
    /// Preferred metadata language (currently informational)
    pub language: Option<String>,
    /// Library root that file names are matched relative to; defaults to `path`
    pub root: Option<PathBuf>,
}

impl ScanRequest {
    pub fn new(path: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            path: path.into(),
            files,
            ..Self::default()
        }
    }

    pub fn with_subdirs(mut self, subdirs: Vec<PathBuf>) -> Self {
        self.subdirs = subdirs;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Scans directories for F1 recordings and produces episode records
pub struct Scanner {
    config: ScannerConfig,
    matcher: PatternMatcher,
    discovery: Box<dyn VideoDiscovery>,
    stacker: Box<dyn Stacker>,
    artwork: Option<ArtworkFetcher>,
}

impl Scanner {
    /// Creates a scanner with the built-in collaborators
    ///
    /// Artwork is fetched from TheSportsDB when `config.download_art` is set.
    pub fn new(config: ScannerConfig) -> Result<Self, ScanError> {
        let artwork = if config.download_art {
            Some(ArtworkFetcher::from_config(&config.artwork)?)
        } else {
            None
        };

        Ok(Self::with_collaborators(
            config,
            Box::new(ExtensionDiscovery::default()),
            Box::new(PartStacker),
            artwork,
        ))
    }

    /// Creates a scanner with custom discovery, stacking and artwork handling
    pub fn with_collaborators(
        config: ScannerConfig,
        discovery: Box<dyn VideoDiscovery>,
        stacker: Box<dyn Stacker>,
        artwork: Option<ArtworkFetcher>,
    ) -> Self {
        Self {
            config,
            matcher: PatternMatcher::new(),
            discovery,
            stacker,
            artwork,
        }
    }

    /// Replaces the pattern matcher, e.g. to register extra conventions
    pub fn with_matcher(mut self, matcher: PatternMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scans a directory level and everything below it
    ///
    /// Records are appended to `media` in traversal order; records already in
    /// `media` are left alone. Multi-part files of a directory are stacked
    /// before its subdirectories are scanned. A file that cannot be resolved
    /// is skipped and reported through the progress callback; only failures
    /// to list a subdirectory abort the scan.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use formula1_scanner::{list_directory, ScanRequest, Scanner, ScannerConfig};
    /// use std::path::Path;
    ///
    /// let dir = Path::new("/media/f1/Formula.1.2023x05.70th-Anniversary-GB.Race.SkyF1HD.1080p");
    /// let listing = list_directory(dir).unwrap();
    /// let scanner = Scanner::new(ScannerConfig::default()).unwrap();
    ///
    /// let mut media = Vec::new();
    /// let request = ScanRequest::new(dir, listing.files).with_root("/media/f1");
    /// scanner.scan(request, &mut media, |_| {}).unwrap();
    /// ```
    pub fn scan<F>(
        &self,
        request: ScanRequest,
        media: &mut Vec<EpisodeRecord>,
        mut progress_callback: F,
    ) -> Result<(), ScanError>
    where
        F: FnMut(ProgressEvent),
    {
        progress_callback(ProgressEvent::Started {
            directory: request.path.clone(),
        });

        let root = request.root.clone().unwrap_or_else(|| request.path.clone());
        let before = media.len();
        self.scan_level(request, &root, media, &mut progress_callback)?;

        progress_callback(ProgressEvent::Complete {
            record_count: media.len().saturating_sub(before),
        });
        Ok(())
    }

    fn scan_level(
        &self,
        request: ScanRequest,
        root: &Path,
        media: &mut Vec<EpisodeRecord>,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<(), ScanError> {
        tracing::debug!(
            path = %request.path.display(),
            files = request.files.len(),
            subdirs = request.subdirs.len(),
            language = request.language.as_deref().unwrap_or("-"),
            root = %root.display(),
            "Scanning directory"
        );

        let ScanRequest {
            path,
            mut files,
            mut subdirs,
            language,
            ..
        } = request;

        self.discovery.discover(&mut files, &mut subdirs);

        progress(ProgressEvent::ScanningDirectory {
            directory: path.clone(),
            file_count: files.len(),
        });

        let level_start = media.len();
        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            progress(ProgressEvent::ProcessingFile {
                index,
                total,
                path: file.clone(),
            });

            match self.process_file(file, root, progress) {
                Ok(None) => {}
                Ok(Some(record)) => {
                    progress(ProgressEvent::RecordCreated {
                        title: record.title.clone(),
                        season: record.season,
                        episode: record.episode,
                    });
                    media.push(record);
                }
                Err(e) => {
                    tracing::error!(path = %file.display(), "Skipping file: {}", e);
                    progress(ProgressEvent::FileSkipped {
                        path: file.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Records appended before this level are never touched
        let mut level = media.split_off(level_start);
        self.stacker.stack(&mut level);
        media.append(&mut level);

        for subdir in subdirs {
            let listing = list_directory(&subdir)?;
            let nested = ScanRequest {
                path: subdir,
                files: listing.files,
                subdirs: listing.subdirs,
                language: language.clone(),
                root: Some(root.to_path_buf()),
            };
            self.scan_level(nested, root, media, progress)?;
        }

        Ok(())
    }

    fn process_file(
        &self,
        file: &Path,
        root: &Path,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Option<EpisodeRecord>, ResolveError> {
        let relative = relative_name(file, root);
        tracing::debug!(%relative, "Processing");

        let Some(matched) = self.matcher.match_path(&relative) else {
            tracing::debug!(path = %file.display(), "Not a recognized recording, ignoring");
            return Ok(None);
        };
        progress(ProgressEvent::ConventionMatched {
            path: file.to_path_buf(),
            convention: matched.id(),
        });

        let resolved = resolve(&matched, &relative, file, self.config.fallback_year)?;

        if let (Some(fetcher), Some(lookup)) = (&self.artwork, &resolved.lookup) {
            for request in artwork_requests(file, lookup) {
                let outcome = fetcher.ensure_artwork(&request);
                progress(ProgressEvent::Artwork {
                    target: request.target,
                    outcome,
                });
            }
        }

        Ok(Some(resolved.record))
    }
}

/// Path of `file` relative to `root`, with `/` separators
fn relative_name(file: &Path, root: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative.to_string_lossy().replace('\\', "/")
}

/// Artwork files that should exist for a recognized video
fn artwork_requests<'a>(file: &Path, lookup: &'a EventLookup) -> Vec<ArtworkRequest<'a>> {
    let directory = file.parent().unwrap_or_else(|| Path::new(""));

    vec![
        ArtworkRequest {
            target: directory.join("poster.jpg"),
            art_type: ArtType::Poster,
            lookup,
            allow_placeholder: false,
        },
        ArtworkRequest {
            target: file.with_extension("jpg"),
            art_type: ArtType::Thumbnail,
            lookup,
            allow_placeholder: true,
        },
        ArtworkRequest {
            target: directory.join("fanart.jpg"),
            art_type: ArtType::Fanart,
            lookup,
            allow_placeholder: false,
        },
    ]
}
