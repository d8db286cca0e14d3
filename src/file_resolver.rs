//! File resolver module for discovering video files
//!
//! This module lists directories and decides which of their entries are video
//! files worth matching and which subdirectories are worth descending into.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions recognized as video files (compared case-insensitively)
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "m4v", "mov", "ts", "m2ts", "wmv", "mpg", "mpeg", "webm",
];

/// Directory names that never contain library content
const IGNORED_DIRECTORIES: &[&str] = &["@eadir", "lost+found", "$recycle.bin"];

/// Errors that can occur during file resolution
#[derive(Debug, Error)]
pub enum FileResolverError {
    /// Path is not a directory
    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Failed to read directory
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read directory entry
    #[error("Failed to read directory entry: {0}")]
    ReadEntryFailed(#[from] io::Error),
}

/// Files and subdirectories found directly inside a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub files: Vec<PathBuf>,
    pub subdirs: Vec<PathBuf>,
}

/// Lists a single directory level, sorted by path
///
/// Symlinked directories are reported as files by `DirEntry::file_type`, so
/// recursion over these listings cannot loop.
pub fn list_directory(dir_path: &Path) -> Result<DirectoryListing, FileResolverError> {
    if !dir_path.is_dir() {
        return Err(FileResolverError::NotADirectory(dir_path.to_path_buf()));
    }

    let mut listing = DirectoryListing::default();

    for entry in fs::read_dir(dir_path).map_err(|e| FileResolverError::ReadDirectoryFailed {
        path: dir_path.to_path_buf(),
        source: e,
    })? {
        let entry = entry?;
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            listing.subdirs.push(entry.path());
        } else {
            listing.files.push(entry.path());
        }
    }

    listing.files.sort();
    listing.subdirs.sort();
    Ok(listing)
}

/// Filters a directory level down to what should be scanned
pub trait VideoDiscovery {
    /// Removes non-video files and irrelevant subdirectories in place
    fn discover(&self, files: &mut Vec<PathBuf>, subdirs: &mut Vec<PathBuf>);
}

/// Discovery based on file extensions
#[derive(Debug, Clone)]
pub struct ExtensionDiscovery {
    extensions: Vec<String>,
}

impl Default for ExtensionDiscovery {
    fn default() -> Self {
        Self::new(VIDEO_EXTENSIONS)
    }
}

impl ExtensionDiscovery {
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Returns true if the path has a recognized video extension and is not hidden
    pub fn is_video_file(&self, path: &Path) -> bool {
        if is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl VideoDiscovery for ExtensionDiscovery {
    fn discover(&self, files: &mut Vec<PathBuf>, subdirs: &mut Vec<PathBuf>) {
        files.retain(|file| self.is_video_file(file));
        subdirs.retain(|dir| {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            !is_hidden(dir) && !IGNORED_DIRECTORIES.contains(&name.as_str())
        });
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_list_nonexistent_directory() {
        let result = list_directory(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(matches!(result, Err(FileResolverError::NotADirectory(_))));
    }

    #[test]
    fn test_list_file_instead_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test_file.txt");
        File::create(&file).unwrap();

        assert!(list_directory(&file).is_err());
    }

    #[test]
    fn test_list_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("02.Race.Session.mp4")).unwrap();
        File::create(dir.path().join("01.Race.Build-up.mp4")).unwrap();
        fs::create_dir(dir.path().join("Extras")).unwrap();

        let listing = list_directory(dir.path()).unwrap();
        assert_eq!(
            listing.files,
            vec![
                dir.path().join("01.Race.Build-up.mp4"),
                dir.path().join("02.Race.Session.mp4"),
            ]
        );
        assert_eq!(listing.subdirs, vec![dir.path().join("Extras")]);
    }

    #[test]
    fn test_is_video_file() {
        let discovery = ExtensionDiscovery::default();
        assert!(discovery.is_video_file(Path::new("/f1/02.Race.Session.mp4")));
        assert!(discovery.is_video_file(Path::new("/f1/Race.MKV")));
        assert!(!discovery.is_video_file(Path::new("/f1/poster.jpg")));
        assert!(!discovery.is_video_file(Path::new("/f1/.02.Race.Session.mp4")));
        assert!(!discovery.is_video_file(Path::new("/f1/README")));
    }

    #[test]
    fn test_discover_filters_in_place() {
        let discovery = ExtensionDiscovery::new(&["mp4"]);
        let mut files = vec![
            PathBuf::from("/f1/a.mp4"),
            PathBuf::from("/f1/a.mkv"),
            PathBuf::from("/f1/a.nfo"),
        ];
        let mut subdirs = vec![
            PathBuf::from("/f1/Round 1"),
            PathBuf::from("/f1/@eaDir"),
            PathBuf::from("/f1/.thumbnails"),
        ];

        discovery.discover(&mut files, &mut subdirs);

        assert_eq!(files, vec![PathBuf::from("/f1/a.mp4")]);
        assert_eq!(subdirs, vec![PathBuf::from("/f1/Round 1")]);
    }
}
