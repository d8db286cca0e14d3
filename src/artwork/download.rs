//! Image download
//!
//! Images are streamed into a temporary file beside the target and renamed
//! into place once complete.

use super::{ArtworkError, ImageDownloader};
use crate::temp::create_temp_file_in;
use std::io::Write;
use std::path::Path;

/// Downloads images over HTTP using a blocking client
pub struct HttpImageDownloader {
    client: reqwest::blocking::Client,
}

impl HttpImageDownloader {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl ImageDownloader for HttpImageDownloader {
    fn download(&self, url: &str, target: &Path) -> Result<u64, ArtworkError> {
        let download_failed = |reason: String| ArtworkError::DownloadFailed {
            url: url.to_string(),
            reason,
        };
        let write_failed = |source: std::io::Error| ArtworkError::WriteFailed {
            path: target.to_path_buf(),
            source,
        };

        tracing::debug!(%url, path = %target.display(), "Downloading image");

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| download_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_failed(format!("HTTP {}", response.status())));
        }

        let directory = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (guard, mut file) =
            create_temp_file_in(directory, ".artwork", "part").map_err(write_failed)?;

        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| download_failed(e.to_string()))?;
        file.flush().map_err(write_failed)?;
        drop(file);

        guard.persist(target).map_err(write_failed)?;
        make_shared(target);

        tracing::info!(
            path = %target.display(),
            size = %humansize::format_size(bytes, humansize::DECIMAL),
            "Artwork saved"
        );

        Ok(bytes)
    }
}

/// Lets the media server account read and replace the artwork
#[cfg(unix)]
fn make_shared(path: &Path) {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o666)) {
        tracing::warn!(path = %path.display(), "Unable to set artwork permissions: {}", e);
    }
}

#[cfg(not(unix))]
fn make_shared(_path: &Path) {}
