//! Temporary file management module
//!
//! This module provides RAII-based temporary file handling. Artwork is
//! downloaded into a temporary file next to its final location and only moved
//! into place once the transfer is complete, so an interrupted download never
//! leaves a truncated image behind.

use std::fs::{self, File};
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Guard for a temporary file that is deleted on drop unless persisted
#[derive(Debug)]
pub(crate) struct TempGuard {
    path: PathBuf,
    persisted: bool,
}

impl TempGuard {
    /// Get the path to the temporary file
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the temporary file to its final destination
    ///
    /// After a successful rename the guard no longer owns the file and will
    /// not remove anything when dropped.
    pub(crate) fn persist(mut self, destination: &Path) -> io::Result<()> {
        fs::rename(&self.path, destination)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if !self.persisted {
            // Silently ignore errors during cleanup
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl Deref for TempGuard {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path()
    }
}

/// Creates a temporary file inside `directory` and returns a guard for it
///
/// The name is built from the prefix and a ULID, so concurrent downloads into
/// the same directory never collide. Creating the file in the target
/// directory keeps the final rename on the same filesystem.
///
/// # Returns
///
/// The guard together with the opened file handle.
///
/// # Examples
///
/// ```ignore
/// let (guard, mut file) = create_temp_file_in(Path::new("/media/f1"), ".poster", "part")?;
/// file.write_all(&bytes)?;
/// guard.persist(Path::new("/media/f1/poster.jpg"))?;
/// ```
pub(crate) fn create_temp_file_in(
    directory: &Path,
    prefix: &str,
    extension: &str,
) -> io::Result<(TempGuard, File)> {
    let ulid = ulid::Ulid::new();
    let filename = format!("{}_{}.{}", prefix, ulid, extension);
    let path = directory.join(filename);

    let file = File::create(&path)?;

    Ok((
        TempGuard {
            path,
            persisted: false,
        },
        file,
    ))
}
