//! Audio sources and scoped access to user-selected files.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::AudioError;

/// Bundled asset played when no file is chosen
pub const DEFAULT_ASSET: &str = "example.mp3";

/// Default directory bundled assets are resolved against
pub const DEFAULT_ASSET_DIR: &str = "assets";

/// Where the audio comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Asset shipped with the application, by file name
    Bundled(String),

    /// User-selected file outside the application's own assets
    External(PathBuf),
}

impl Default for AudioSource {
    fn default() -> Self {
        Self::Bundled(DEFAULT_ASSET.to_string())
    }
}

impl AudioSource {
    /// Short name for log messages
    pub fn display_name(&self) -> String {
        match self {
            AudioSource::Bundled(name) => name.clone(),
            AudioSource::External(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Temporary read grant on an external file.
///
/// Acquired before any read of the file and released when dropped.
#[derive(Debug)]
pub struct ScopedAccess<'a> {
    path: &'a Path,
}

impl<'a> ScopedAccess<'a> {
    /// Check the file exists and is readable by this process
    pub fn acquire(path: &'a Path) -> Result<Self, AudioError> {
        let metadata = std::fs::metadata(path).map_err(|e| AudioError::from_io(&e, path))?;
        if !metadata.is_file() {
            return Err(AudioError::NotFound(path.to_path_buf()));
        }
        // Opening is the real permission check
        File::open(path).map_err(|e| AudioError::from_io(&e, path))?;

        debug!("Acquired access to {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        self.path
    }
}

impl Drop for ScopedAccess<'_> {
    fn drop(&mut self) {
        debug!("Released access to {}", self.path.display());
    }
}
