//! Error types for audio loading, configuration and recording.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while acquiring, decoding or starting playback of an audio source.
///
/// Cloneable so the driver can keep the last failure in its state while also
/// returning it to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("audio file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to decode audio: {0}")]
    DecodeFailed(String),

    #[error("access denied to audio file: {0}")]
    AccessDenied(PathBuf),

    #[error("audio session configuration failed: {0}")]
    SessionConfigFailed(String),
}

impl AudioError {
    /// Map an I/O error raised while touching `path` onto the audio taxonomy.
    pub(crate) fn from_io(err: &std::io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied(path.into()),
            _ => Self::DecodeFailed(format!("{}: {}", path.into().display(), err)),
        }
    }
}

/// Failures while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures while writing recorded frames or audio.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create output directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write frame: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to write audio: {0}")]
    Wav(#[from] hound::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_mapping() {
        let not_found = Error::new(ErrorKind::NotFound, "gone");
        assert_eq!(
            AudioError::from_io(&not_found, "a.mp3"),
            AudioError::NotFound(PathBuf::from("a.mp3"))
        );

        let denied = Error::new(ErrorKind::PermissionDenied, "nope");
        assert_eq!(
            AudioError::from_io(&denied, "b.mp3"),
            AudioError::AccessDenied(PathBuf::from("b.mp3"))
        );

        let other = Error::new(ErrorKind::InvalidData, "garbage");
        assert!(matches!(
            AudioError::from_io(&other, "c.mp3"),
            AudioError::DecodeFailed(_)
        ));
    }
}
