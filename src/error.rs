//! Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Main error type
#[derive(Debug, Clone, Error)]
pub enum CwavError {
    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Not a readable archive: missing central directory, truncated, bad CRC.
    #[error("Invalid .{extension} file.")]
    InvalidContainer { extension: String, reason: String },

    #[error("No .{extension} file found in the archive.")]
    NoAudioEntry { extension: String },

    #[error("Only .{source_extension} and .{container_extension} files are supported.")]
    UnsupportedFile {
        path: PathBuf,
        source_extension: String,
        container_extension: String,
    },

    /// A picker restricted to one kind of file got the other kind
    #[error("Please choose a .{expected} file.")]
    UnexpectedFile { path: PathBuf, expected: String },

    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("Playback error: {message}")]
    Playback { message: String },

    #[error("Config error: {message}")]
    Config { message: String },
}

impl CwavError {
    pub fn io<S: Into<String>>(msg: S) -> Self { Self::Io { message: msg.into() } }
    pub fn archive<S: Into<String>>(msg: S) -> Self { Self::Archive { message: msg.into() } }
    pub fn audio<S: Into<String>>(msg: S) -> Self { Self::Audio { message: msg.into() } }
    pub fn playback<S: Into<String>>(msg: S) -> Self { Self::Playback { message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { Self::Config { message: msg.into() } }

    pub fn invalid_container<E: Into<String>, R: Into<String>>(extension: E, reason: R) -> Self {
        Self::InvalidContainer { extension: extension.into(), reason: reason.into() }
    }

    pub fn no_audio_entry<E: Into<String>>(extension: E) -> Self {
        Self::NoAudioEntry { extension: extension.into() }
    }

    /// Dialog title used when the error is shown to the user
    pub fn title(&self) -> &'static str {
        match self {
            Self::UnsupportedFile { .. } | Self::UnexpectedFile { .. } => "Unsupported File",
            Self::Audio { .. } | Self::Playback { .. } => "Playback Error",
            _ => "Error",
        }
    }
}

pub type Result<T> = std::result::Result<T, CwavError>;

impl From<std::io::Error> for CwavError {
    fn from(err: std::io::Error) -> Self { Self::io(err.to_string()) }
}

impl From<zip::result::ZipError> for CwavError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::io(e.to_string()),
            other => Self::archive(other.to_string()),
        }
    }
}

impl From<hound::Error> for CwavError {
    fn from(err: hound::Error) -> Self { Self::audio(format!("WAV: {}", err)) }
}
