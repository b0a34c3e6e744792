use core::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use thiserror::Error;

use crate::mpeg::error::MpegError;

/// Result type for mpeg_audio_meta operations
pub type MpegMetaResult<T> = Result<T, MpegMetaError>;

/// Crate-level error type.
///
/// Transport failures (`Io`) are kept distinct from format conclusions
/// (`NotMpegAudio`, `TruncatedStream`) so callers can tell "this is not
/// audio" from "the storage failed". Corruption encountered mid-scan is
/// never surfaced here; the scanners recover by resynchronizing and the
/// partial result shows up in the returned values instead.
#[derive(Debug, Error)]
pub enum MpegMetaError {
    /// File I/O errors (file not found, permission denied, read failures)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No confirmed MPEG frame within the initial search window
    #[error("not MPEG audio at {position}: {details}")]
    NotMpegAudio {
        details: String,
        position: ErrorPosition,
    },

    /// End of stream reached mid-header during initial synchronization
    #[error("truncated stream at {position}: {details}")]
    TruncatedStream {
        details: String,
        position: ErrorPosition,
    },

    /// Frame header decoding errors
    #[error("MPEG header error: {0}")]
    Header(#[from] MpegError),
}

/// Position information for errors that occur during parsing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorPosition {
    /// Byte offset in the stream where the error occurred
    pub offset: u64,
    /// Human-readable description of the position
    pub description: String,
}

impl ErrorPosition {
    /// Create a new error position at the given byte offset
    pub fn new(offset: u64) -> Self {
        Self {
            offset,
            description: format!("byte offset {}", offset),
        }
    }

    /// Set a custom description for the error position
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Display for ErrorPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.description)
    }
}

impl MpegMetaError {
    /// Create a NotMpegAudio error with position information
    pub fn not_mpeg_audio(details: impl Into<String>, position: ErrorPosition) -> Self {
        MpegMetaError::NotMpegAudio {
            details: details.into(),
            position,
        }
    }

    /// Create a TruncatedStream error with position information
    pub fn truncated_stream(details: impl Into<String>, position: ErrorPosition) -> Self {
        MpegMetaError::TruncatedStream {
            details: details.into(),
            position,
        }
    }
}
