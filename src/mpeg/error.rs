//! MPEG-specific error types.

use thiserror::Error;

/// Frame header rejection reasons.
///
/// Any candidate using a reserved enumeration value is rejected with the
/// field that caused it, never silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MpegError {
    #[error("frame sync bits do not match: expected 0x7FF, found 0x{found:03X}")]
    BadSync { found: u16 },

    #[error("reserved MPEG version code")]
    ReservedVersion,

    #[error("reserved layer code")]
    ReservedLayer,

    #[error("reserved bitrate index")]
    ReservedBitrate,

    #[error("reserved sample rate index")]
    ReservedSampleRate,
}

impl MpegError {
    /// Create a sync-mismatch error from the sync bits found
    pub const fn bad_sync(found: u16) -> Self {
        MpegError::BadSync { found }
    }
}
