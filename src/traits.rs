use std::{path::Path, time::Duration};

use crate::{error::MpegMetaResult, types::BaseAudioInfo};

/// Metadata facade over an opened audio stream.
///
/// ## Why `&mut self` getters?
///
/// Answers are produced lazily: the first query that needs a deeper scan
/// performs it once and memoizes the result, so getters mutate the parse
/// state behind the handle. One handle owns one stream; share across
/// threads only behind external synchronization.
pub trait AudioFileMetadata {
    /// Open a file for metadata operations only
    fn open_metadata<P: AsRef<Path>>(path: P) -> MpegMetaResult<Self>
    where
        Self: Sized;

    /// Get stream-level audio information, scanning as deep as needed
    fn base_info(&mut self) -> MpegMetaResult<BaseAudioInfo>;

    /// Get the duration of the audio, when determinable
    fn duration(&mut self) -> MpegMetaResult<Option<Duration>>;

    /// Get the total number of samples per channel, when determinable
    fn sample_count(&mut self) -> MpegMetaResult<Option<u64>>;

    /// Get the file path
    fn file_path(&self) -> &Path;

    /// Get the total stream length in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
