// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms
#![allow(clippy::collapsible_if)] // Sometimes clearer to have separate conditions

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`
#![warn(clippy::panic)] // Avoids using `panic!` in production code

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions

//! Lazy MPEG-1 Audio metadata extraction.
//!
//! Answers "how long is this audio" and "how was it encoded" for MPEG
//! audio elementary streams (Layers I/II/III) without decoding a single
//! sample, scanning only as deep as each query requires. Xing/Info and
//! VBRI side headers are used when present so VBR durations usually cost
//! no more than reading the first frame.

pub mod cursor;
pub mod error;
pub mod mpeg;
pub mod traits;
pub mod types;

use std::io::{Read, Seek};
use std::path::Path;

pub use crate::{
    error::{MpegMetaError, MpegMetaResult},
    mpeg::{
        Bitrate, ChannelMode, Emphasis, FrameHeader, Layer, MappedMpegFile, MpegError, MpegFile,
        ParseState, VbrInfo, Version,
    },
    traits::AudioFileMetadata,
    types::{BaseAudioInfo, OpenOptions, StreamSource},
};

/// Convenience trait for types that implement both Read and Seek
pub trait ReadSeek: Read + Seek {}

impl<RS: Read + Seek> ReadSeek for RS where RS: Read + Seek {}

// Public API

/// Open an MPEG audio file for metadata queries.
///
/// Synchronizes on the first frame and reads any VBR side header; deeper
/// scanning happens lazily as getters demand it.
pub fn open<P: AsRef<Path>>(fp: P) -> MpegMetaResult<MappedMpegFile<'static>> {
    MappedMpegFile::open(fp)
}

/// Get stream-level audio information from a file.
///
/// Scans as deep as needed for complete answers; on a CBR or VBR-tagged
/// file this stays O(1) in the stream length.
pub fn info<P: AsRef<Path>>(fp: P) -> MpegMetaResult<BaseAudioInfo> {
    let mut mpeg = MappedMpegFile::open(fp)?;
    mpeg.base_info()
}
