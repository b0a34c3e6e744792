use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::borrow::Cow;
use std::fs::File;
use std::io;
use std::ops::Deref;
use std::time::Duration;

#[cfg(feature = "colored")]
use colored::{ColoredString, Colorize};
use memmap2::Mmap;

use crate::mpeg::{Bitrate, ChannelMode, Layer, Version};

/// Unified view over stream byte storage
#[non_exhaustive]
pub enum StreamSource<'a> {
    /// Owned heap-allocated byte buffer
    Owned(Vec<u8>),

    /// Memory-mapped file (zero-copy, OS-backed)
    MemoryMapped(Mmap),

    /// Borrowed byte slice
    Borrowed(&'a [u8]),
}

impl<'a> StreamSource<'a> {
    /// Returns the stream data as a contiguous byte slice
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            StreamSource::Owned(data) => data.as_slice(),
            StreamSource::MemoryMapped(mmap) => mmap.as_ref(),
            StreamSource::Borrowed(slice) => slice,
        }
    }

    /// Returns the length of the stream in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if the stream is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forces this source into an owned buffer
    pub fn into_owned(self) -> Vec<u8> {
        match self {
            StreamSource::Owned(data) => data,
            StreamSource::Borrowed(slice) => slice.to_vec(),
            StreamSource::MemoryMapped(mmap) => mmap.as_ref().to_vec(),
        }
    }

    /// Create a memory-mapped source from a file
    pub fn from_file(file: &File) -> io::Result<Self> {
        let mmap = unsafe { Mmap::map(file)? };
        Ok(StreamSource::MemoryMapped(mmap))
    }
}

impl<'a> Deref for StreamSource<'a> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl<'a> AsRef<[u8]> for StreamSource<'a> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<'a> From<Vec<u8>> for StreamSource<'a> {
    fn from(value: Vec<u8>) -> Self {
        StreamSource::Owned(value)
    }
}

impl<'a> From<&'a [u8]> for StreamSource<'a> {
    fn from(value: &'a [u8]) -> Self {
        StreamSource::Borrowed(value)
    }
}

impl<'a> From<Mmap> for StreamSource<'a> {
    fn from(value: Mmap) -> Self {
        StreamSource::MemoryMapped(value)
    }
}

impl<'a> From<Cow<'a, [u8]>> for StreamSource<'a> {
    fn from(value: Cow<'a, [u8]>) -> Self {
        match value {
            Cow::Borrowed(slice) => StreamSource::Borrowed(slice),
            Cow::Owned(vec) => StreamSource::Owned(vec),
        }
    }
}

impl<'a> Debug for StreamSource<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StreamSource::Owned(data) => f
                .debug_struct("StreamSource::Owned")
                .field("len", &data.len())
                .finish(),
            StreamSource::MemoryMapped(mmap) => f
                .debug_struct("StreamSource::MemoryMapped")
                .field("len", &mmap.len())
                .finish(),
            StreamSource::Borrowed(slice) => f
                .debug_struct("StreamSource::Borrowed")
                .field("len", &slice.len())
                .finish(),
        }
    }
}

#[allow(dead_code)]
const fn _assert_send_sync()
where
    StreamSource<'static>: Send + Sync,
{
}

/// Options controlling how a stream is opened and scanned
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    /// Memory-map files instead of reading them into an owned buffer
    pub use_memory_map: bool,
    /// Start the initial frame search here. Useful when the size of a
    /// leading tag region is already known; ID3v2 tags at the start are
    /// skipped automatically either way.
    pub start_offset: u64,
    /// Bytes at the end of the stream known to be non-audio (e.g. 128 for
    /// an ID3v1 tag). The end-of-stream scan starts before this region.
    pub end_offset: u64,
    /// Bounded lookahead of the initial synchronization, in bytes.
    /// Construction fails when no confirmed frame starts in this window.
    pub sync_window: u64,
    /// Use declared Xing/VBRI frame and byte counts for fast-path answers.
    /// When false, exact queries fall back to scanning.
    pub trust_vbr_headers: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            use_memory_map: true,
            start_offset: 0,
            end_offset: 0,
            sync_window: 64 * 1024,
            trust_vbr_headers: true,
        }
    }
}

/// Stream-level audio information assembled from the parsed metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseAudioInfo {
    /// MPEG version
    pub version: Version,
    /// Compression layer
    pub layer: Layer,
    /// Channel mode of the first frame
    pub channel_mode: ChannelMode,
    /// Number of audio channels
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Nominal bitrate of the first frame
    pub bitrate: Bitrate,
    /// Average bitrate in kbps, when determinable
    pub average_bitrate_kbps: Option<f64>,
    /// Total duration, when determinable
    pub duration: Option<Duration>,
    /// Total frame count, when determinable
    pub frame_count: Option<u64>,
    /// Total sample count per channel, when determinable
    pub sample_count: Option<u64>,
    /// Whether a VBR side header is present
    pub is_vbr: bool,
}

impl Display for BaseAudioInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        //
        // -------- COMPACT MODE --------
        //
        if !f.alternate() {
            write!(
                f,
                "{} {} | {} Hz, {} ch, {}",
                self.version, self.layer, self.sample_rate, self.channels, self.bitrate
            )?;
            if let Some(duration) = self.duration {
                write!(f, ", {:.2} s", duration.as_secs_f64())?;
            }
            return Ok(());
        }

        //
        // -------- PRETTY MODE --------
        //
        let duration = self
            .duration
            .map(|d| format!("{:.2} s", d.as_secs_f64()))
            .unwrap_or_else(|| "unknown".to_string());
        let frame_count = self
            .frame_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let average = self
            .average_bitrate_kbps
            .map(|b| format!("{:.1} kbps", b))
            .unwrap_or_else(|| "unknown".to_string());

        // ============ COLOURED VERSION ============
        #[cfg(feature = "colored")]
        {
            fn label(s: &str) -> ColoredString {
                s.bold().bright_blue()
            }

            fn value<T: ToString>(v: T) -> ColoredString {
                v.to_string().bright_green()
            }

            writeln!(f, "{}", "MPEG Audio Info".bold().underline())?;
            writeln!(f, "├─ {}: {} {}", label("Format"), value(self.version), value(self.layer))?;
            writeln!(
                f,
                "├─ {}: {}",
                label("Sample Rate"),
                value(format!("{} Hz", self.sample_rate))
            )?;
            writeln!(
                f,
                "├─ {}: {}",
                label("Channels"),
                value(format!("{} ({})", self.channels, self.channel_mode))
            )?;
            writeln!(f, "├─ {}: {}", label("Bitrate"), value(self.bitrate))?;
            writeln!(f, "├─ {}: {}", label("Average Bitrate"), value(average))?;
            writeln!(f, "├─ {}: {}", label("VBR"), value(self.is_vbr))?;
            writeln!(f, "├─ {}: {}", label("Frames"), value(frame_count))?;
            writeln!(f, "└─ {}: {}", label("Duration"), value(duration))
        }

        // ============ NON-COLOURED VERSION ============
        #[cfg(not(feature = "colored"))]
        {
            writeln!(f, "MPEG Audio Info:")?;
            writeln!(f, "├─ Format: {} {}", self.version, self.layer)?;
            writeln!(f, "├─ Sample Rate: {} Hz", self.sample_rate)?;
            writeln!(f, "├─ Channels: {} ({})", self.channels, self.channel_mode)?;
            writeln!(f, "├─ Bitrate: {}", self.bitrate)?;
            writeln!(f, "├─ Average Bitrate: {}", average)?;
            writeln!(f, "├─ VBR: {}", self.is_vbr)?;
            writeln!(f, "├─ Frames: {}", frame_count)?;
            writeln!(f, "└─ Duration: {}", duration)
        }
    }
}
