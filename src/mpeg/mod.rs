//! MPEG-1 Audio (Layers I/II/III) metadata implementation.
//!
//! This module reads structural metadata from MPEG audio elementary streams
//! without decoding any audio:
//!
//! - Frame header decoding against the standard lookup tables
//! - Byte-level frame synchronization with two-header confirmation
//! - Xing/Info and VBRI side-header parsing (declared counts, seek tables)
//! - A lazy, memoizing metadata engine that scans only as deep as a query
//!   requires (beginning, end, or every frame)
//!
//! # Architecture
//!
//! The module is organized leaf-first:
//!
//! - `constants`: bitrate/sample-rate/frame-size lookup tables
//! - `header`: pure, table-driven frame header decoding
//! - `sync`: frame synchronization, resynchronization and full-scan accumulation
//! - `vbr`: Xing and VBRI side-header parsing
//! - `mpeg_file`: the `MpegFile` aggregate tying it all together
//!
//! # Example
//!
//! ```no_run
//! use mpeg_audio_meta::MpegFile;
//!
//! let mut mpeg = MpegFile::open("audio.mp3")?;
//! if let Some(duration) = mpeg.duration(true)? {
//!     println!("{:.1} s", duration.as_secs_f64());
//! }
//! # Ok::<(), mpeg_audio_meta::error::MpegMetaError>(())
//! ```

pub mod constants;
pub mod error;
pub mod header;
pub mod sync;
pub mod vbr;

mod mpeg_file;

// Re-exports
pub use error::MpegError;
pub use header::FrameHeader;
pub use mpeg_file::{MappedMpegFile, MpegFile, ParseState};
pub use vbr::VbrInfo;

use core::fmt::{Display, Formatter, Result as FmtResult};

/// MPEG audio version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// MPEG-1 (ISO/IEC 11172-3)
    Mpeg1,
    /// MPEG-2 (ISO/IEC 13818-3)
    Mpeg2,
    /// MPEG-2.5 (unofficial low-sample-rate extension)
    Mpeg25,
}

impl Version {
    /// Parse the two version bits of a frame header.
    /// Code 0b01 is reserved.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0b00 => Some(Version::Mpeg25),
            0b10 => Some(Version::Mpeg2),
            0b11 => Some(Version::Mpeg1),
            _ => None,
        }
    }

    /// Row index into the version-keyed lookup tables
    pub(crate) const fn table_index(self) -> usize {
        match self {
            Version::Mpeg1 => 0,
            Version::Mpeg2 => 1,
            Version::Mpeg25 => 2,
        }
    }

    /// Short symbolic name
    pub const fn as_str(self) -> &'static str {
        match self {
            Version::Mpeg1 => "MPEG-1",
            Version::Mpeg2 => "MPEG-2",
            Version::Mpeg25 => "MPEG-2.5",
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// MPEG audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    I,
    II,
    III,
}

impl Layer {
    /// Parse the two layer bits of a frame header.
    /// Code 0b00 is reserved.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0b01 => Some(Layer::III),
            0b10 => Some(Layer::II),
            0b11 => Some(Layer::I),
            _ => None,
        }
    }

    /// Column index into the layer-keyed lookup tables
    pub(crate) const fn table_index(self) -> usize {
        match self {
            Layer::I => 0,
            Layer::II => 1,
            Layer::III => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Layer::I => "Layer I",
            Layer::II => "Layer II",
            Layer::III => "Layer III",
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Channel mode of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

impl ChannelMode {
    /// Parse the two channel-mode bits of a frame header. Total.
    pub const fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        }
    }

    /// Number of audio channels carried by this mode
    pub const fn channels(self) -> u16 {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ChannelMode::Stereo => "stereo",
            ChannelMode::JointStereo => "joint stereo",
            ChannelMode::DualChannel => "dual channel",
            ChannelMode::Mono => "mono",
        }
    }
}

impl Display for ChannelMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// De-emphasis applied to the audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    None,
    FiftyFifteen,
    Reserved,
    CcittJ17,
}

impl Emphasis {
    /// Parse the two emphasis bits of a frame header. Total; the reserved
    /// code is carried through rather than rejected.
    pub const fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Emphasis::None,
            0b01 => Emphasis::FiftyFifteen,
            0b10 => Emphasis::Reserved,
            _ => Emphasis::CcittJ17,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Emphasis::None => "none",
            Emphasis::FiftyFifteen => "50/15 ms",
            Emphasis::Reserved => "reserved",
            Emphasis::CcittJ17 => "CCITT J.17",
        }
    }
}

impl Display for Emphasis {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Per-frame bitrate declared by a frame header.
///
/// A bitrate index of zero marks the free-format encoding: a constant but
/// non-standard bitrate whose frame size cannot be derived from the header
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitrate {
    /// Standard bitrate in kilobits per second
    Kbps(u32),
    /// Free-format stream; frame size must be discovered by scanning
    FreeFormat,
}

impl Bitrate {
    /// The bitrate in kbps, or `None` for free format
    pub const fn kbps(self) -> Option<u32> {
        match self {
            Bitrate::Kbps(k) => Some(k),
            Bitrate::FreeFormat => None,
        }
    }

    /// True if this is the free-format sentinel
    pub const fn is_free_format(self) -> bool {
        matches!(self, Bitrate::FreeFormat)
    }
}

impl Display for Bitrate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Bitrate::Kbps(k) => write!(f, "{} kbps", k),
            Bitrate::FreeFormat => write!(f, "free format"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Synthetic stream builders shared by the unit tests.

    use super::constants::{
        INFO_SIG, VBRI_OFFSET, XING_HAS_BYTE_COUNT, XING_HAS_FRAME_COUNT, XING_HAS_QUALITY,
        XING_HAS_TOC, XING_SIG,
    };

    /// Assemble a 4-byte MPEG-1 Layer III header with the given field codes.
    pub fn header_word(bitrate_index: u8, sample_rate_index: u8, padding: bool, mode: u8) -> u32 {
        let mut w: u32 = 0xFFE0_0000; // 11 sync bits
        w |= 0b11 << 19; // MPEG-1
        w |= 0b01 << 17; // Layer III
        w |= 1 << 16; // no CRC
        w |= (bitrate_index as u32) << 12;
        w |= (sample_rate_index as u32) << 10;
        w |= (padding as u32) << 9;
        w |= (mode as u32) << 6;
        w
    }

    /// One MPEG-1 Layer III frame (header + zeroed payload) at the frame
    /// size dictated by the header fields.
    pub fn make_frame(bitrate_kbps: u32, sample_rate: u32, padding: bool) -> Vec<u8> {
        let bitrate_index = match bitrate_kbps {
            32 => 1,
            40 => 2,
            48 => 3,
            56 => 4,
            64 => 5,
            80 => 6,
            96 => 7,
            112 => 8,
            128 => 9,
            160 => 10,
            192 => 11,
            224 => 12,
            256 => 13,
            320 => 14,
            other => panic!("no MPEG-1 Layer III bitrate index for {} kbps", other),
        };
        let sample_rate_index = match sample_rate {
            44100 => 0,
            48000 => 1,
            32000 => 2,
            other => panic!("no MPEG-1 sample rate index for {} Hz", other),
        };
        let len = (144 * bitrate_kbps * 1000 / sample_rate + padding as u32) as usize;
        let mut frame = vec![0u8; len];
        frame[..4].copy_from_slice(
            &header_word(bitrate_index, sample_rate_index, padding, 0b00).to_be_bytes(),
        );
        frame
    }

    /// A CBR stream of `frames` frames with the padding cadence a real
    /// encoder would produce (accumulating the fractional slot remainder).
    pub fn make_cbr_stream(frames: usize, bitrate_kbps: u32, sample_rate: u32) -> Vec<u8> {
        let mut out = Vec::new();
        let mut rem_acc = 0u32;
        let rem = (144 * bitrate_kbps * 1000) % sample_rate;
        for _ in 0..frames {
            rem_acc += rem;
            let padding = rem_acc >= sample_rate;
            if padding {
                rem_acc -= sample_rate;
            }
            out.extend_from_slice(&make_frame(bitrate_kbps, sample_rate, padding));
        }
        out
    }

    /// Splice a Xing header (all four optional fields) into the payload of
    /// the stream's first frame. `side_info_len` must match the first
    /// header's version/channel mode.
    pub fn splice_xing(
        stream: &mut [u8],
        side_info_len: usize,
        frame_count: u32,
        byte_count: u32,
        info_tag: bool,
    ) {
        let off = 4 + side_info_len;
        let sig = if info_tag { INFO_SIG } else { XING_SIG };
        stream[off..off + 4].copy_from_slice(&sig);
        let flags =
            XING_HAS_FRAME_COUNT | XING_HAS_BYTE_COUNT | XING_HAS_TOC | XING_HAS_QUALITY;
        stream[off + 4..off + 8].copy_from_slice(&flags.to_be_bytes());
        stream[off + 8..off + 12].copy_from_slice(&frame_count.to_be_bytes());
        stream[off + 12..off + 16].copy_from_slice(&byte_count.to_be_bytes());
        for (i, slot) in stream[off + 16..off + 116].iter_mut().enumerate() {
            *slot = ((i * 256) / 100) as u8;
        }
        stream[off + 116..off + 120].copy_from_slice(&57u32.to_be_bytes());
    }

    /// Splice a VBRI header into the payload of the stream's first frame.
    pub fn splice_vbri(stream: &mut [u8], frame_count: u32, byte_count: u32) {
        let off = VBRI_OFFSET;
        stream[off..off + 4].copy_from_slice(b"VBRI");
        stream[off + 4..off + 6].copy_from_slice(&1u16.to_be_bytes()); // version
        stream[off + 6..off + 8].copy_from_slice(&0u16.to_be_bytes()); // delay
        stream[off + 8..off + 10].copy_from_slice(&80u16.to_be_bytes()); // quality
        stream[off + 10..off + 14].copy_from_slice(&byte_count.to_be_bytes());
        stream[off + 14..off + 18].copy_from_slice(&frame_count.to_be_bytes());
        stream[off + 18..off + 20].copy_from_slice(&2u16.to_be_bytes()); // TOC entries
        stream[off + 20..off + 22].copy_from_slice(&1u16.to_be_bytes()); // scale
        stream[off + 22..off + 24].copy_from_slice(&2u16.to_be_bytes()); // entry size
        stream[off + 24..off + 26].copy_from_slice(&100u16.to_be_bytes()); // frames/entry
        let half = (byte_count / 2) as u16;
        stream[off + 26..off + 28].copy_from_slice(&half.to_be_bytes());
        stream[off + 28..off + 30].copy_from_slice(&half.to_be_bytes());
    }
}
