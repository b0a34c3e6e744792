//! MPEG frame header decoding.
//!
//! A frame header is four bytes:
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! A: sync (11 bits)      E: bitrate index    I: channel mode
//! B: version             F: sample rate      J: mode extension
//! C: layer               G: padding          K: copyright
//! D: protection          H: private          L: original
//!                                            M: emphasis
//! ```
//!
//! Decoding is pure and table-driven; any reserved enumeration value is
//! rejected rather than defaulted.

use crate::mpeg::constants::{
    BITRATE_KBPS_MPEG1, BITRATE_KBPS_MPEG2, FRAME_SYNC, SAMPLES_PER_FRAME, SAMPLE_RATE_HZ,
    SLOT_COEFF, SLOT_SIZE,
};
use crate::mpeg::error::MpegError;
use crate::mpeg::{Bitrate, ChannelMode, Emphasis, Layer, Version};

/// A decoded MPEG audio frame header. Immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// MPEG version
    pub version: Version,
    /// Compression layer
    pub layer: Layer,
    /// Declared bitrate, or the free-format sentinel
    pub bitrate: Bitrate,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Whether the frame carries an extra padding slot
    pub padding: bool,
    /// Channel mode
    pub channel_mode: ChannelMode,
    /// Mode extension bits (meaningful for joint stereo only)
    pub mode_extension: u8,
    /// De-emphasis
    pub emphasis: Emphasis,
    /// True when a CRC-16 follows the header (protection bit clear)
    pub crc_protected: bool,
    /// Private bit
    pub private: bool,
    /// Copyright bit
    pub copyrighted: bool,
    /// Original-media bit
    pub original: bool,
}

impl FrameHeader {
    /// Decode a header from its big-endian 32-bit representation.
    ///
    /// Rejects any bit pattern using a reserved enumeration value for the
    /// version, layer, bitrate or sample rate fields.
    pub fn parse(raw: u32) -> Result<Self, MpegError> {
        let sync = ((raw >> 21) & 0x7FF) as u16;
        if sync != FRAME_SYNC {
            return Err(MpegError::bad_sync(sync));
        }

        let version_code = ((raw >> 19) & 0b11) as u8;
        let layer_code = ((raw >> 17) & 0b11) as u8;
        let protection_bit = (raw >> 16) & 1;
        let bitrate_index = ((raw >> 12) & 0xF) as usize;
        let sample_rate_index = ((raw >> 10) & 0b11) as usize;
        let padding_bit = (raw >> 9) & 1;
        let private_bit = (raw >> 8) & 1;
        let mode_code = ((raw >> 6) & 0b11) as u8;
        let mode_extension = ((raw >> 4) & 0b11) as u8;
        let copyright_bit = (raw >> 3) & 1;
        let original_bit = (raw >> 2) & 1;
        let emphasis_code = (raw & 0b11) as u8;

        let version = Version::from_code(version_code).ok_or(MpegError::ReservedVersion)?;
        let layer = Layer::from_code(layer_code).ok_or(MpegError::ReservedLayer)?;

        if bitrate_index == 15 {
            return Err(MpegError::ReservedBitrate);
        }
        let bitrate = if bitrate_index == 0 {
            Bitrate::FreeFormat
        } else {
            let table = match version {
                Version::Mpeg1 => &BITRATE_KBPS_MPEG1,
                Version::Mpeg2 | Version::Mpeg25 => &BITRATE_KBPS_MPEG2,
            };
            Bitrate::Kbps(table[layer.table_index()][bitrate_index] as u32)
        };

        if sample_rate_index == 3 {
            return Err(MpegError::ReservedSampleRate);
        }
        let sample_rate = SAMPLE_RATE_HZ[version.table_index()][sample_rate_index];

        Ok(FrameHeader {
            version,
            layer,
            bitrate,
            sample_rate,
            padding: padding_bit == 1,
            channel_mode: ChannelMode::from_code(mode_code),
            mode_extension,
            emphasis: Emphasis::from_code(emphasis_code),
            crc_protected: protection_bit == 0,
            private: private_bit == 1,
            copyrighted: copyright_bit == 1,
            original: original_bit == 1,
        })
    }

    /// Decode a header from the four bytes it occupies in the stream.
    pub fn from_bytes(bytes: [u8; 4]) -> Result<Self, MpegError> {
        Self::parse(u32::from_be_bytes(bytes))
    }

    /// Samples of audio carried by one frame. Constant per (version, layer).
    pub const fn samples_per_frame(&self) -> u32 {
        SAMPLES_PER_FRAME[self.version.table_index()][self.layer.table_index()]
    }

    /// Frame length in bytes, including the header itself.
    ///
    /// `None` for free-format frames, whose size is not derivable from the
    /// header alone.
    pub fn frame_len(&self) -> Option<u32> {
        let kbps = self.bitrate.kbps()?;
        Some(self.frame_len_for(kbps, self.padding))
    }

    /// Frame length as if the padding bit were clear.
    pub fn unpadded_frame_len(&self) -> Option<u32> {
        let kbps = self.bitrate.kbps()?;
        Some(self.frame_len_for(kbps, false))
    }

    /// Frame length as if the padding bit were set.
    pub fn padded_frame_len(&self) -> Option<u32> {
        let kbps = self.bitrate.kbps()?;
        Some(self.frame_len_for(kbps, true))
    }

    fn frame_len_for(&self, kbps: u32, padding: bool) -> u32 {
        let coeff = SLOT_COEFF[self.version.table_index()][self.layer.table_index()];
        let slot = SLOT_SIZE[self.layer.table_index()];
        (coeff * kbps * 1000 / self.sample_rate + padding as u32) * slot
    }

    /// Number of audio channels
    pub const fn channels(&self) -> u16 {
        self.channel_mode.channels()
    }

    /// Size in bytes of the Layer III side information block following the
    /// header. The Xing signature, when present, sits right after it.
    pub const fn side_info_len(&self) -> u32 {
        match (self.version, self.channel_mode) {
            (Version::Mpeg1, ChannelMode::Mono) => 17,
            (Version::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, _) => 17,
        }
    }

    /// Whether `other` could belong to the same stream: version, layer and
    /// sample rate never change between frames of one elementary stream.
    pub(crate) fn kindred(&self, other: &FrameHeader) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpeg::testutil::header_word;

    #[test]
    fn test_decode_mpeg1_layer3_128() {
        // 128 kbps (index 9), 44100 Hz (index 0), no padding, stereo
        let header = FrameHeader::parse(header_word(9, 0, false, 0b00)).expect("Parse failed");
        assert_eq!(header.version, Version::Mpeg1);
        assert_eq!(header.layer, Layer::III);
        assert_eq!(header.bitrate, Bitrate::Kbps(128));
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.samples_per_frame(), 1152);
        assert_eq!(header.channel_mode, ChannelMode::Stereo);
        // floor(1152/8 * 128000 / 44100) = 417
        assert_eq!(header.frame_len(), Some(417));

        let padded = FrameHeader::parse(header_word(9, 0, true, 0b00)).expect("Parse failed");
        assert_eq!(padded.frame_len(), Some(418));
        assert_eq!(padded.unpadded_frame_len(), Some(417));
    }

    #[test]
    fn test_decode_layer1_slot_padding() {
        // MPEG-1 Layer I, 32 kbps (index 1), 32000 Hz (index 2), padded:
        // (12 * 32000 / 32000 + 1) * 4 = 52
        let raw: u32 = 0xFFE0_0000 | (0b11 << 19) | (0b11 << 17) | (1 << 16)
            | (1 << 12)
            | (2 << 10)
            | (1 << 9);
        let header = FrameHeader::parse(raw).expect("Parse failed");
        assert_eq!(header.layer, Layer::I);
        assert_eq!(header.samples_per_frame(), 384);
        assert_eq!(header.frame_len(), Some(52));
    }

    #[test]
    fn test_decode_mpeg2_layer3() {
        // MPEG-2 Layer III, 64 kbps (index 8), 22050 Hz (index 0)
        let raw: u32 = 0xFFE0_0000 | (0b10 << 19) | (0b01 << 17) | (1 << 16)
            | (8 << 12)
            | (0 << 10);
        let header = FrameHeader::parse(raw).expect("Parse failed");
        assert_eq!(header.version, Version::Mpeg2);
        assert_eq!(header.bitrate, Bitrate::Kbps(64));
        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.samples_per_frame(), 576);
        // 72 * 64000 / 22050 = 208
        assert_eq!(header.frame_len(), Some(208));
    }

    #[test]
    fn test_free_format_sentinel() {
        let header = FrameHeader::parse(header_word(0, 0, false, 0b11)).expect("Parse failed");
        assert_eq!(header.bitrate, Bitrate::FreeFormat);
        assert!(header.bitrate.is_free_format());
        assert_eq!(header.frame_len(), None);
        assert_eq!(header.channels(), 1);
    }

    #[test]
    fn test_reserved_fields_rejected() {
        assert_eq!(
            FrameHeader::parse(0x0000_0000),
            Err(MpegError::BadSync { found: 0 })
        );
        // version code 0b01
        let reserved_version: u32 = 0xFFE0_0000 | (0b01 << 19) | (0b01 << 17) | (9 << 12);
        assert_eq!(
            FrameHeader::parse(reserved_version),
            Err(MpegError::ReservedVersion)
        );
        // layer code 0b00
        let reserved_layer: u32 = 0xFFE0_0000 | (0b11 << 19) | (9 << 12);
        assert_eq!(
            FrameHeader::parse(reserved_layer),
            Err(MpegError::ReservedLayer)
        );
        assert_eq!(
            FrameHeader::parse(header_word(15, 0, false, 0b00)),
            Err(MpegError::ReservedBitrate)
        );
        assert_eq!(
            FrameHeader::parse(header_word(9, 3, false, 0b00)),
            Err(MpegError::ReservedSampleRate)
        );
    }

    #[test]
    fn test_side_info_len() {
        let stereo = FrameHeader::parse(header_word(9, 0, false, 0b00)).expect("Parse failed");
        assert_eq!(stereo.side_info_len(), 32);
        let mono = FrameHeader::parse(header_word(9, 0, false, 0b11)).expect("Parse failed");
        assert_eq!(mono.side_info_len(), 17);
    }

    #[test]
    fn test_kindred() {
        let a = FrameHeader::parse(header_word(9, 0, false, 0b00)).expect("Parse failed");
        let b = FrameHeader::parse(header_word(5, 0, true, 0b11)).expect("Parse failed");
        assert!(a.kindred(&b), "bitrate and mode changes stay kindred");
        let c = FrameHeader::parse(header_word(9, 1, false, 0b00)).expect("Parse failed");
        assert!(!a.kindred(&c), "sample rate change is not kindred");
    }
}
