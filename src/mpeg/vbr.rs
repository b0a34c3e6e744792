//! Xing and VBRI side-header parsing.
//!
//! VBR encoders embed a side header in the payload of the first frame,
//! declaring the true frame and byte totals so duration can be answered
//! without walking the whole stream. Two dialects exist:
//!
//! - **Xing** (also written as `Info` by CBR-mode LAME): sits right after
//!   the Layer III side information, with flag-gated optional fields and a
//!   100-entry seek table.
//! - **VBRI** (Fraunhofer): sits at a fixed 32-byte offset after the
//!   header, with a fully specified field layout and a scaled TOC.
//!
//! Detection happens once, on the first frame only. Absence of both
//! signatures is a normal outcome, not an error.

use crate::mpeg::constants::{
    HEADER_LEN, INFO_SIG, VBRI_OFFSET, VBRI_SIG, XING_HAS_BYTE_COUNT, XING_HAS_FRAME_COUNT,
    XING_HAS_QUALITY, XING_HAS_TOC, XING_SIG, XING_TOC_LEN,
};
use crate::mpeg::header::FrameHeader;

/// A parsed VBR side header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VbrInfo {
    /// Xing/Info header
    Xing {
        /// Declared total frame count
        frame_count: Option<u32>,
        /// Declared total byte count of the audio payload
        byte_count: Option<u32>,
        /// Seek table: 100 entries mapping percentage of duration to a
        /// fraction (n/256) of the byte count
        toc: Option<Box<[u8; 100]>>,
        /// Encoder quality indicator (0-100)
        quality: Option<u32>,
        /// True when the signature read `Info` — written by CBR encodes
        from_info_tag: bool,
    },
    /// Fraunhofer VBRI header
    Vbri {
        /// VBRI version
        version: u16,
        /// Encoder delay in samples
        delay: u16,
        /// Quality indicator
        quality: u16,
        /// Declared total byte count of the audio payload
        byte_count: u32,
        /// Declared total frame count
        frame_count: u32,
        /// Seek table entries, scaled to bytes per table interval
        toc: Vec<u32>,
    },
}

impl VbrInfo {
    /// Inspect the first frame's payload for a Xing/Info or VBRI header.
    ///
    /// `frame` must start at the frame's first header byte. Returns `None`
    /// when neither signature is present or the payload is too short for
    /// the declared fields.
    pub(crate) fn parse(header: &FrameHeader, frame: &[u8]) -> Option<VbrInfo> {
        Self::parse_xing(header, frame).or_else(|| Self::parse_vbri(frame))
    }

    fn parse_xing(header: &FrameHeader, frame: &[u8]) -> Option<VbrInfo> {
        let offset = HEADER_LEN + header.side_info_len() as usize;
        let sig = frame.get(offset..offset + 4)?;
        let from_info_tag = match sig {
            _ if sig == XING_SIG => false,
            _ if sig == INFO_SIG => true,
            _ => return None,
        };

        let flags = read_u32(frame, offset + 4)?;
        let mut cur = offset + 8;

        let frame_count = if flags & XING_HAS_FRAME_COUNT != 0 {
            let v = read_u32(frame, cur)?;
            cur += 4;
            Some(v)
        } else {
            None
        };

        let byte_count = if flags & XING_HAS_BYTE_COUNT != 0 {
            let v = read_u32(frame, cur)?;
            cur += 4;
            Some(v)
        } else {
            None
        };

        let toc = if flags & XING_HAS_TOC != 0 {
            let table = frame.get(cur..cur + XING_TOC_LEN)?;
            cur += XING_TOC_LEN;
            let mut entries = [0u8; XING_TOC_LEN];
            entries.copy_from_slice(table);
            Some(Box::new(entries))
        } else {
            None
        };

        let quality = if flags & XING_HAS_QUALITY != 0 {
            Some(read_u32(frame, cur)?)
        } else {
            None
        };

        Some(VbrInfo::Xing {
            frame_count,
            byte_count,
            toc,
            quality,
            from_info_tag,
        })
    }

    fn parse_vbri(frame: &[u8]) -> Option<VbrInfo> {
        if frame.get(VBRI_OFFSET..VBRI_OFFSET + 4)? != VBRI_SIG {
            return None;
        }
        let base = VBRI_OFFSET + 4;
        let version = read_u16(frame, base)?;
        let delay = read_u16(frame, base + 2)?;
        let quality = read_u16(frame, base + 4)?;
        let byte_count = read_u32(frame, base + 6)?;
        let frame_count = read_u32(frame, base + 10)?;
        let toc_entries = read_u16(frame, base + 14)? as usize;
        let scale = read_u16(frame, base + 16)? as u32;
        let entry_size = read_u16(frame, base + 18)? as usize;
        let _frames_per_entry = read_u16(frame, base + 20)?;

        // Entries are 1, 2 or 4 bytes each, multiplied by the scale factor.
        // A table cut short by the frame boundary is kept as far as it goes.
        let mut toc = Vec::with_capacity(toc_entries);
        if (1..=4).contains(&entry_size) {
            let mut cur = base + 22;
            for _ in 0..toc_entries {
                let Some(raw) = frame.get(cur..cur + entry_size) else {
                    break;
                };
                let mut value = 0u32;
                for &b in raw {
                    value = (value << 8) | u32::from(b);
                }
                toc.push(value.saturating_mul(scale));
                cur += entry_size;
            }
        }

        Some(VbrInfo::Vbri {
            version,
            delay,
            quality,
            byte_count,
            frame_count,
            toc,
        })
    }

    /// Declared total frame count, if the header carries one.
    pub fn frame_count(&self) -> Option<u32> {
        match self {
            VbrInfo::Xing { frame_count, .. } => *frame_count,
            VbrInfo::Vbri { frame_count, .. } => Some(*frame_count),
        }
    }

    /// Declared total audio byte count, if the header carries one.
    pub fn byte_count(&self) -> Option<u32> {
        match self {
            VbrInfo::Xing { byte_count, .. } => *byte_count,
            VbrInfo::Vbri { byte_count, .. } => Some(*byte_count),
        }
    }

    /// True for a Xing header whose signature read `Info`.
    pub fn is_info_tag(&self) -> bool {
        matches!(
            self,
            VbrInfo::Xing {
                from_info_tag: true,
                ..
            }
        )
    }

    /// Estimate the byte offset (relative to the start of audio) of the
    /// given position expressed as a percentage of total duration.
    ///
    /// Constant time; requires a seek table and, for Xing, a known total
    /// byte count (pass the measured audio size when the header declares
    /// none). Returns `None` when the table is absent.
    pub fn seek_point(&self, percent: f64, total_bytes: u64) -> Option<u64> {
        let percent = percent.clamp(0.0, 100.0);
        match self {
            VbrInfo::Xing { toc: Some(toc), .. } => {
                // Interpolate between the two neighbouring table entries.
                let index = (percent.floor() as usize).min(XING_TOC_LEN - 1);
                let fraction = percent - index as f64;
                let this = f64::from(toc[index]);
                let next = if index + 1 < XING_TOC_LEN {
                    f64::from(toc[index + 1])
                } else {
                    256.0
                };
                let scaled = (this + (next - this) * fraction) / 256.0;
                Some((scaled * total_bytes as f64) as u64)
            }
            VbrInfo::Xing { toc: None, .. } => None,
            VbrInfo::Vbri { toc, .. } => {
                if toc.is_empty() {
                    return None;
                }
                // Each entry covers an equal slice of the duration; sum the
                // covered entries and interpolate into the next.
                let per_entry = 100.0 / toc.len() as f64;
                let covered = (percent / per_entry).floor() as usize;
                let covered = covered.min(toc.len());
                let mut offset: u64 = toc[..covered].iter().map(|&e| u64::from(e)).sum();
                if covered < toc.len() {
                    let fraction = percent / per_entry - covered as f64;
                    offset += (f64::from(toc[covered]) * fraction) as u64;
                }
                Some(offset)
            }
        }
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}
