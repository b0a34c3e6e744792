//! MPEG audio constants and lookup tables.

/// Frame header size in bytes
pub const HEADER_LEN: usize = 4;

/// Frame sync pattern (11 bits, all set)
pub const FRAME_SYNC: u16 = 0x7FF;

/// The absolute theoretical maximum frame size in bytes:
/// MPEG 2.5 Layer II, 8000 Hz @ 160 kbps, with a padding slot.
pub const MAX_FRAME_LEN: u32 = 2881;

/// Bytes at the end of a stream inside which a frame may go unconfirmed
/// (the size of an ID3v1 tag).
pub const TAIL_TOLERANCE: u64 = 128;

/// How far past a free-format header to search for the confirming header.
pub const FREE_FORMAT_WINDOW: u64 = 2 * MAX_FRAME_LEN as u64;

/// Rewind step of the backward end-of-stream scan.
pub const END_SCAN_REWIND: u64 = 4000;

/// Bitrate lookup for MPEG-1, in kbps, indexed by [layer][bitrate_index].
/// Index 0 means free format, index 15 is reserved (rejected before lookup).
pub const BITRATE_KBPS_MPEG1: [[u16; 15]; 3] = [
    // Layer I
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    // Layer II
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    // Layer III
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];

/// Bitrate lookup for MPEG-2 and MPEG-2.5, in kbps, indexed by
/// [layer][bitrate_index]. Layers II and III share a table.
pub const BITRATE_KBPS_MPEG2: [[u16; 15]; 3] = [
    // Layer I
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    // Layer II
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
    // Layer III
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

/// Sample rate lookup in Hz, indexed by [version][sample_rate_index].
/// Index 3 is reserved (rejected before lookup).
pub const SAMPLE_RATE_HZ: [[u32; 3]; 3] = [
    [44100, 48000, 32000], // MPEG-1
    [22050, 24000, 16000], // MPEG-2
    [11025, 12000, 8000],  // MPEG-2.5
];

/// Samples per frame, indexed by [version][layer]. Constant per pair.
pub const SAMPLES_PER_FRAME: [[u32; 3]; 3] = [
    [384, 1152, 1152], // MPEG-1
    [384, 1152, 576],  // MPEG-2
    [384, 1152, 576],  // MPEG-2.5
];

/// Slot size in bytes, indexed by layer. Layer I frames are sized and
/// padded in 4-byte slots, Layers II/III in single bytes.
pub const SLOT_SIZE: [u32; 3] = [4, 1, 1];

/// Slot coefficient of the frame-length formula, indexed by [version][layer]:
/// `frame_len = (coeff * bitrate / sample_rate + padding) * slot_size`
pub const SLOT_COEFF: [[u32; 3]; 3] = [
    [12, 144, 144], // MPEG-1
    [12, 144, 72],  // MPEG-2
    [12, 144, 72],  // MPEG-2.5
];

/// Xing VBR header signature
pub const XING_SIG: [u8; 4] = *b"Xing";

/// "Info" variant of the Xing signature, written by CBR encoders
pub const INFO_SIG: [u8; 4] = *b"Info";

/// VBRI (Fraunhofer) header signature
pub const VBRI_SIG: [u8; 4] = *b"VBRI";

/// Offset of the VBRI signature from the start of the first frame.
/// Unlike Xing, VBRI sits at a constant offset regardless of side info.
pub const VBRI_OFFSET: usize = HEADER_LEN + 32;

/// Number of entries in a Xing seek table
pub const XING_TOC_LEN: usize = 100;

// Xing flag bits, gating the optional fields in order
pub const XING_HAS_FRAME_COUNT: u32 = 0x1;
pub const XING_HAS_BYTE_COUNT: u32 = 0x2;
pub const XING_HAS_TOC: u32 = 0x4;
pub const XING_HAS_QUALITY: u32 = 0x8;
