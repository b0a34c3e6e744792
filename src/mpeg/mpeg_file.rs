//! The `MpegFile` aggregate: lazy metadata engine and public facade.
//!
//! One `MpegFile` owns one stream. Construction synchronizes on the first
//! frame and inspects it for a VBR side header; everything else is parsed
//! on demand, exactly once per required scan depth:
//!
//! - `BeginningParsed`: first frame located and decoded, VBR header read.
//!   Reached at construction or not at all.
//! - `EndParsed`: the true end of the audio payload is known, refining
//!   size-based answers on streams with trailing tag regions.
//! - `AllFramesParsed`: every frame has been walked; counts are exact.
//!
//! Getters take an `allow_full_scan` flag. With scanning disallowed and no
//! fast path available the answer is `None` — never a blocking scan, never
//! an error.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cursor::ByteCursor;
use crate::error::{ErrorPosition, MpegMetaError, MpegMetaResult};
use crate::mpeg::constants::{END_SCAN_REWIND, HEADER_LEN};
use crate::mpeg::header::FrameHeader;
use crate::mpeg::sync::{next_frame, scan_frames, skip_id3v2};
use crate::mpeg::vbr::VbrInfo;
use crate::mpeg::Bitrate;
use crate::traits::AudioFileMetadata;
use crate::types::{BaseAudioInfo, OpenOptions, StreamSource};
use crate::ReadSeek;

/// Bytes of the first frame inspected for VBR signatures
const VBR_PROBE_LEN: usize = 1024;

/// Parse depth reached by the lazy engine. Ordered; never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseState {
    /// Nothing parsed yet (transient, during construction only)
    Unparsed,
    /// First frame and VBR header known
    BeginningParsed,
    /// True audio payload boundary known
    EndParsed,
    /// Every frame walked; counts exact
    AllFramesParsed,
}

/// An opened MPEG audio stream.
///
/// Generic over the underlying reader so large files can be walked through
/// a buffered file handle while tests drive in-memory or instrumented
/// sources. `MappedMpegFile` is the common path-based instantiation.
#[derive(Debug)]
pub struct MpegFile<R: ReadSeek> {
    cursor: ByteCursor<R>,
    file_path: PathBuf,
    options: OpenOptions,
    /// Offset of the first frame header in the stream
    first_offset: u64,
    first_header: FrameHeader,
    vbr: Option<VbrInfo>,
    /// Exact frame count, once a full scan has run or a trusted VBR header
    /// declared it
    frame_count: Option<u64>,
    /// Sum of counted frame lengths from the full scan; never estimated
    byte_count: u64,
    /// End offset of the audio payload, once determined
    audio_end: Option<u64>,
    cached_duration: Option<Duration>,
    cached_average_bitrate: Option<f64>,
    /// True when the full scan had to resynchronize past corrupt regions
    scan_partial: bool,
    state: ParseState,
}

/// An `MpegFile` backed by an in-memory or memory-mapped byte source.
pub type MappedMpegFile<'a> = MpegFile<io::Cursor<StreamSource<'a>>>;

impl<R: ReadSeek> MpegFile<R> {
    /// Open a stream from any `Read + Seek` source with default options.
    ///
    /// Synchronizes on the first frame (bounded lookahead) and parses any
    /// VBR side header before returning.
    ///
    /// # Errors
    ///
    /// - [`MpegMetaError::NotMpegAudio`] when no confirmed frame header
    ///   exists within the lookahead window
    /// - [`MpegMetaError::TruncatedStream`] when the stream ends inside a
    ///   header during initial synchronization
    /// - [`MpegMetaError::Io`] on transport failures
    pub fn from_reader(reader: R) -> MpegMetaResult<Self> {
        Self::from_reader_with_options(reader, OpenOptions::default())
    }

    /// Open a stream from any `Read + Seek` source.
    pub fn from_reader_with_options(reader: R, options: OpenOptions) -> MpegMetaResult<Self> {
        Self::from_parts(reader, PathBuf::from("<stream>"), options)
    }

    fn from_parts(reader: R, file_path: PathBuf, options: OpenOptions) -> MpegMetaResult<Self> {
        let mut cursor = ByteCursor::new(reader)?;

        // Unparsed -> BeginningParsed, or no aggregate at all.
        let search_from = skip_id3v2(&mut cursor, options.start_offset)?;
        if search_from + HEADER_LEN as u64 > cursor.len() {
            return Err(MpegMetaError::truncated_stream(
                "stream ends before a frame header fits",
                ErrorPosition::new(search_from).with_description(format!(
                    "byte offset {} during initial synchronization",
                    search_from
                )),
            ));
        }

        let Some((first_offset, first_header)) =
            next_frame(&mut cursor, search_from, Some(options.sync_window), None)?
        else {
            return Err(MpegMetaError::not_mpeg_audio(
                format!(
                    "no confirmed frame header within {} bytes",
                    options.sync_window
                ),
                ErrorPosition::new(search_from)
                    .with_description(format!("search started at byte offset {}", search_from)),
            ));
        };

        // VBR detection happens exactly once, on the first frame.
        let probe_len = VBR_PROBE_LEN.min((cursor.len() - first_offset) as usize);
        let mut probe = vec![0u8; probe_len];
        cursor.read_at(first_offset, &mut probe)?;
        let vbr = VbrInfo::parse(&first_header, &probe);

        Ok(MpegFile {
            cursor,
            file_path,
            options,
            first_offset,
            first_header,
            vbr,
            frame_count: None,
            byte_count: 0,
            audio_end: None,
            cached_duration: None,
            cached_average_bitrate: None,
            scan_partial: false,
            state: ParseState::BeginningParsed,
        })
    }

    // ------------------------------------------------------------------
    // Scan-free accessors
    // ------------------------------------------------------------------

    /// The decoded first frame header
    pub fn first_frame(&self) -> &FrameHeader {
        &self.first_header
    }

    /// Offset of the first frame header in the stream
    pub fn audio_start(&self) -> u64 {
        self.first_offset
    }

    /// Nominal bitrate declared by the first frame. No scan.
    pub fn bitrate(&self) -> Bitrate {
        self.first_header.bitrate
    }

    /// True when a Xing/Info or VBRI side header is present
    pub fn is_vbr(&self) -> bool {
        self.vbr.is_some()
    }

    /// The parsed VBR side header, if any
    pub fn vbr_info(&self) -> Option<&VbrInfo> {
        self.vbr.as_ref()
    }

    /// Current parse depth
    pub fn parse_state(&self) -> ParseState {
        self.state
    }

    /// True when a completed full scan skipped corrupt regions, making the
    /// exact counts a lower bound on the stream's true totals.
    pub fn scan_was_partial(&self) -> bool {
        self.scan_partial
    }

    /// Total stream length in bytes
    pub fn len(&self) -> u64 {
        self.cursor.len()
    }

    /// True if the underlying stream is empty
    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    /// Path of the opened file, or `<stream>` for reader-based sources
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    // ------------------------------------------------------------------
    // Lazy getters
    // ------------------------------------------------------------------

    /// Total duration of the audio.
    ///
    /// Fast paths: declared VBR frame count (trusted), or the CBR
    /// size-based estimate. With neither available, a full scan runs when
    /// `allow_full_scan` is set; otherwise the answer is `None`.
    pub fn duration(&mut self, allow_full_scan: bool) -> MpegMetaResult<Option<Duration>> {
        if let Some(cached) = self.cached_duration {
            return Ok(Some(cached));
        }

        let duration = if let Some(frames) = self.exact_or_declared_frames() {
            Some(self.duration_of_frames(frames))
        } else if self.cbr_fast_path() {
            let audio_bytes = self.audio_size()?;
            // Estimate only: padding variation is not modelled.
            let kbps = self.first_header.bitrate.kbps().unwrap_or(0);
            Some(Duration::from_secs_f64(
                audio_bytes as f64 * 8.0 / (kbps as f64 * 1000.0),
            ))
        } else if allow_full_scan {
            let frames = self.parse_all()?;
            Some(self.duration_of_frames(frames))
        } else {
            None
        };

        self.cached_duration = duration;
        Ok(duration)
    }

    /// Exact total duration, forcing a full scan if one has not run yet.
    pub fn duration_exact(&mut self) -> MpegMetaResult<Duration> {
        let frames = self.parse_all()?;
        let duration = self.duration_of_frames(frames);
        self.cached_duration = Some(duration);
        Ok(duration)
    }

    /// Average bitrate in kbps.
    ///
    /// Exact for CBR streams and full scans; derived from declared counts
    /// for trusted VBR headers.
    pub fn average_bitrate(&mut self, allow_full_scan: bool) -> MpegMetaResult<Option<f64>> {
        if let Some(cached) = self.cached_average_bitrate {
            return Ok(Some(cached));
        }

        let average = if self.state == ParseState::AllFramesParsed {
            Some(self.scanned_average_bitrate())
        } else if self.cbr_fast_path() {
            self.first_header.bitrate.kbps().map(f64::from)
        } else if let Some(frames) = self.trusted_vbr_frames() {
            let size = self.audio_size()?;
            let samples = frames * u64::from(self.first_header.samples_per_frame());
            Some(vbr_bitrate_kbps(size, samples, self.first_header.sample_rate))
        } else if allow_full_scan {
            self.parse_all()?;
            Some(self.scanned_average_bitrate())
        } else {
            None
        };

        self.cached_average_bitrate = average;
        Ok(average)
    }

    /// Average bitrate in kbps from exact scanned counts.
    pub fn average_bitrate_exact(&mut self) -> MpegMetaResult<f64> {
        self.parse_all()?;
        let average = self.scanned_average_bitrate();
        self.cached_average_bitrate = Some(average);
        Ok(average)
    }

    /// Total number of frames.
    ///
    /// Fast paths: exact count when already scanned, declared VBR count
    /// (trusted), or the CBR size-based estimate.
    pub fn frame_count(&mut self, allow_full_scan: bool) -> MpegMetaResult<Option<u64>> {
        if let Some(frames) = self.exact_or_declared_frames() {
            return Ok(Some(frames));
        }
        if self.cbr_fast_path() {
            let audio_bytes = self.audio_size()?;
            return Ok(Some(self.estimate_cbr_frames(audio_bytes)));
        }
        if allow_full_scan {
            return Ok(Some(self.parse_all()?));
        }
        Ok(None)
    }

    /// Exact frame count, forcing a full scan if one has not run yet.
    pub fn frame_count_exact(&mut self) -> MpegMetaResult<u64> {
        self.parse_all()
    }

    /// Total samples per channel (`frame_count * samples_per_frame`).
    pub fn sample_count(&mut self, allow_full_scan: bool) -> MpegMetaResult<Option<u64>> {
        let samples_per_frame = u64::from(self.first_header.samples_per_frame());
        Ok(self
            .frame_count(allow_full_scan)?
            .map(|frames| frames * samples_per_frame))
    }

    /// Exact total samples per channel, forcing a full scan if needed.
    pub fn sample_count_exact(&mut self) -> MpegMetaResult<u64> {
        let samples_per_frame = u64::from(self.first_header.samples_per_frame());
        Ok(self.parse_all()? * samples_per_frame)
    }

    /// Size of the audio payload in bytes.
    ///
    /// Uses a trusted declared byte count when available; otherwise
    /// advances to `EndParsed` to separate audio from trailing tag bytes.
    pub fn audio_size(&mut self) -> MpegMetaResult<u64> {
        if let Some(declared) = self.trusted_vbr().and_then(VbrInfo::byte_count) {
            return Ok(u64::from(declared));
        }
        let end = self.parse_ending()?;
        Ok(end - self.first_offset)
    }

    /// Stream-level summary, scanning as deep as needed for the default
    /// answers (full scan allowed).
    pub fn base_info(&mut self) -> MpegMetaResult<BaseAudioInfo> {
        Ok(BaseAudioInfo {
            version: self.first_header.version,
            layer: self.first_header.layer,
            channel_mode: self.first_header.channel_mode,
            channels: self.first_header.channels(),
            sample_rate: self.first_header.sample_rate,
            bitrate: self.first_header.bitrate,
            average_bitrate_kbps: self.average_bitrate(true)?,
            duration: self.duration(true)?,
            frame_count: self.frame_count(true)?,
            sample_count: self.sample_count(true)?,
            is_vbr: self.is_vbr(),
        })
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// BeginningParsed -> EndParsed. Determines the true audio payload
    /// boundary by scanning backward from end-of-stream in rewind steps
    /// until a frame chain reaching the boundary is found. Idempotent.
    fn parse_ending(&mut self) -> MpegMetaResult<u64> {
        if let Some(end) = self.audio_end {
            return Ok(end);
        }

        let scan_end = self
            .cursor
            .len()
            .saturating_sub(self.options.end_offset)
            .max(self.first_offset);
        let first_header = self.first_header;

        let mut search_start = scan_end.saturating_sub(END_SCAN_REWIND);
        let end = loop {
            let search_start_clamped = search_start.max(self.first_offset);
            let scan = scan_frames(&mut self.cursor, search_start_clamped, scan_end, &first_header)?;
            if scan.frame_count > 0 {
                break scan.last_end;
            }
            if search_start_clamped == self.first_offset {
                // No frame confirmed anywhere in the tail; the boundary
                // cannot be refined.
                break scan_end;
            }
            search_start = search_start.saturating_sub(END_SCAN_REWIND);
        };

        self.audio_end = Some(end);
        self.advance(ParseState::EndParsed);
        Ok(end)
    }

    /// -> AllFramesParsed. Walks every frame, accumulating exact counts;
    /// corrupt regions are skipped by resynchronization and simply shrink
    /// the result. Idempotent; returns the exact frame count.
    fn parse_all(&mut self) -> MpegMetaResult<u64> {
        if self.state == ParseState::AllFramesParsed {
            return Ok(self.frame_count.unwrap_or(0));
        }

        let end = match self.audio_end {
            Some(end) => end,
            None => self
                .cursor
                .len()
                .saturating_sub(self.options.end_offset)
                .max(self.first_offset),
        };
        let first_header = self.first_header;
        let scan = scan_frames(&mut self.cursor, self.first_offset, end, &first_header)?;

        self.frame_count = Some(scan.frame_count);
        self.byte_count = scan.byte_count;
        self.scan_partial = !scan.clean;
        if self.audio_end.is_none() {
            self.audio_end = Some(scan.last_end);
        }
        // The scan supersedes any cached estimates.
        self.cached_duration = None;
        self.cached_average_bitrate = None;
        self.advance(ParseState::AllFramesParsed);
        Ok(scan.frame_count)
    }

    fn advance(&mut self, to: ParseState) {
        // The lattice is monotonic: deeper scans only ever raise the state.
        self.state = self.state.max(to);
    }

    // ------------------------------------------------------------------
    // Derivation helpers
    // ------------------------------------------------------------------

    /// The VBR header, provided it is trusted for fast-path answers.
    fn trusted_vbr(&self) -> Option<&VbrInfo> {
        if !self.options.trust_vbr_headers {
            return None;
        }
        self.vbr
            .as_ref()
            .filter(|vbr| vbr.frame_count().is_some_and(|count| count > 0))
    }

    fn trusted_vbr_frames(&self) -> Option<u64> {
        self.trusted_vbr()
            .and_then(VbrInfo::frame_count)
            .map(u64::from)
    }

    /// Exact scanned count when available, else a trusted declared count.
    fn exact_or_declared_frames(&self) -> Option<u64> {
        if self.state == ParseState::AllFramesParsed {
            return self.frame_count;
        }
        self.trusted_vbr_frames()
    }

    /// True when the stream can be treated as CBR: a standard bitrate in
    /// the first frame and no VBR side header at all.
    fn cbr_fast_path(&self) -> bool {
        !self.first_header.bitrate.is_free_format() && self.vbr.is_none()
    }

    fn duration_of_frames(&self, frames: u64) -> Duration {
        let samples = frames * u64::from(self.first_header.samples_per_frame());
        Duration::from_secs_f64(samples as f64 / f64::from(self.first_header.sample_rate))
    }

    /// CBR frame count estimate: the payload divided by the padded frame
    /// size, rounded up.
    fn estimate_cbr_frames(&self, audio_bytes: u64) -> u64 {
        match self.first_header.padded_frame_len() {
            Some(padded) => audio_bytes.div_ceil(u64::from(padded)),
            None => 0,
        }
    }

    fn scanned_average_bitrate(&self) -> f64 {
        let frames = self.frame_count.unwrap_or(0);
        let samples = frames * u64::from(self.first_header.samples_per_frame());
        vbr_bitrate_kbps(self.byte_count, samples, self.first_header.sample_rate)
    }
}

/// Average bitrate in kbps of `size` bytes carrying `samples` samples at
/// `sample_rate` Hz.
fn vbr_bitrate_kbps(size: u64, samples: u64, sample_rate: u32) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    let bytes_per_sample = size as f64 / samples as f64;
    bytes_per_sample * f64::from(sample_rate) * 8.0 / 1000.0
}

impl MappedMpegFile<'static> {
    /// Open a file with default options (memory-mapped).
    pub fn open<P: AsRef<Path>>(path: P) -> MpegMetaResult<Self> {
        Self::open_with_options(path, OpenOptions::default())
    }

    /// Open a file, memory-mapping or buffering it per the options.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: OpenOptions,
    ) -> MpegMetaResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        let source = if options.use_memory_map {
            StreamSource::from_file(&file)?
        } else {
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            StreamSource::Owned(data)
        };

        Self::from_parts(io::Cursor::new(source), path.to_path_buf(), options)
    }
}

impl<'a> MappedMpegFile<'a> {
    /// Open an in-memory stream with default options.
    pub fn from_bytes(bytes: &'a [u8]) -> MpegMetaResult<Self> {
        Self::from_bytes_with_options(bytes, OpenOptions::default())
    }

    /// Open an in-memory stream.
    pub fn from_bytes_with_options(
        bytes: &'a [u8],
        options: OpenOptions,
    ) -> MpegMetaResult<Self> {
        Self::from_parts(
            io::Cursor::new(StreamSource::Borrowed(bytes)),
            PathBuf::from("<bytes>"),
            options,
        )
    }
}

impl<'a> AudioFileMetadata for MappedMpegFile<'a> {
    fn open_metadata<P: AsRef<Path>>(path: P) -> MpegMetaResult<Self> {
        MappedMpegFile::open(path)
    }

    fn base_info(&mut self) -> MpegMetaResult<BaseAudioInfo> {
        MpegFile::base_info(self)
    }

    fn duration(&mut self) -> MpegMetaResult<Option<Duration>> {
        MpegFile::duration(self, true)
    }

    fn sample_count(&mut self) -> MpegMetaResult<Option<u64>> {
        MpegFile::sample_count(self, true)
    }

    fn file_path(&self) -> &Path {
        MpegFile::file_path(self)
    }

    fn len(&self) -> u64 {
        MpegFile::len(self)
    }
}
