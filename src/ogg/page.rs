//! Ogg page framing
//!
//! A page is a 27-byte header, a segment table and the concatenated
//! segment payload. All multi-byte fields are little-endian.

use bytes::{Buf, Bytes, BytesMut};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::error::OggError;

/// Capture pattern opening every page
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Only stream structure version defined by RFC 3533
pub const STREAM_VERSION: u8 = 0;

/// A segment of this size continues into the next one
pub const MAX_SEGMENT_SIZE: usize = 255;

/// Header bytes following the capture pattern, up to and including the segment count
const FIXED_HEADER_SIZE: usize = 23;

/// Page header-type flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderType(u8);

impl HeaderType {
    /// First packet on the page continues one from the previous page
    pub const CONTINUATION: HeaderType = HeaderType(0x01);
    /// First page of a logical stream
    pub const BEGINNING_OF_STREAM: HeaderType = HeaderType(0x02);
    /// Last page of a logical stream
    pub const END_OF_STREAM: HeaderType = HeaderType(0x04);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: HeaderType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for HeaderType {
    type Output = HeaderType;

    fn bitor(self, rhs: HeaderType) -> HeaderType {
        HeaderType(self.0 | rhs.0)
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (HeaderType::CONTINUATION, "Continuation"),
            (HeaderType::BEGINNING_OF_STREAM, "BeginningOfStream"),
            (HeaderType::END_OF_STREAM, "EndOfStream"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&set.join("|"))
    }
}

/// One physical Ogg page
#[derive(Debug, Clone)]
pub struct Page {
    pub version: u8,
    pub header_type: HeaderType,
    pub granule_position: u64,
    pub serial: u32,
    pub sequence: u32,
    /// CRC as stored in the page; it is not verified
    pub checksum: u32,
    segment_sizes: Vec<u8>,
    /// Start of each segment in `payload`, plus the payload length
    segment_offsets: Vec<usize>,
    payload: Bytes,
}

impl Page {
    /// Number of lacing values in the segment table
    pub fn segment_count(&self) -> usize {
        self.segment_sizes.len()
    }

    /// Lacing values as stored in the segment table
    pub fn segment_sizes(&self) -> &[u8] {
        &self.segment_sizes
    }

    /// Segment at `index`, sliced out of the page payload without copying
    pub fn segment(&self, index: usize) -> Option<Bytes> {
        let start = *self.segment_offsets.get(index)?;
        let end = *self.segment_offsets.get(index + 1)?;
        Some(self.payload.slice(start..end))
    }

    /// All segments in page order
    pub fn segments(&self) -> impl Iterator<Item = Bytes> + '_ {
        self.segment_offsets
            .windows(2)
            .map(move |bounds| self.payload.slice(bounds[0]..bounds[1]))
    }

    /// Concatenated segment bytes
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn is_continuation(&self) -> bool {
        self.header_type.contains(HeaderType::CONTINUATION)
    }

    pub fn is_bos(&self) -> bool {
        self.header_type.contains(HeaderType::BEGINNING_OF_STREAM)
    }

    pub fn is_eos(&self) -> bool {
        self.header_type.contains(HeaderType::END_OF_STREAM)
    }
}

/// Reads pages one at a time from an async byte stream
pub struct PageReader<R> {
    reader: R,
    pages_read: u64,
}

impl<R: AsyncRead + Unpin> PageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pages_read: 0,
        }
    }

    /// Read the next page.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a page boundary and
    /// [`OggError::UnexpectedEnd`] when it ends inside a page.
    pub async fn next_page(&mut self) -> Result<Option<Page>, OggError> {
        let mut capture = [0u8; 4];
        if !fill_or_eof(&mut self.reader, &mut capture).await? {
            return Ok(None);
        }
        if &capture != CAPTURE_PATTERN {
            return Err(OggError::Format(format!(
                "invalid capture pattern: {:02x?}",
                capture
            )));
        }

        let mut header = [0u8; FIXED_HEADER_SIZE];
        self.reader.read_exact(&mut header).await?;
        let mut fields = &header[..];

        let version = fields.get_u8();
        if version != STREAM_VERSION {
            return Err(OggError::Format(format!("unsupported page version: {}", version)));
        }
        let header_type = HeaderType::from_bits(fields.get_u8());
        let granule_position = fields.get_u64_le();
        let serial = fields.get_u32_le();
        let sequence = fields.get_u32_le();
        let checksum = fields.get_u32_le();
        let segment_count = fields.get_u8() as usize;

        let mut segment_sizes = vec![0u8; segment_count];
        self.reader.read_exact(&mut segment_sizes).await?;

        let mut segment_offsets = Vec::with_capacity(segment_count + 1);
        let mut payload_size = 0;
        segment_offsets.push(0);
        for &size in &segment_sizes {
            payload_size += size as usize;
            segment_offsets.push(payload_size);
        }
        let mut payload = BytesMut::zeroed(payload_size);
        self.reader.read_exact(&mut payload[..]).await?;

        self.pages_read += 1;
        trace!(
            serial,
            sequence,
            granule_position,
            segments = segment_count,
            flags = %header_type,
            "Read Ogg page"
        );

        Ok(Some(Page {
            version,
            header_type,
            granule_position,
            serial,
            sequence,
            checksum,
            segment_sizes,
            segment_offsets,
            payload: payload.freeze(),
        }))
    }

    /// Pages successfully read so far
    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }
}

/// Fill `buf` completely, or report a clean end of stream if nothing was read.
async fn fill_or_eof<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<bool, OggError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 if filled == 0 => return Ok(false),
            0 => return Err(OggError::UnexpectedEnd),
            n => filled += n,
        }
    }
    Ok(true)
}
