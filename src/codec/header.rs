//! Opus header packets (RFC 7845 section 5)
//!
//! Both headers are little-endian. The comment header is informational
//! and only used for logging.

use bytes::Buf;

use crate::error::CodecError;

pub const OPUS_HEAD_MAGIC: &[u8; 8] = b"OpusHead";
pub const OPUS_TAGS_MAGIC: &[u8; 8] = b"OpusTags";

/// Identification header version accepted by the reader
pub const OPUS_VERSION: u8 = 1;

/// Channel mapping table, present when the mapping family is not 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapping {
    pub stream_count: u8,
    pub coupled_count: u8,
    pub mapping: Vec<u8>,
}

/// Identification header ("OpusHead")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationHeader {
    pub channels: u8,
    pub pre_skip: u16,
    pub input_sample_rate: u32,
    /// Q7.8 gain in dB
    pub output_gain: i16,
    pub channel_mapping_family: u8,
    pub channel_mapping: Option<ChannelMapping>,
}

impl IdentificationHeader {
    pub fn parse(packet: &[u8]) -> Result<Self, CodecError> {
        let mut buf = packet;
        expect_magic(&mut buf, OPUS_HEAD_MAGIC)?;
        ensure_remaining(buf, 11, "OpusHead")?;

        let version = buf.get_u8();
        if version != OPUS_VERSION {
            return Err(CodecError::Format(format!("unsupported Opus version: {}", version)));
        }

        let channels = buf.get_u8();
        if channels == 0 {
            return Err(CodecError::Format("invalid channel count: 0".into()));
        }

        let pre_skip = buf.get_u16_le();
        let input_sample_rate = buf.get_u32_le();
        let output_gain = buf.get_i16_le();
        let channel_mapping_family = buf.get_u8();

        let channel_mapping = if channel_mapping_family == 0 {
            None
        } else {
            ensure_remaining(buf, 2 + channels as usize, "channel mapping table")?;
            let stream_count = buf.get_u8();
            let coupled_count = buf.get_u8();
            let mapping = buf[..channels as usize].to_vec();
            Some(ChannelMapping {
                stream_count,
                coupled_count,
                mapping,
            })
        };

        Ok(Self {
            channels,
            pre_skip,
            input_sample_rate,
            output_gain,
            channel_mapping_family,
            channel_mapping,
        })
    }

    pub fn output_gain_db(&self) -> f32 {
        self.output_gain as f32 / 256.0
    }
}

/// Comment header ("OpusTags")
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentHeader {
    pub vendor: String,
    pub comments: Vec<String>,
}

impl CommentHeader {
    pub fn parse(packet: &[u8]) -> Result<Self, CodecError> {
        let mut buf = packet;
        expect_magic(&mut buf, OPUS_TAGS_MAGIC)?;

        let vendor = read_string(&mut buf, "vendor string")?;

        ensure_remaining(buf, 4, "comment count")?;
        let count = buf.get_u32_le() as usize;
        // Each comment needs at least its length prefix.
        let mut comments = Vec::with_capacity(count.min(buf.remaining() / 4));
        for _ in 0..count {
            comments.push(read_string(&mut buf, "user comment")?);
        }

        Ok(Self { vendor, comments })
    }

    /// Value of the first `KEY=value` comment, matching the key case-insensitively
    pub fn get(&self, key: &str) -> Option<&str> {
        self.comments.iter().find_map(|comment| {
            let (name, value) = comment.split_once('=')?;
            name.eq_ignore_ascii_case(key).then_some(value)
        })
    }
}

fn expect_magic(buf: &mut &[u8], magic: &[u8; 8]) -> Result<(), CodecError> {
    if buf.len() < magic.len() || &buf[..magic.len()] != magic {
        let seen = &buf[..buf.len().min(magic.len())];
        return Err(CodecError::Format(format!(
            "expected {} capture pattern, found {:?}",
            String::from_utf8_lossy(magic),
            String::from_utf8_lossy(seen)
        )));
    }
    buf.advance(magic.len());
    Ok(())
}

fn ensure_remaining(buf: &[u8], needed: usize, what: &str) -> Result<(), CodecError> {
    if buf.len() < needed {
        return Err(CodecError::Format(format!(
            "truncated {}: need {} bytes, have {}",
            what,
            needed,
            buf.len()
        )));
    }
    Ok(())
}

fn read_string(buf: &mut &[u8], what: &str) -> Result<String, CodecError> {
    ensure_remaining(*buf, 4, what)?;
    let len = buf.get_u32_le() as usize;
    ensure_remaining(*buf, len, what)?;
    let value = String::from_utf8_lossy(&buf[..len]).into_owned();
    buf.advance(len);
    Ok(value)
}
