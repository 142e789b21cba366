//! Ogg/Opus fixture builders shared by unit tests

use crate::ogg::page::{HeaderType, CAPTURE_PATTERN, MAX_SEGMENT_SIZE};

/// Encode one page from raw segments (each at most 255 bytes).
pub(crate) fn encode_page(
    serial: u32,
    sequence: u32,
    header_type: HeaderType,
    granule_position: u64,
    segments: &[&[u8]],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(CAPTURE_PATTERN);
    out.push(0);
    out.push(header_type.bits());
    out.extend_from_slice(&granule_position.to_le_bytes());
    out.extend_from_slice(&serial.to_le_bytes());
    out.extend_from_slice(&sequence.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.push(segments.len() as u8);
    for segment in segments {
        assert!(segment.len() <= MAX_SEGMENT_SIZE);
        out.push(segment.len() as u8);
    }
    for segment in segments {
        out.extend_from_slice(segment);
    }
    out
}

/// Split a packet into lacing segments, ending with a segment shorter than 255.
pub(crate) fn lace(packet: &[u8]) -> Vec<&[u8]> {
    let mut segments: Vec<&[u8]> = packet.chunks(MAX_SEGMENT_SIZE).collect();
    if packet.len() % MAX_SEGMENT_SIZE == 0 {
        segments.push(&[]);
    }
    segments
}

/// Minimal OpusHead packet for mapping family 0.
pub(crate) fn opus_head(channels: u8) -> Vec<u8> {
    let mut out = b"OpusHead".to_vec();
    out.push(1);
    out.push(channels);
    out.extend_from_slice(&312u16.to_le_bytes());
    out.extend_from_slice(&48_000u32.to_le_bytes());
    out.extend_from_slice(&0i16.to_le_bytes());
    out.push(0);
    out
}

pub(crate) fn opus_tags(vendor: &str, comments: &[&str]) -> Vec<u8> {
    let mut out = b"OpusTags".to_vec();
    out.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    out.extend_from_slice(vendor.as_bytes());
    out.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        out.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        out.extend_from_slice(comment.as_bytes());
    }
    out
}

/// A single-stream Ogg/Opus file: one page per packet, headers first.
pub(crate) fn opus_file(serial: u32, frames: &[&[u8]]) -> Vec<u8> {
    let head = opus_head(2);
    let tags = opus_tags("test-vendor", &["TITLE=Fixture"]);

    let mut out = encode_page(serial, 0, HeaderType::BEGINNING_OF_STREAM, 0, &lace(&head));
    out.extend(encode_page(serial, 1, HeaderType::default(), 0, &lace(&tags)));
    for (i, frame) in frames.iter().enumerate() {
        let header_type = if i + 1 == frames.len() {
            HeaderType::END_OF_STREAM
        } else {
            HeaderType::default()
        };
        let granule = 960 * (i as u64 + 1);
        out.extend(encode_page(serial, i as u32 + 2, header_type, granule, &lace(frame)));
    }
    out
}
