//! Packet reassembly across pages
//!
//! Segments are accumulated per logical stream until a segment shorter
//! than 255 bytes terminates the packet. Interleaved streams each keep
//! their own pending segments.

use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use tokio::io::AsyncRead;
use tracing::trace;

use crate::error::OggError;
use crate::ogg::page::{Page, PageReader, MAX_SEGMENT_SIZE};

/// A complete packet of one logical stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub serial: u32,
    /// Granule position of the page the packet completed on
    pub granule_position: u64,
    /// The packet completed on an end-of-stream page
    pub end_of_stream: bool,
    pub data: Bytes,
}

struct Segment {
    serial: u32,
    granule_position: u64,
    end_of_stream: bool,
    data: Bytes,
}

/// Reassembles packets from a page stream
pub struct PacketReader<R> {
    pages: PageReader<R>,
    page: Option<Page>,
    cursor: usize,
    pending: HashMap<u32, Vec<Bytes>>,
}

impl<R: AsyncRead + Unpin> PacketReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            pages: PageReader::new(reader),
            page: None,
            cursor: 0,
            pending: HashMap::new(),
        }
    }

    /// Next complete packet of any stream.
    ///
    /// Returns `Ok(None)` at a clean end of input. Input ending while a
    /// stream still holds an unterminated packet is [`OggError::UnexpectedEnd`].
    pub async fn next_packet(&mut self) -> Result<Option<Packet>, OggError> {
        loop {
            let Some(segment) = self.next_segment().await? else {
                if self.pending.values().any(|segments| !segments.is_empty()) {
                    return Err(OggError::UnexpectedEnd);
                }
                return Ok(None);
            };

            let terminated = segment.data.len() < MAX_SEGMENT_SIZE;
            let segments = self.pending.entry(segment.serial).or_default();
            segments.push(segment.data);
            if !terminated {
                continue;
            }

            let data = concat(std::mem::take(segments));
            trace!(serial = segment.serial, len = data.len(), "Reassembled packet");
            return Ok(Some(Packet {
                serial: segment.serial,
                granule_position: segment.granule_position,
                end_of_stream: segment.end_of_stream,
                data,
            }));
        }
    }

    async fn next_segment(&mut self) -> Result<Option<Segment>, OggError> {
        loop {
            if let Some(page) = &self.page {
                if let Some(data) = page.segment(self.cursor) {
                    self.cursor += 1;
                    return Ok(Some(Segment {
                        serial: page.serial,
                        granule_position: page.granule_position,
                        end_of_stream: page.is_eos(),
                        data,
                    }));
                }
            }

            self.page = self.pages.next_page().await?;
            self.cursor = 0;
            if self.page.is_none() {
                return Ok(None);
            }
        }
    }

    /// Pages consumed so far
    pub fn pages_read(&self) -> u64 {
        self.pages.pages_read()
    }
}

fn concat(mut segments: Vec<Bytes>) -> Bytes {
    if segments.len() == 1 {
        return segments.pop().unwrap_or_default();
    }
    let len = segments.iter().map(Bytes::len).sum();
    let mut out = BytesMut::with_capacity(len);
    for segment in &segments {
        out.extend_from_slice(segment);
    }
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ogg::HeaderType;
    use crate::testutil::{encode_page, lace};
    use proptest::prelude::*;

    async fn collect(bytes: &[u8]) -> Result<Vec<Packet>, OggError> {
        let mut reader = PacketReader::new(bytes);
        let mut packets = Vec::new();
        while let Some(packet) = reader.next_packet().await? {
            packets.push(packet);
        }
        Ok(packets)
    }

    #[tokio::test]
    async fn test_packets_within_one_page() {
        let bytes = encode_page(5, 0, HeaderType::default(), 10, &[b"one", b"two"]);
        let packets = collect(&bytes).await.unwrap();

        assert_eq!(packets.len(), 2);
        assert_eq!(&packets[0].data[..], b"one");
        assert_eq!(&packets[1].data[..], b"two");
        assert!(packets.iter().all(|p| p.serial == 5 && p.granule_position == 10));
    }

    #[tokio::test]
    async fn test_packet_spanning_pages() {
        let packet: Vec<u8> = (0..600u32).map(|i| i as u8).collect();
        let segments = lace(&packet);
        assert_eq!(segments.len(), 3);

        let mut bytes = encode_page(9, 0, HeaderType::default(), 0, &segments[..2]);
        bytes.extend(encode_page(9, 1, HeaderType::CONTINUATION | HeaderType::END_OF_STREAM, 960, &segments[2..]));

        let packets = collect(&bytes).await.unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0].data[..], &packet[..]);
        assert_eq!(packets[0].granule_position, 960);
        assert!(packets[0].end_of_stream);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_255_needs_empty_terminator() {
        let packet = vec![7u8; 255];
        let bytes = encode_page(1, 0, HeaderType::default(), 0, &lace(&packet));

        let packets = collect(&bytes).await.unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].data.len(), 255);
    }

    #[tokio::test]
    async fn test_interleaved_streams_keep_separate_buffers() {
        let a = vec![0xAAu8; 300];
        let b = vec![0xBBu8; 10];
        let a_segments = lace(&a);

        let mut bytes = encode_page(1, 0, HeaderType::default(), 0, &a_segments[..1]);
        bytes.extend(encode_page(2, 0, HeaderType::default(), 0, &[&b]));
        bytes.extend(encode_page(1, 1, HeaderType::CONTINUATION, 0, &a_segments[1..]));

        let packets = collect(&bytes).await.unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].serial, 2);
        assert_eq!(packets[0].data, Bytes::from(b));
        assert_eq!(packets[1].serial, 1);
        assert_eq!(packets[1].data, Bytes::from(a));
    }

    #[tokio::test]
    async fn test_unterminated_packet_is_unexpected_end() {
        let segment = vec![0u8; 255];
        let bytes = encode_page(1, 0, HeaderType::default(), 0, &[&segment]);

        let err = collect(&bytes).await.unwrap_err();
        assert!(matches!(err, OggError::UnexpectedEnd));
    }

    #[tokio::test]
    async fn test_empty_pages_are_skipped() {
        let mut bytes = encode_page(1, 0, HeaderType::default(), 0, &[]);
        bytes.extend(encode_page(1, 1, HeaderType::default(), 0, &[b"x"]));

        let mut reader = PacketReader::new(&bytes[..]);
        let packet = reader.next_packet().await.unwrap().unwrap();
        assert_eq!(&packet.data[..], b"x");
        assert_eq!(reader.pages_read(), 2);
        assert!(reader.next_packet().await.unwrap().is_none());
    }

    proptest! {
        #[test]
        fn prop_reassembly_matches_input(
            packets in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..700), 1..8),
            per_page in 1usize..6,
        ) {
            // Lace every packet, then cut the segment stream into pages of `per_page` segments.
            let segments: Vec<&[u8]> = packets.iter().flat_map(|p| lace(p)).collect();
            let mut bytes = Vec::new();
            for (sequence, chunk) in segments.chunks(per_page).enumerate() {
                bytes.extend(encode_page(3, sequence as u32, HeaderType::default(), 0, chunk));
            }

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let decoded = runtime.block_on(collect(&bytes)).unwrap();

            prop_assert_eq!(decoded.len(), packets.len());
            for (decoded, expected) in decoded.iter().zip(&packets) {
                prop_assert_eq!(&decoded.data[..], &expected[..]);
            }
        }
    }
}
