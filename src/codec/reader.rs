//! Opus logical stream reader

use bytes::Bytes;
use tokio::io::AsyncRead;
use tracing::debug;

use crate::codec::header::{CommentHeader, IdentificationHeader};
use crate::error::CodecError;
use crate::ogg::PacketReader;

/// Raw Opus frames from exactly one logical stream
pub struct OpusStreamReader<R> {
    packets: PacketReader<R>,
    head: IdentificationHeader,
    tags: CommentHeader,
    serial: u32,
    frames_read: u64,
}

impl<R: AsyncRead + Unpin> OpusStreamReader<R> {
    /// Open a reader over an Ogg byte stream
    pub async fn open(reader: R) -> Result<Self, CodecError> {
        Self::from_packets(PacketReader::new(reader)).await
    }

    /// Read and validate the identification and comment headers.
    ///
    /// The stream is pinned to the serial of the identification header.
    pub async fn from_packets(mut packets: PacketReader<R>) -> Result<Self, CodecError> {
        let first = packets
            .next_packet()
            .await?
            .ok_or(CodecError::MissingHeader("OpusHead"))?;
        let head = IdentificationHeader::parse(&first.data)?;
        let serial = first.serial;

        let second = packets
            .next_packet()
            .await?
            .ok_or(CodecError::MissingHeader("OpusTags"))?;
        check_serial(serial, second.serial)?;
        let tags = CommentHeader::parse(&second.data)?;

        debug!(
            serial,
            channels = head.channels,
            pre_skip = head.pre_skip,
            input_sample_rate = head.input_sample_rate,
            vendor = %tags.vendor,
            "Opened Opus stream"
        );

        Ok(Self {
            packets,
            head,
            tags,
            serial,
            frames_read: 0,
        })
    }

    /// Next raw encoded frame, or `Ok(None)` once the stream is exhausted
    pub async fn next_packet(&mut self) -> Result<Option<Bytes>, CodecError> {
        let Some(packet) = self.packets.next_packet().await? else {
            return Ok(None);
        };
        check_serial(self.serial, packet.serial)?;
        self.frames_read += 1;
        Ok(Some(packet.data))
    }

    pub fn head(&self) -> &IdentificationHeader {
        &self.head
    }

    pub fn tags(&self) -> &CommentHeader {
        &self.tags
    }

    /// Serial number the stream is pinned to
    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

fn check_serial(expected: u32, found: u32) -> Result<(), CodecError> {
    if expected != found {
        return Err(CodecError::MultipleStreams { expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OggError;
    use crate::ogg::HeaderType;
    use crate::testutil::{encode_page, lace, opus_file, opus_head, opus_tags};

    #[tokio::test]
    async fn test_reads_frames_after_headers() {
        let bytes = opus_file(42, &[b"frame-1", b"frame-2"]);
        let mut reader = OpusStreamReader::open(&bytes[..]).await.unwrap();

        assert_eq!(reader.serial(), 42);
        assert_eq!(reader.head().channels, 2);
        assert_eq!(reader.tags().get("TITLE"), Some("Fixture"));

        assert_eq!(reader.next_packet().await.unwrap().unwrap(), Bytes::from_static(b"frame-1"));
        assert_eq!(reader.next_packet().await.unwrap().unwrap(), Bytes::from_static(b"frame-2"));
        assert!(reader.next_packet().await.unwrap().is_none());
        assert_eq!(reader.frames_read(), 2);
    }

    #[tokio::test]
    async fn test_first_packet_not_opus_head() {
        let tags = opus_tags("v", &[]);
        let mut bytes = encode_page(1, 0, HeaderType::BEGINNING_OF_STREAM, 0, &lace(&tags));
        bytes.extend(encode_page(1, 1, HeaderType::default(), 0, &[b"audio"]));

        let result = OpusStreamReader::open(&bytes[..]).await;
        assert!(matches!(result, Err(CodecError::Format(_))));
    }

    #[tokio::test]
    async fn test_bad_version_fails_to_open() {
        let mut head = opus_head(2);
        head[8] = 0;
        let mut bytes = encode_page(1, 0, HeaderType::BEGINNING_OF_STREAM, 0, &lace(&head));
        bytes.extend(encode_page(1, 1, HeaderType::default(), 0, &lace(&opus_tags("v", &[]))));

        assert!(OpusStreamReader::open(&bytes[..]).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_stream_is_missing_header() {
        let result = OpusStreamReader::open(&[][..]).await;
        assert!(matches!(result, Err(CodecError::MissingHeader("OpusHead"))));
    }

    #[tokio::test]
    async fn test_second_stream_is_rejected() {
        // Stream 1 is complete through its headers; the first packet of stream 2 must fail.
        let mut bytes = opus_file(1, &[]);
        bytes.extend(encode_page(1, 2, HeaderType::default(), 960, &[b"a1"]));
        bytes.extend(encode_page(2, 0, HeaderType::BEGINNING_OF_STREAM, 0, &lace(&opus_head(2))));
        bytes.extend(encode_page(1, 3, HeaderType::default(), 1920, &[b"a2"]));

        let mut reader = OpusStreamReader::open(&bytes[..]).await.unwrap();
        assert_eq!(reader.next_packet().await.unwrap().unwrap(), Bytes::from_static(b"a1"));

        let err = reader.next_packet().await.unwrap_err();
        assert!(matches!(err, CodecError::MultipleStreams { expected: 1, found: 2 }));
    }

    #[tokio::test]
    async fn test_interleaved_headers_fail_open() {
        let mut bytes = encode_page(1, 0, HeaderType::BEGINNING_OF_STREAM, 0, &lace(&opus_head(2)));
        bytes.extend(encode_page(2, 0, HeaderType::BEGINNING_OF_STREAM, 0, &lace(&opus_head(2))));

        let result = OpusStreamReader::open(&bytes[..]).await;
        assert!(matches!(result, Err(CodecError::MultipleStreams { expected: 1, found: 2 })));
    }

    #[tokio::test]
    async fn test_truncated_frame_page() {
        let bytes = opus_file(3, &[b"frame"]);
        let mut reader = OpusStreamReader::open(&bytes[..bytes.len() - 2]).await.unwrap();

        let err = reader.next_packet().await.unwrap_err();
        assert!(matches!(err, CodecError::Ogg(OggError::UnexpectedEnd)));
    }
}
