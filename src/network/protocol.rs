//! Frame datagram format
//!
//! ```text
//!  0        1        2        4                8                12
//! ┌────────┬────────┬────────┬────────────────┬────────────────┬───────────
//! │ magic  │ flags  │  seq   │   timestamp    │   stream id    │ opus data
//! └────────┴────────┴────────┴────────────────┴────────────────┴───────────
//! ```
//!
//! Multi-byte fields are big-endian. A datagram with no payload is a
//! speaking notification.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::SinkError;

pub const FRAME_MAGIC: u8 = 0xA5;
pub const HEADER_SIZE: usize = 12;

/// Header flag bits
pub mod flags {
    /// Set while the sender is speaking
    pub const SPEAKING: u8 = 0x01;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub flags: u8,
    pub sequence: u16,
    /// 48 kHz sample clock
    pub timestamp: u32,
    pub stream_id: u32,
}

impl FrameHeader {
    pub fn is_speaking(&self) -> bool {
        self.flags & flags::SPEAKING != 0
    }

    /// Serialize the header followed by `payload`
    pub fn encode(&self, payload: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        buf.put_u8(FRAME_MAGIC);
        buf.put_u8(self.flags);
        buf.put_u16(self.sequence);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.stream_id);
        buf.put_slice(payload);
        buf.freeze()
    }

    /// Split a datagram into its header and payload
    pub fn decode(datagram: &[u8]) -> Result<(Self, &[u8]), SinkError> {
        if datagram.len() < HEADER_SIZE || datagram[0] != FRAME_MAGIC {
            return Err(SinkError::InvalidDatagram);
        }
        let mut buf = &datagram[1..HEADER_SIZE];
        let header = FrameHeader {
            flags: buf.get_u8(),
            sequence: buf.get_u16(),
            timestamp: buf.get_u32(),
            stream_id: buf.get_u32(),
        };
        Ok((header, &datagram[HEADER_SIZE..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = FrameHeader {
            flags: flags::SPEAKING,
            sequence: 0x0102,
            timestamp: 0x03040506,
            stream_id: 0x0708090A,
        };
        let datagram = header.encode(b"op");
        assert_eq!(
            &datagram[..],
            &[0xA5, 0x01, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, b'o', b'p']
        );

        let (decoded, payload) = FrameHeader::decode(&datagram).unwrap();
        assert_eq!(decoded, header);
        assert!(decoded.is_speaking());
        assert_eq!(payload, b"op");
    }

    #[test]
    fn test_rejects_short_or_foreign_datagrams() {
        assert!(FrameHeader::decode(&[FRAME_MAGIC; 5]).is_err());
        assert!(FrameHeader::decode(&[0u8; HEADER_SIZE]).is_err());
    }
}
