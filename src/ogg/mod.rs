//! Ogg container demultiplexing (RFC 3533)
//!
//! Pages are read from any async byte stream and reassembled into
//! per-stream packets. Only decoding is supported.

pub mod packet;
pub mod page;

pub use packet::{Packet, PacketReader};
pub use page::{HeaderType, Page, PageReader};
