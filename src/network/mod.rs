//! UDP voice transport for encoded frames

pub mod protocol;
pub mod udp;

pub use protocol::FrameHeader;
pub use udp::{UdpGateway, UdpVoiceConnection};
