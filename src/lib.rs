//! # Voice Streamer
//!
//! Queue-driven streaming of Ogg/Opus media into voice connections.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  enqueue / pause / resume / skip / clear
//! │  HTTP API    │───────────────────────────────┐
//! │   (ui)       │                               ▼
//! └──────────────┘                   ┌───────────────────────┐
//!                                    │ PlayerHandle          │
//!                                    │  TaskQueue  +  Playback│
//!                                    │            Controller │
//!                                    └──────────┬────────────┘
//!                                               │ pop
//!                                               ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Player loop (player::runner)                    │
//! │  one connection per destination, one pipeline per task              │
//! │                                                                     │
//! │  ┌────────────┐  pipe  ┌──────────────────────┐ frames ┌──────────┐ │
//! │  │ Producer   │───────▶│ Demux                │───────▶│ Sender   │ │
//! │  │ (source)   │ bytes  │ ogg pages ▶ packets  │ bounded│ pause /  │ │
//! │  │ ffmpeg ... │        │ ▶ OpusHead/OpusTags  │ channel│ skip gate│ │
//! │  └────────────┘        └──────────────────────┘        └────┬─────┘ │
//! └─────────────────────────────────────────────────────────────┼───────┘
//!                                                               ▼
//!                                          ┌─────────────────────────────┐
//!                                          │ Voice connection (network)  │
//!                                          │ [Magic|Flags|Seq|TS|Stream] │
//!                                          └─────────────────────────────┘
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod ogg;
pub mod playback;
pub mod player;
pub mod source;
pub mod tracks;
pub mod ui;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Opus always runs its granule clock at 48 kHz
    pub const OPUS_SAMPLE_RATE: u32 = 48000;

    /// Pending tasks accepted before enqueue fails
    pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

    /// Frames buffered between demux and sender
    pub const DEFAULT_FRAME_BUFFER: usize = 2048;

    /// Bytes buffered between producer and demux
    pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

    /// Default UDP port of the voice endpoint
    pub const DEFAULT_SINK_PORT: u16 = 5004;

    /// Default frame pacing in milliseconds
    pub const DEFAULT_FRAME_DURATION_MS: u64 = 20;

    /// Default HTTP port for the control API
    pub const DEFAULT_HTTP_PORT: u16 = 8080;

    /// Maximum datagram size for UDP
    pub const MAX_PACKET_SIZE: usize = 1472; // MTU - IP/UDP headers
}
