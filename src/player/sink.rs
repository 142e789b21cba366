//! Voice transport seam
//!
//! The gateway opens a connection to a destination; the connection accepts
//! raw Opus frames bracketed by speaking notifications.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::tracks::Destination;

#[async_trait]
pub trait VoiceConnection: Send {
    async fn start_speaking(&mut self) -> Result<(), SinkError>;

    async fn stop_speaking(&mut self) -> Result<(), SinkError>;

    /// Send one encoded frame. Implementations may pace to real time.
    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), SinkError>;

    async fn disconnect(&mut self) -> Result<(), SinkError>;
}

#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn connect(&self, destination: &Destination) -> Result<Box<dyn VoiceConnection>, SinkError>;
}
