//! Error types for the voice streamer

use std::io;
use thiserror::Error;

/// Application-level errors: configuration and process I/O. Each
/// subsystem reports through its own enum below.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Ogg container errors
#[derive(Error, Debug)]
pub enum OggError {
    #[error("Invalid format: {0}")]
    Format(String),

    /// The stream ended in the middle of a page or a packet
    #[error("Unexpected end of stream")]
    UnexpectedEnd,

    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for OggError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => OggError::UnexpectedEnd,
            _ => OggError::Io(err),
        }
    }
}

/// Opus logical stream errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error(transparent)]
    Ogg(#[from] OggError),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Stream ended before the {0} header")]
    MissingHeader(&'static str),

    #[error("Multiple logical streams are not supported (expected serial {expected:#010x}, found {found:#010x})")]
    MultipleStreams { expected: u32, found: u32 },
}

/// Playback controller errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Track is skipped")]
    Skipped,

    #[error("Cancelled")]
    Cancelled,
}

/// Task queue errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is full ({0} tasks)")]
    Full(usize),

    #[error("Cancelled")]
    Cancelled,
}

/// Byte producer errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to start producer: {0}")]
    Spawn(String),

    #[error("Producer failed: {0}")]
    Exited(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Voice sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid frame datagram")]
    InvalidDatagram,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced once per track by the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Producer stage: {0}")]
    Source(#[from] SourceError),

    #[error("Demux stage: {0}")]
    Codec(#[from] CodecError),

    #[error("Sender stage: {0}")]
    Sink(#[from] SinkError),

    #[error("Cancelled")]
    Cancelled,
}

impl From<PlaybackError> for PipelineError {
    fn from(err: PlaybackError) -> Self {
        match err {
            // Skips are absorbed by the sender stage; one leaking here is still a stop.
            PlaybackError::Skipped | PlaybackError::Cancelled => PipelineError::Cancelled,
        }
    }
}

impl PipelineError {
    /// Whether the track was stopped by cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled | PipelineError::Source(SourceError::Cancelled))
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_read_maps_to_unexpected_end() {
        let err: OggError = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, OggError::UnexpectedEnd));

        let err: OggError = io::Error::from(io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, OggError::Io(_)));
    }

    #[test]
    fn test_application_error_conversions() {
        let err: Error = io::Error::from(io::ErrorKind::AddrInUse).into();
        assert!(matches!(err, Error::Io(_)));

        let err = Error::Config("ui.http_port".into());
        assert_eq!(err.to_string(), "Configuration error: ui.http_port");
    }

    #[test]
    fn test_multiple_streams_message() {
        let err = CodecError::MultipleStreams { expected: 1, found: 2 };
        assert!(err.to_string().contains("0x00000001"));
        assert!(err.to_string().contains("0x00000002"));
    }
}
