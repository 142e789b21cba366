//! Byte producers feeding the pipeline
//!
//! A producer turns a [`Task`] into an Ogg/Opus byte stream written to the
//! pipe handed to it. The pipeline closes the pipe once the producer returns.

pub mod process;

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::tracks::Task;

pub use process::ProcessSource;

/// Writable end of the producer pipe
pub type PipeWriter = dyn AsyncWrite + Send + Unpin;

#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Write the task's media into `output` until done or `cancel` fires
    async fn produce(
        &self,
        task: &Task,
        output: &mut PipeWriter,
        cancel: &CancellationToken,
    ) -> Result<(), SourceError>;
}
