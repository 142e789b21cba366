//! Per-track streaming pipeline
//!
//! ```text
//!  ┌──────────┐  pipe   ┌──────────┐  frames  ┌──────────┐
//!  │ producer │ ──────▶ │  demux   │ ───────▶ │  sender  │ ──▶ voice connection
//!  └──────────┘ (bytes) └──────────┘ (bounded)└──────────┘
//! ```
//!
//! The three stages run concurrently inside one cancellation scope. The
//! first stage error cancels the scope and is the one reported. A skip
//! observed by the sender stops the scope without an error.

use bytes::Bytes;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::OpusStreamReader;
use crate::config::PlayerConfig;
use crate::error::{PipelineError, PlaybackError};
use crate::player::sink::VoiceConnection;
use crate::playback::PlaybackController;
use crate::source::TrackSource;
use crate::tracks::Task;

/// How a track ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Completed { frames: u64 },
    Skipped { frames: u64 },
}

/// Cancellation scope shared by the stages of one track
struct StageScope {
    token: CancellationToken,
    first_error: Mutex<Option<PipelineError>>,
    stopped: AtomicBool,
}

impl StageScope {
    fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            first_error: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// Record a stage failure and cancel the other stages
    fn fail(&self, stage: &str, err: PipelineError) {
        if self.stopped.load(Ordering::Acquire) {
            debug!(stage, "Stage ended after stop: {}", err);
        } else {
            let mut first = self.first_error.lock();
            if first.is_none() {
                debug!(stage, "Stage failed: {}", err);
                *first = Some(err);
            }
        }
        self.token.cancel();
    }

    /// Cancel the other stages without reporting an error
    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.token.cancel();
    }

    async fn supervise<T, F>(&self, stage: &str, future: F) -> Option<T>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let result = future.await;
        debug!(stage, "Stage stopped");
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.fail(stage, err);
                None
            }
        }
    }
}

/// Runs one task through producer, demux and sender
pub struct Pipeline {
    source: Arc<dyn TrackSource>,
    controller: Arc<PlaybackController>,
    frame_buffer: usize,
    pipe_capacity: usize,
}

impl Pipeline {
    pub fn new(source: Arc<dyn TrackSource>, controller: Arc<PlaybackController>, config: &PlayerConfig) -> Self {
        Self {
            source,
            controller,
            frame_buffer: config.frame_buffer,
            pipe_capacity: config.pipe_capacity,
        }
    }

    /// Stream `task` into `connection`, returning once all three stages stopped
    pub async fn run(
        &self,
        task: &Task,
        connection: &mut dyn VoiceConnection,
        cancel: &CancellationToken,
    ) -> Result<TrackOutcome, PipelineError> {
        let scope = StageScope::new(cancel);
        let (reader, writer) = tokio::io::duplex(self.pipe_capacity);
        let (frame_tx, frame_rx) = mpsc::channel(self.frame_buffer);

        self.controller.start_track();
        let (_, _, outcome) = tokio::join!(
            scope.supervise("producer", self.produce(task, writer, &scope.token)),
            scope.supervise("demux", demux(reader, frame_tx, &scope.token)),
            scope.supervise("sender", self.send(connection, frame_rx, &scope)),
        );
        self.controller.finish_track();

        if let Some(err) = scope.first_error.into_inner() {
            return Err(err);
        }
        outcome.ok_or(PipelineError::Cancelled)
    }

    async fn produce(
        &self,
        task: &Task,
        mut writer: tokio::io::DuplexStream,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let result = self.source.produce(task, &mut writer, cancel).await;
        // Closing the write end lets the demux stage see a clean end of stream.
        if let Err(e) = writer.shutdown().await {
            debug!("Pipe shutdown failed: {}", e);
        }
        result?;
        Ok(())
    }

    async fn send(
        &self,
        connection: &mut dyn VoiceConnection,
        mut frames: mpsc::Receiver<Bytes>,
        scope: &StageScope,
    ) -> Result<TrackOutcome, PipelineError> {
        connection.start_speaking().await?;
        let result = self.forward(connection, &mut frames, scope).await;
        if let Err(e) = connection.stop_speaking().await {
            warn!("Failed to stop speaking: {}", e);
        }
        result
    }

    async fn forward(
        &self,
        connection: &mut dyn VoiceConnection,
        frames: &mut mpsc::Receiver<Bytes>,
        scope: &StageScope,
    ) -> Result<TrackOutcome, PipelineError> {
        let cancel = &scope.token;
        let mut sent = 0;

        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                frame = frames.recv() => frame,
            };
            let Some(frame) = frame else {
                return Ok(TrackOutcome::Completed { frames: sent });
            };

            match self.controller.check(cancel).await {
                Ok(()) => {}
                Err(PlaybackError::Skipped) => {
                    scope.stop();
                    return Ok(TrackOutcome::Skipped { frames: sent });
                }
                Err(err) => return Err(err.into()),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                result = connection.send_frame(&frame) => result?,
            }
            sent += 1;
        }
    }
}

/// Parse the pipe into frames and hand them to the sender, in order.
async fn demux<R>(reader: R, frames: mpsc::Sender<Bytes>, cancel: &CancellationToken) -> Result<u64, PipelineError>
where
    R: AsyncRead + Unpin,
{
    let mut stream = tokio::select! {
        _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
        stream = OpusStreamReader::open(reader) => stream?,
    };

    let head = stream.head();
    info!(
        title = stream.tags().get("TITLE").unwrap_or("unknown"),
        channels = head.channels,
        input_sample_rate = head.input_sample_rate,
        serial = stream.serial(),
        "Streaming track"
    );

    loop {
        let packet = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            packet = stream.next_packet() => packet?,
        };
        let Some(frame) = packet else {
            break;
        };

        tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            sent = frames.send(frame) => {
                if sent.is_err() {
                    // Sender stage is gone; it reports why.
                    break;
                }
            }
        }
    }

    Ok(stream.frames_read())
}
