//! Player loop
//!
//! Pops tasks in submission order, keeps one voice connection open while
//! there is work for its destination, and runs a pipeline per task. A
//! failed track is logged and the loop moves on.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PlayerConfig;
use crate::player::handle::PlayerHandle;
use crate::player::pipeline::{Pipeline, TrackOutcome};
use crate::player::sink::{VoiceConnection, VoiceGateway};
use crate::playback::PlaybackController;
use crate::source::TrackSource;
use crate::tracks::{Destination, Task, TaskQueue};

/// An open voice connection and the destination it serves
pub struct Session {
    pub destination: Destination,
    pub connection: Box<dyn VoiceConnection>,
}

impl Session {
    pub async fn close(mut self) {
        match self.connection.disconnect().await {
            Ok(()) => info!(destination = %self.destination, "Disconnected"),
            Err(e) => warn!(destination = %self.destination, "Disconnect failed: {}", e),
        }
    }
}

pub struct Player {
    queue: Arc<TaskQueue<Task>>,
    controller: Arc<PlaybackController>,
    pipeline: Pipeline,
    gateway: Arc<dyn VoiceGateway>,
}

impl Player {
    pub fn new(config: &PlayerConfig, source: Arc<dyn TrackSource>, gateway: Arc<dyn VoiceGateway>) -> Self {
        let queue = Arc::new(TaskQueue::new(config.queue_capacity));
        let controller = Arc::new(PlaybackController::new());
        let pipeline = Pipeline::new(source, controller.clone(), config);

        Self {
            queue,
            controller,
            pipeline,
            gateway,
        }
    }

    /// Handle for enqueueing tasks and controlling playback
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle::new(self.queue.clone(), self.controller.clone())
    }

    /// Serve the queue until `cancel` fires.
    ///
    /// A connection still open at that point is returned for the caller to
    /// close.
    pub async fn run(&self, cancel: &CancellationToken) -> Option<Session> {
        let mut session: Option<Session> = None;

        loop {
            let task = match self.queue.pop(cancel).await {
                Ok(task) => task,
                Err(_) => {
                    debug!("Player loop cancelled");
                    return session;
                }
            };

            if let Some(open) = session.take() {
                if open.destination == task.destination {
                    session = Some(open);
                } else {
                    open.close().await;
                }
            }

            if session.is_none() {
                match self.gateway.connect(&task.destination).await {
                    Ok(connection) => {
                        session = Some(Session {
                            destination: task.destination.clone(),
                            connection,
                        });
                    }
                    Err(e) => {
                        error!(task = %task.id, destination = %task.destination, "Failed to connect: {}", e);
                        continue;
                    }
                }
            }

            if let Some(open) = session.as_mut() {
                self.play(&task, open.connection.as_mut(), cancel).await;
            }

            if cancel.is_cancelled() {
                return session;
            }

            if self.queue.is_empty() {
                if let Some(open) = session.take() {
                    open.close().await;
                }
            }
        }
    }

    async fn play(&self, task: &Task, connection: &mut dyn VoiceConnection, cancel: &CancellationToken) {
        info!(task = %task.id, media = %task.media, destination = %task.destination, "Playing track");

        match self.pipeline.run(task, connection, cancel).await {
            Ok(TrackOutcome::Completed { frames }) => {
                info!(task = %task.id, frames, "Track finished");
            }
            Ok(TrackOutcome::Skipped { frames }) => {
                info!(task = %task.id, frames, "Track skipped");
            }
            Err(e) if e.is_cancelled() => {
                debug!(task = %task.id, "Track cancelled");
            }
            Err(e) => {
                error!(task = %task.id, media = %task.media, "Track failed: {}", e);
            }
        }
    }
}
