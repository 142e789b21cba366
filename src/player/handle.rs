//! Command-facing facade over the queue and the playback controller

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::QueueError;
use crate::playback::{PlaybackController, PlaybackState};
use crate::tracks::{Destination, Task, TaskQueue};

/// Cheap to clone; shared by every command caller
#[derive(Clone)]
pub struct PlayerHandle {
    queue: Arc<TaskQueue<Task>>,
    controller: Arc<PlaybackController>,
}

/// Snapshot for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub queued: usize,
    pub capacity: usize,
    pub rejected: usize,
}

impl PlayerHandle {
    pub fn new(queue: Arc<TaskQueue<Task>>, controller: Arc<PlaybackController>) -> Self {
        Self { queue, controller }
    }

    /// Queue `media` for `destination`; fails with [`QueueError::Full`] at capacity
    pub fn enqueue(&self, destination: Destination, media: impl Into<String>) -> Result<Task, QueueError> {
        let task = Task::new(destination, media);
        self.queue.push(task.clone())?;
        info!(task = %task.id, media = %task.media, destination = %task.destination, "Task queued");
        Ok(task)
    }

    /// Drop pending tasks and skip the one playing; returns the number dropped
    pub fn clear_queue(&self) -> usize {
        let dropped = self.queue.clean();
        self.controller.skip();
        info!(dropped, "Queue cleared");
        dropped
    }

    pub fn pause(&self) -> bool {
        self.controller.pause()
    }

    pub fn resume(&self) -> bool {
        self.controller.resume()
    }

    pub fn skip(&self) -> bool {
        self.controller.skip()
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.controller.state(),
            queued: self.queue.len(),
            capacity: self.queue.capacity(),
            rejected: self.queue.rejected_count(),
        }
    }
}
