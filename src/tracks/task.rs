//! Playback request handed from the command layer to the player

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique task identifier
pub type TaskId = Uuid;

/// Opaque reference understood by the byte producer (usually a URL)
pub type MediaRef = String;

/// Logical voice room and channel a task is streamed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub room: String,
    pub channel: String,
}

impl Destination {
    pub fn new(room: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            channel: channel.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.room, self.channel)
    }
}

/// A media item that has not been downloaded yet, plus where to play it
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub media: MediaRef,
    pub destination: Destination,
    pub enqueued_at: DateTime<Utc>,
}

impl Task {
    pub fn new(destination: Destination, media: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            media: media.into(),
            destination,
            enqueued_at: Utc::now(),
        }
    }
}
