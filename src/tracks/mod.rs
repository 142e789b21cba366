//! Playback requests and the queue that orders them

pub mod queue;
pub mod task;

pub use queue::TaskQueue;
pub use task::{Destination, MediaRef, Task, TaskId};
