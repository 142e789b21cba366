//! Playback control shared between command callers and the sender stage

pub mod controller;

pub use controller::{PlaybackController, PlaybackState};
