//! Player: queue consumption, connection lifetime and per-track pipelines

pub mod handle;
pub mod pipeline;
pub mod runner;
pub mod sink;

pub use handle::{PlayerHandle, PlayerStatus};
pub use pipeline::{Pipeline, TrackOutcome};
pub use runner::{Player, Session};
pub use sink::{VoiceConnection, VoiceGateway};
