//! Pause/resume/skip state machine
//!
//! ```text
//!   Idle ──start_track──▶ Playing ──pause──▶ Paused
//!    ▲                      ▲                  │
//!    │                      └─────resume───────┘
//!    └──────finish_track (from any state)
//! ```
//!
//! Command callers mutate the state through atomics; the sender stage
//! calls [`PlaybackController::check`] once per outgoing frame.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::PlaybackError;

/// Playback state of the current track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PlaybackState {
    Idle = 0,
    Playing = 1,
    Paused = 2,
}

impl PlaybackState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Paused,
            _ => PlaybackState::Idle,
        }
    }
}

/// Saturating single-slot signal: raising it twice before it is taken
/// leaves exactly one pending signal.
#[derive(Debug, Default)]
struct OneShotFlag(AtomicBool);

impl OneShotFlag {
    /// Returns true if the flag was not already raised
    fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    /// Clear the flag, returning whether it was raised
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Playback controller for the single active track
#[derive(Debug)]
pub struct PlaybackController {
    state: AtomicU8,
    skip: OneShotFlag,
    wake: Notify,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(PlaybackState::Idle as u8),
            skip: OneShotFlag::default(),
            wake: Notify::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Enter `Playing` for a new track. A skip left over from the previous
    /// track is discarded.
    pub fn start_track(&self) {
        self.skip.take();
        self.state.store(PlaybackState::Playing as u8, Ordering::Release);
    }

    /// Return to `Idle` from any state
    pub fn finish_track(&self) {
        self.state.store(PlaybackState::Idle as u8, Ordering::Release);
        self.skip.take();
    }

    /// `Playing` -> `Paused`; returns false if nothing changed
    pub fn pause(&self) -> bool {
        let paused = self.transition(PlaybackState::Playing, PlaybackState::Paused);
        if paused {
            debug!("Playback paused");
        }
        paused
    }

    /// `Paused` -> `Playing`, waking at most one blocked [`check`](Self::check)
    pub fn resume(&self) -> bool {
        let resumed = self.transition(PlaybackState::Paused, PlaybackState::Playing);
        if resumed {
            debug!("Playback resumed");
            self.wake.notify_one();
        }
        resumed
    }

    /// Request the in-flight track to stop at its next frame boundary.
    ///
    /// Ignored while idle. Returns false if nothing changed, including when a
    /// skip is already pending.
    pub fn skip(&self) -> bool {
        if self.state() == PlaybackState::Idle {
            return false;
        }
        let raised = self.skip.raise();
        if raised {
            debug!("Skip requested");
            self.wake.notify_one();
        }
        raised
    }

    /// Frame gate, called before each outgoing frame.
    ///
    /// Blocks while not `Playing`. Fails with [`PlaybackError::Skipped`] once
    /// per skip request and with [`PlaybackError::Cancelled`] when `cancel`
    /// fires.
    pub async fn check(&self, cancel: &CancellationToken) -> Result<(), PlaybackError> {
        if cancel.is_cancelled() {
            return Err(PlaybackError::Cancelled);
        }

        loop {
            if self.skip.take() {
                return Err(PlaybackError::Skipped);
            }
            if self.state() == PlaybackState::Playing {
                return Ok(());
            }

            let notified = self.wake.notified();
            tokio::pin!(notified);
            // Register before re-checking so a concurrent resume or skip is not lost.
            notified.as_mut().enable();
            if self.skip.is_raised() || self.state() == PlaybackState::Playing {
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(PlaybackError::Cancelled),
                _ = &mut notified => {}
            }
        }
    }

    fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}
