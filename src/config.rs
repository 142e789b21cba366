//! Application configuration
//!
//! Loaded from TOML. Every section has defaults so an empty file (or no
//! file at all) yields a working setup.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::*;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub player: PlayerConfig,
    pub source: SourceConfig,
    pub sink: SinkConfig,
    pub ui: UiConfig,
}

/// Queue and pipeline buffering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub queue_capacity: usize,
    /// Frames buffered between the demux and sender stages
    pub frame_buffer: usize,
    /// Bytes buffered in the pipe between producer and demux
    pub pipe_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            frame_buffer: DEFAULT_FRAME_BUFFER,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }
}

/// External process turning a media reference into an Ogg/Opus stream on stdout.
///
/// `{url}` may be a page URL (anything yt-dlp understands) or a direct media URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub program: String,
    /// Arguments; `{url}` is replaced by the task's media reference
    pub args: Vec<String>,
    pub kill_on_cancel: bool,
}

/// Resolves a page URL to its best audio stream with yt-dlp, then
/// transcodes that stream to Ogg/Opus with ffmpeg. The media reference
/// arrives as `$1` and is never spliced into the script text.
const RESOLVE_AND_TRANSCODE: &str = r#"set -e
media=$(yt-dlp --quiet --no-warnings --no-cache-dir --no-playlist -f 'ba/ba*' -S aext:opus -g -- "$1")
exec ffmpeg -loglevel error -nostdin -i "$media" -vn -map 0:a:0 -c:a libopus -b:a 96k -ar 48000 -ac 2 -frame_duration 20 -f ogg pipe:1"#;

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            program: "sh".into(),
            args: vec!["-c".into(), RESOLVE_AND_TRANSCODE.into(), "voice-streamer".into(), "{url}".into()],
            kill_on_cancel: true,
        }
    }
}

/// UDP voice transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub target: SocketAddr,
    /// Pacing interval between frames
    pub frame_duration_ms: u64,
}

impl SinkConfig {
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_duration_ms)
    }

    /// RTP-style timestamp increment per frame at 48 kHz
    pub fn samples_per_frame(&self) -> u32 {
        (OPUS_SAMPLE_RATE as u64 * self.frame_duration_ms / 1000) as u32
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([127, 0, 0, 1], DEFAULT_SINK_PORT)),
            frame_duration_ms: DEFAULT_FRAME_DURATION_MS,
        }
    }
}

/// HTTP control surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub bind_address: String,
    pub http_port: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".into(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the per-user config file, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        match candidate {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
                Self::from_toml(&text)
            }
            None => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `config.toml` in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "voice-streamer").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.player.queue_capacity == 0 {
            return Err(Error::Config("player.queue_capacity must be at least 1".into()));
        }
        if self.player.frame_buffer == 0 {
            return Err(Error::Config("player.frame_buffer must be at least 1".into()));
        }
        if self.player.pipe_capacity == 0 {
            return Err(Error::Config("player.pipe_capacity must be at least 1".into()));
        }
        if self.source.program.is_empty() {
            return Err(Error::Config("source.program must not be empty".into()));
        }
        if self.sink.frame_duration_ms == 0 {
            return Err(Error::Config("sink.frame_duration_ms must be at least 1".into()));
        }
        Ok(())
    }
}
