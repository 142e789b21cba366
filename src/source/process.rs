//! Subprocess producer
//!
//! Runs a configured program (a yt-dlp | ffmpeg script by default) and
//! streams its stdout into the pipe. The media reference replaces `{url}`
//! inside single arguments; it is never joined into a command line.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::source::{PipeWriter, TrackSource};
use crate::tracks::Task;

const URL_PLACEHOLDER: &str = "{url}";

pub struct ProcessSource {
    config: SourceConfig,
}

impl ProcessSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Program arguments with the placeholder substituted
    pub fn args_for(&self, media: &str) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| arg.replace(URL_PLACEHOLDER, media))
            .collect()
    }

    fn command(&self, media: &str) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(self.args_for(media))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(self.config.kill_on_cancel);
        command
    }
}

#[async_trait]
impl TrackSource for ProcessSource {
    async fn produce(
        &self,
        task: &Task,
        output: &mut PipeWriter,
        cancel: &CancellationToken,
    ) -> Result<(), SourceError> {
        let mut child = self
            .command(&task.media)
            .spawn()
            .map_err(|e| SourceError::Spawn(format!("{}: {}", self.config.program, e)))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::Spawn("stdout was not captured".into()))?;

        debug!(task = %task.id, program = %self.config.program, pid = ?child.id(), "Producer started");

        let copied = tokio::select! {
            _ = cancel.cancelled() => None,
            copied = tokio::io::copy(&mut stdout, output) => Some(copied?),
        };
        let Some(copied) = copied else {
            // Closing our end makes a still-writing child fail on its next write.
            drop(stdout);
            if self.config.kill_on_cancel {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill producer: {}", e);
                }
            } else {
                match child.wait().await {
                    Ok(status) => debug!(task = %task.id, %status, "Producer exited after cancel"),
                    Err(e) => warn!("Failed to wait for producer: {}", e),
                }
            }
            return Err(SourceError::Cancelled);
        };

        let status = child.wait().await?;
        if !status.success() {
            return Err(SourceError::Exited(format!("{} exited with {}", self.config.program, status)));
        }

        debug!(task = %task.id, bytes = copied, "Producer finished");
        Ok(())
    }
}
