//! Audio format conversion via an external ffmpeg process.
//!
//! Raw synthesis output (`.wav`) is converted to the compact voice codec
//! the transport delivers (`.ogg`/opus). The reverse direction exists for
//! voice-sample ingestion: an uploaded voice file is converted back to raw
//! PCM wav, and the source is removed on every exit path.

use crate::error::PipelineError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for one conversion.
pub const DEFAULT_TRANSCODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Wrapper around the external audio-conversion process.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl Transcoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }

    /// Converts raw synthesis output into the deliverable voice codec.
    ///
    /// On failure any partially produced output file is removed
    /// (best-effort) before the error is returned.
    pub async fn to_voice(&self, raw: &Path) -> Result<PathBuf, PipelineError> {
        let out = raw.with_extension("ogg");
        match self.run_ffmpeg(raw, &["-c:a", "libopus"], &out).await {
            Ok(()) => Ok(out),
            Err(e) => {
                remove_if_present(&out);
                Err(e)
            }
        }
    }

    /// Converts a delivered-codec voice file back to raw PCM wav.
    ///
    /// The source file is removed whether or not the conversion succeeded;
    /// a failed conversion also removes its partial output and propagates
    /// the error.
    pub async fn to_raw(&self, voice: &Path) -> Result<PathBuf, PipelineError> {
        let out = voice.with_extension("wav");
        let result = self.run_ffmpeg(voice, &["-acodec", "pcm_s16le"], &out).await;
        remove_if_present(voice);
        match result {
            Ok(()) => Ok(out),
            Err(e) => {
                remove_if_present(&out);
                Err(e)
            }
        }
    }

    async fn run_ffmpeg(
        &self,
        input: &Path,
        codec_args: &[&str],
        output: &Path,
    ) -> Result<(), PipelineError> {
        let mut command = Command::new(&self.ffmpeg);
        command.arg("-y").arg("-i").arg(input);
        for arg in codec_args {
            command.arg(arg);
        }
        command
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // Reap a timed-out ffmpeg rather than leaving it writing.
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            PipelineError::Transcode(format!(
                "failed to spawn {}: {e}",
                self.ffmpeg.display()
            ))
        })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                PipelineError::Transcode(format!(
                    "conversion timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| PipelineError::Transcode(format!("failed to wait for ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PipelineError::Transcode(format!(
                "ffmpeg failed: {}",
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(PipelineError::Transcode(
                "ffmpeg exited successfully but produced no output file".to_string(),
            ));
        }

        Ok(())
    }
}

/// Removes a file that may not exist. Never raises.
fn remove_if_present(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "failed to remove temp file: {}", e);
        }
    }
}
