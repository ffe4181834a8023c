//! Synthesis engine invocation.
//!
//! The engine is an external collaborator: given a destination path, text,
//! and a voice identifier, it either produces an audio file at the
//! destination or fails. [`ProcessEngine`] runs it as a subprocess with the
//! text on stdin, bounded by a timeout so a wedged engine cannot pin a
//! request forever.

use crate::error::PipelineError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use voxbot_types::VoiceId;

/// Default timeout for one synthesis call. Neural engines are slow on CPU,
/// so this is generous.
pub const DEFAULT_SYNTH_TIMEOUT: Duration = Duration::from_secs(300);

/// External speech-synthesis engine contract.
pub trait SynthesisEngine: Send + Sync {
    /// Renders `text` with `voice` into an audio file at `dest`, or fails.
    fn synthesize(
        &self,
        dest: &Path,
        text: &str,
        voice: &VoiceId,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;
}

/// Subprocess-backed synthesis engine.
///
/// Invoked as `<binary> --voice <id> --out <dest>` with the request text
/// written to stdin.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl ProcessEngine {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

impl SynthesisEngine for ProcessEngine {
    async fn synthesize(
        &self,
        dest: &Path,
        text: &str,
        voice: &VoiceId,
    ) -> Result<(), PipelineError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--voice")
            .arg(voice.as_str())
            .arg("--out")
            .arg(dest)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // A timed-out engine must not keep running into the staging
            // directory after the claim is gone.
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| PipelineError::Synthesis(format!("failed to spawn engine: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::Synthesis("failed to open engine stdin".to_string()))?;
        let text_owned = text.to_string();

        // Write on a separate task to avoid deadlock if the output buffer fills up.
        let write_task = tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                PipelineError::Synthesis(format!(
                    "engine timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| PipelineError::Synthesis(format!("failed to wait for engine: {e}")))?;

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(PipelineError::Synthesis(format!(
                    "failed to write text to engine stdin: {e}"
                )))
            }
            Err(e) => return Err(PipelineError::Synthesis(format!("stdin task failed: {e}"))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Synthesis(format!(
                "engine failed: {}",
                stderr.trim()
            )));
        }

        if !dest.exists() {
            return Err(PipelineError::Synthesis(
                "engine exited successfully but produced no output file".to_string(),
            ));
        }

        Ok(())
    }
}
