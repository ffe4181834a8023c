//! Pipeline orchestration.
//!
//! One request flows validate → synthesize → transcode → deliver, strictly
//! sequential within the request. The staging claim taken after validation
//! is dropped on every exit path, which is what guarantees cleanup whether
//! the request succeeded or died at any stage.

use crate::error::PipelineError;
use crate::staging::StagingArea;
use crate::synth::SynthesisEngine;
use crate::transcode::Transcoder;
use crate::validate;
use std::future::Future;
use std::path::PathBuf;
use voxbot_types::{MessageRef, Request, RequesterId, VoiceId};

/// Maximum caption length for a delivered voice message, in characters.
pub const MAX_CAPTION_CHARS: usize = 300;

/// Appended to captions cut at the limit.
const TRUNCATION_MARKER: &str = "...";

/// A packaged voice reply ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceMessage {
    pub to: RequesterId,
    /// Transcoded audio file. Only valid until the request resolves.
    pub file: PathBuf,
    /// Original text, truncated to [`MAX_CAPTION_CHARS`].
    pub caption: String,
    pub reply_to: MessageRef,
    /// Payload of the attached "Regenerate" button.
    pub regenerate: VoiceId,
}

/// Outbound side of the chat transport, as the pipeline sees it.
///
/// Send-and-forget with failure reported back synchronously; a failed send
/// surfaces as [`PipelineError::Delivery`].
pub trait ChatTransport: Send + Sync {
    fn send_text(
        &self,
        to: RequesterId,
        reply_to: MessageRef,
        text: &str,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;

    fn send_voice(
        &self,
        message: &VoiceMessage,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;
}

/// Truncates caption text to [`MAX_CAPTION_CHARS`] characters, appending a
/// marker when something was cut.
pub fn truncate_caption(text: &str) -> String {
    let mut chars = text.char_indices();
    match chars.nth(MAX_CAPTION_CHARS) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
    }
}

/// The audio-generation pipeline.
///
/// Holds the synthesis engine, the transcoder, and the staging area; one
/// instance serves all concurrent requests.
#[derive(Debug, Clone)]
pub struct Pipeline<E> {
    engine: E,
    transcoder: Transcoder,
    staging: StagingArea,
}

impl<E: SynthesisEngine> Pipeline<E> {
    pub fn new(engine: E, transcoder: Transcoder, staging: StagingArea) -> Self {
        Self {
            engine,
            transcoder,
            staging,
        }
    }

    /// Runs one request through the full pipeline.
    ///
    /// Every failure is terminal for the request; the caller matches on the
    /// returned variant to decide what the requester is told. Transient
    /// files are cleared before this returns, on all paths.
    pub async fn run<T: ChatTransport>(
        &self,
        request: &Request,
        transport: &T,
    ) -> Result<(), PipelineError> {
        validate::validate_text(&request.text).map_err(PipelineError::Invalid)?;
        self.generate(request, transport).await
    }

    /// Re-runs a delivered request, entering at the synthesis stage.
    ///
    /// The replayed text is the delivered caption, which already passed
    /// validation on first submission. Truncation at the caption limit can
    /// cut inside a `[...]` marker, so the caption is not validated again.
    pub async fn regenerate<T: ChatTransport>(
        &self,
        request: &Request,
        transport: &T,
    ) -> Result<(), PipelineError> {
        self.generate(request, transport).await
    }

    async fn generate<T: ChatTransport>(
        &self,
        request: &Request,
        transport: &T,
    ) -> Result<(), PipelineError> {
        let claim = self.staging.claim(request.requester)?;
        let raw = claim.raw_path();

        if let Err(e) = self
            .engine
            .synthesize(&raw, &request.text, &request.voice)
            .await
        {
            tracing::warn!(
                requester = %request.requester,
                text = %request.text,
                "audio generation failed: {}",
                e
            );
            return Err(e);
        }

        let voice_file = self.transcoder.to_voice(&raw).await?;

        let message = VoiceMessage {
            to: request.requester,
            file: voice_file,
            caption: truncate_caption(&request.text),
            reply_to: request.reply_to,
            regenerate: request.voice.clone(),
        };
        transport.send_voice(&message).await?;

        tracing::info!(
            requester = %request.requester,
            voice = %request.voice,
            "audio generation done"
        );
        Ok(())
        // `claim` drops here and on every early return above, clearing the
        // request's staging subdirectory.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_caption_is_verbatim() {
        assert_eq!(truncate_caption("Hello [laughs] world"), "Hello [laughs] world");
    }

    #[test]
    fn caption_at_limit_is_verbatim() {
        let text = "a".repeat(MAX_CAPTION_CHARS);
        assert_eq!(truncate_caption(&text), text);
    }

    #[test]
    fn long_caption_is_cut_with_marker() {
        let text = "a".repeat(MAX_CAPTION_CHARS + 50);
        let caption = truncate_caption(&text);
        assert_eq!(caption.len(), MAX_CAPTION_CHARS + TRUNCATION_MARKER.len());
        assert!(caption.ends_with("..."));
        assert!(caption.starts_with(&"a".repeat(MAX_CAPTION_CHARS)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "ё".repeat(MAX_CAPTION_CHARS + 1);
        let caption = truncate_caption(&text);
        assert_eq!(caption.chars().count(), MAX_CAPTION_CHARS + TRUNCATION_MARKER.len());
    }
}
