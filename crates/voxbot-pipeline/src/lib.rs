//! Audio-generation request pipeline.
//!
//! Takes a validated text request, invokes the external speech-synthesis
//! engine, transcodes the raw output into a deliverable voice codec, and
//! hands the result to the chat transport with a regenerate affordance.
//! Transient files live in a per-request staging claim whose cleanup is
//! guaranteed on every exit path: success, synthesis failure, transcoding
//! failure, delivery failure.
//!
//! The synthesis engine and the chat transport are external collaborators
//! behind the [`SynthesisEngine`] and [`ChatTransport`] traits; everything
//! else in this crate is the pipeline itself.

pub mod error;
pub mod pipeline;
pub mod staging;
pub mod synth;
pub mod transcode;
pub mod validate;

pub use error::PipelineError;
pub use pipeline::{truncate_caption, ChatTransport, Pipeline, VoiceMessage, MAX_CAPTION_CHARS};
pub use staging::{StagingArea, StagingClaim};
pub use synth::{ProcessEngine, SynthesisEngine};
pub use transcode::Transcoder;
pub use validate::{validate_text, ValidationFailure};
