use crate::validate::ValidationFailure;
use thiserror::Error;

/// Error taxonomy of the request pipeline.
///
/// Every variant is terminal for its request: the caller matches on the
/// variant to decide what (if anything) the requester is told, and the
/// staging claim guard clears transient files regardless of which variant
/// was hit. No error escapes the pipeline boundary.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid request text: {0}")]
    Invalid(ValidationFailure),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("transcoding error: {0}")]
    Transcode(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),
}
