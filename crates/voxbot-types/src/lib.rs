//! Shared types and constants for the voxbot pipeline.
//!
//! This crate provides the foundational types used across the workspace:
//! requester identity, message references, voice identifiers, and the
//! inbound/outbound chat message shapes exchanged with the transport.
//!
//! No crate in the workspace depends on anything *except* `voxbot-types`
//! for cross-cutting type definitions. This keeps the dependency graph
//! clean and prevents circular dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod chat;

pub use chat::{AudioAttachment, CallbackQuery, ChatUpdate, IncomingMessage, Requester};

/// Identity of a chat requester.
///
/// Opaque to the pipeline; also used as the chat destination for replies
/// and as a filesystem-safe namespace component (it renders as a plain
/// integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub i64);

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reference to a chat message, used for reply threading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(pub i64);

/// Opaque identifier selecting a synthesis voice/model.
///
/// Supplied by the requester with the generation command, or carried
/// forward from a delivered message's regenerate button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(pub String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An audio-generation request.
///
/// Built once from a chat command or a regenerate callback, immutable
/// afterwards, and dropped when the pipeline resolves. Nothing about a
/// request is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Who asked.
    pub requester: RequesterId,
    /// Raw text to synthesize (may contain `[emotion]` markers).
    pub text: String,
    /// Voice to synthesize with.
    pub voice: VoiceId,
    /// Message the reply should thread under.
    pub reply_to: MessageRef,
}
