//! Inbound chat update shapes.
//!
//! The transport delivers updates to the webhook as JSON; these structs
//! define the subset of the wire format the bot actually consumes. Unknown
//! fields are ignored so transport-side additions never break parsing.

use crate::{MessageRef, RequesterId};
use serde::Deserialize;

/// One inbound update from the chat transport.
///
/// Exactly one of `message` / `callback` is expected to be present; an
/// update carrying neither is ignored by the handler layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback: Option<CallbackQuery>,
}

/// A chat message sent to the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub from: Requester,
    /// Command or free text, absent for media-only messages.
    #[serde(default)]
    pub text: Option<String>,
    /// Caption of a delivered media message. On a regenerate callback this
    /// carries the text the original audio was synthesized from.
    #[serde(default)]
    pub caption: Option<String>,
    /// Audio attachment, present when the requester uploads a voice sample.
    #[serde(default)]
    pub audio: Option<AudioAttachment>,
}

impl IncomingMessage {
    pub fn reply_ref(&self) -> MessageRef {
        MessageRef(self.message_id)
    }
}

/// The requester behind a message or callback.
#[derive(Debug, Clone, Deserialize)]
pub struct Requester {
    pub id: RequesterId,
    #[serde(default)]
    pub name: String,
    /// IETF language code, used for localized replies.
    #[serde(default)]
    pub lang: Option<String>,
}

/// A button press on a previously delivered message.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Requester,
    /// The message the button was attached to.
    pub message: IncomingMessage,
    /// Button payload; for the regenerate button this is the voice id.
    pub data: String,
}

/// An audio file attached to a message.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioAttachment {
    /// Transport-side handle used to fetch the file content.
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}
