//! Outbound chat API client.
//!
//! Implements the delivery side of the pipeline's [`ChatTransport`] port
//! over the bot HTTP API: JSON posts for text replies and callback
//! acknowledgments, a multipart upload for voice files. The pipeline only
//! sees `PipelineError::Delivery`; richer error detail stays in the logs.

use serde_json::json;
use thiserror::Error;
use voxbot_pipeline::{ChatTransport, PipelineError, VoiceMessage};
use voxbot_types::{MessageRef, RequesterId};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API rejected request: {0}")]
    Rejected(String),
}

/// HTTP client for the chat bot API.
#[derive(Debug, Clone)]
pub struct BotApi {
    http: reqwest::Client,
    base: String,
}

impl BotApi {
    /// `api_url` is the API host (e.g. `https://api.telegram.org`); the
    /// token is baked into the per-bot base path.
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    async fn post_json(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<(), TransportError> {
        let response = self.http.post(self.url(method)).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected(format!(
                "{method}: {status}: {detail}"
            )));
        }
        Ok(())
    }

    /// Acknowledges a callback query so the client stops its spinner.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.post_json(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_id }),
        )
        .await
    }

    /// Fetches the content of a transport-hosted file (voice-sample upload).
    pub async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .http
            .get(format!("{}/files/{file_id}", self.base))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TransportError::Rejected(format!(
                "files/{file_id}: {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl ChatTransport for BotApi {
    async fn send_text(
        &self,
        to: RequesterId,
        reply_to: MessageRef,
        text: &str,
    ) -> Result<(), PipelineError> {
        self.post_json(
            "sendMessage",
            json!({
                "chat_id": to.0,
                "reply_to_message_id": reply_to.0,
                "text": text,
            }),
        )
        .await
        .map_err(|e| PipelineError::Delivery(e.to_string()))
    }

    async fn send_voice(&self, message: &VoiceMessage) -> Result<(), PipelineError> {
        let bytes = tokio::fs::read(&message.file)
            .await
            .map_err(|e| PipelineError::Delivery(format!("failed to read voice file: {e}")))?;

        let file_name = message
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "voice.ogg".to_string());
        let keyboard = json!({
            "inline_keyboard": [[
                { "text": "Regenerate", "callback_data": message.regenerate.as_str() }
            ]]
        });

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/ogg")
            .map_err(|e| PipelineError::Delivery(format!("invalid voice part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", message.to.0.to_string())
            .text("caption", message.caption.clone())
            .text("reply_to_message_id", message.reply_to.0.to_string())
            .text("reply_markup", keyboard.to_string())
            .part("voice", part);

        let response = self
            .http
            .post(self.url("sendVoice"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Delivery(format!(
                "sendVoice: {status}: {detail}"
            )));
        }
        Ok(())
    }
}
