//! Webhook update handling.
//!
//! Every inbound update is acknowledged immediately and processed on its
//! own task, so a long synthesis run never blocks other requesters. The
//! access guard runs first, then the update is routed to a command, a
//! regenerate callback, or voice-sample ingestion.

use crate::guard::Access;
use crate::locale;
use crate::AppState;
use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use std::sync::Arc;
use voxbot_pipeline::{ChatTransport, PipelineError, ValidationFailure};
use voxbot_types::{
    AudioAttachment, CallbackQuery, ChatUpdate, IncomingMessage, MessageRef, Request, RequesterId,
    VoiceId,
};

/// Webhook ingress. Acknowledges the update and hands it to a dedicated
/// task; the transport retries delivery on non-2xx, so the ack must not
/// wait for synthesis.
pub async fn webhook_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(update): Json<ChatUpdate>,
) -> StatusCode {
    tokio::spawn(handle_update(state, update));
    StatusCode::OK
}

async fn handle_update(state: Arc<AppState>, update: ChatUpdate) {
    if let Some(message) = update.message {
        handle_message(state, message).await;
    } else if let Some(callback) = update.callback {
        handle_callback(state, callback).await;
    } else {
        tracing::debug!(update_id = update.update_id, "update carries no payload, ignored");
    }
}

/// A recognized chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Say { voice: VoiceId, text: String },
    /// A generation command with missing arguments.
    Invalid,
}

/// Parses a message text into a command. Returns `None` for anything that
/// is not addressed to the bot.
pub fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.splitn(3, ' ');
    match parts.next()? {
        "/start" => Some(Command::Start),
        "/help" => Some(Command::Help),
        "/say" => match parts.next() {
            Some(voice) if !voice.is_empty() => Some(Command::Say {
                voice: VoiceId::new(voice),
                text: parts.next().unwrap_or_default().to_string(),
            }),
            _ => Some(Command::Invalid),
        },
        _ => None,
    }
}

async fn handle_message(state: Arc<AppState>, message: IncomingMessage) {
    let requester = message.from.id;
    let lang = message.from.lang.clone();
    let lang = lang.as_deref();
    let reply_to = message.reply_ref();

    if state.access.check(requester) == Access::Denied {
        tracing::debug!(requester = %requester, name = %message.from.name, "unauthorized request");
        notify(&state, requester, reply_to, locale::access_denied(lang)).await;
        return;
    }

    if let Some(audio) = &message.audio {
        ingest_voice_sample(&state, &message, audio, lang).await;
        return;
    }

    let Some(text) = message.text.as_deref() else {
        return;
    };

    match parse_command(text) {
        Some(Command::Start) => {
            tracing::debug!(requester = %requester, "started");
            notify(
                &state,
                requester,
                reply_to,
                &format!("Hi, {}!", message.from.name),
            )
            .await;
        }
        Some(Command::Help) => {
            notify(&state, requester, reply_to, locale::help_text(lang)).await;
        }
        Some(Command::Say { voice, text }) => {
            tracing::info!(
                requester = %requester,
                name = %message.from.name,
                query = %text,
                "audio generation called"
            );
            let request = Request {
                requester,
                text,
                voice,
                reply_to,
            };
            run_generation(&state, &request, lang).await;
        }
        Some(Command::Invalid) => {
            notify(&state, requester, reply_to, locale::invalid_arguments(lang)).await;
        }
        None => {}
    }
}

async fn handle_callback(state: Arc<AppState>, callback: CallbackQuery) {
    let requester = callback.from.id;
    let lang = callback.from.lang.clone();
    let lang = lang.as_deref();
    let reply_to = callback.message.reply_ref();

    if state.access.check(requester) == Access::Denied {
        tracing::debug!(requester = %requester, "unauthorized regenerate");
        notify(&state, requester, reply_to, locale::access_denied(lang)).await;
        return;
    }

    if let Err(e) = state.transport.answer_callback(&callback.id).await {
        tracing::warn!(requester = %requester, "failed to answer callback: {}", e);
    }

    // Replay the delivered caption with the voice carried in the button
    // payload. Regeneration re-enters at the synthesis stage, so the
    // empty-caption case has to be screened here.
    let text = callback.message.caption.clone().unwrap_or_default();
    if text.is_empty() {
        notify(
            &state,
            requester,
            reply_to,
            locale::validation_reason(lang, ValidationFailure::EmptyText),
        )
        .await;
        return;
    }
    tracing::info!(requester = %requester, query = %text, "regenerate called");

    let request = Request {
        requester,
        text,
        voice: VoiceId::new(callback.data),
        reply_to,
    };
    let result = state.pipeline.regenerate(&request, &state.transport).await;
    report_failure(&state, &request, lang, result).await;
}

/// Runs one fresh request through the pipeline and reports any failure.
async fn run_generation(state: &AppState, request: &Request, lang: Option<&str>) {
    let result = state.pipeline.run(request, &state.transport).await;
    report_failure(state, request, lang, result).await;
}

async fn report_failure(
    state: &AppState,
    request: &Request,
    lang: Option<&str>,
    result: Result<(), PipelineError>,
) {
    let Err(error) = result else { return };
    match &error {
        PipelineError::Invalid(_) => {}
        PipelineError::Synthesis(_) => {
            // Already logged with requester and text by the pipeline.
            tracing::debug!("synthesis failure surfaced: {}", error);
        }
        _ => {
            tracing::warn!(requester = %request.requester, "pipeline failed: {}", error);
        }
    }
    notify(
        state,
        request.requester,
        request.reply_to,
        failure_reply(&error, lang),
    )
    .await;
}

/// Maps each pipeline failure class to what the requester is told.
fn failure_reply(error: &PipelineError, lang: Option<&str>) -> &'static str {
    match error {
        PipelineError::Invalid(reason) => locale::validation_reason(lang, *reason),
        PipelineError::Synthesis(_) => locale::synthesis_failed(lang),
        _ => locale::server_error(lang),
    }
}

/// Stores an uploaded voice sample under the requester's namespace and
/// converts it to raw wav for the engine. The transport-side original is
/// removed by the conversion whatever its outcome.
async fn ingest_voice_sample(
    state: &AppState,
    message: &IncomingMessage,
    audio: &AudioAttachment,
    lang: Option<&str>,
) {
    let requester = message.from.id;
    let reply_to = message.reply_ref();

    let bytes = match state.transport.fetch_file(&audio.file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(requester = %requester, "voice sample fetch failed: {}", e);
            notify(state, requester, reply_to, locale::server_error(lang)).await;
            return;
        }
    };

    let name = sanitize_filename(audio.file_name.as_deref().unwrap_or("sample.ogg"));
    let dir = state.config.storage.voices_dir().join(requester.to_string());
    let stored = dir.join(&name);

    let result = async {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&stored, &bytes).await?;
        Ok::<_, std::io::Error>(())
    }
    .await;
    if let Err(e) = result {
        tracing::warn!(requester = %requester, "voice sample store failed: {}", e);
        notify(state, requester, reply_to, locale::server_error(lang)).await;
        return;
    }

    match state.transcoder.to_raw(&stored).await {
        Ok(wav) => {
            tracing::info!(requester = %requester, path = %wav.display(), "voice sample saved");
            notify(state, requester, reply_to, locale::sample_saved(lang)).await;
        }
        Err(e) => {
            tracing::warn!(requester = %requester, "voice sample conversion failed: {}", e);
            notify(state, requester, reply_to, locale::server_error(lang)).await;
        }
    }
}

/// Sends a text reply; a failed notification is logged and dropped, it
/// must never take the handler down.
async fn notify(state: &AppState, to: RequesterId, reply_to: MessageRef, text: &str) {
    if let Err(e) = state.transport.send_text(to, reply_to, text).await {
        tracing::warn!(requester = %to, "failed to notify requester: {}", e);
    }
}

/// Reduces an uploaded file name to a safe ASCII subset, mirroring what
/// the voices directory expects. Never returns an empty name.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "sample.ogg".to_string()
    } else {
        cleaned
    }
}
