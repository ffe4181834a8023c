//! voxbot server library: webhook ingress, access guard, localized
//! replies, and the outbound chat API client wired around the
//! audio-generation pipeline.

pub mod config;
pub mod guard;
pub mod handlers;
pub mod locale;
pub mod transport;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use voxbot_pipeline::{Pipeline, ProcessEngine, StagingArea, Transcoder};

/// Application state shared across all update handlers.
pub struct AppState {
    /// Startup configuration, passed by handle — no ambient global.
    pub config: config::Config,
    /// Requester allow-list.
    pub access: guard::AccessPolicy,
    /// The audio-generation pipeline.
    pub pipeline: Pipeline<ProcessEngine>,
    /// Transcoder handle for voice-sample ingestion (the pipeline owns its
    /// own copy for the delivery path).
    pub transcoder: Transcoder,
    /// Outbound chat API client.
    pub transport: transport::BotApi,
}

impl AppState {
    /// Wires the pipeline and transport from configuration.
    pub fn from_config(config: config::Config) -> Self {
        let timeout = Duration::from_secs(config.synth.timeout_secs);
        let engine = ProcessEngine::new(&config.synth.engine_path, timeout);
        let transcoder = Transcoder::new(
            &config.synth.ffmpeg_path,
            voxbot_pipeline::transcode::DEFAULT_TRANSCODE_TIMEOUT,
        );
        let staging = StagingArea::new(config.storage.staging_dir());
        let pipeline = Pipeline::new(engine, transcoder.clone(), staging);
        let access = guard::AccessPolicy::new(config.bot.allowed_requesters.iter().copied());
        let transport = transport::BotApi::new(&config.bot.api_url, &config.bot.token);

        Self {
            config,
            access,
            pipeline,
            transcoder,
            transport,
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(handlers::webhook_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
