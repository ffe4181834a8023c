//! Bot configuration loading from file and environment variables.
//!
//! The configuration is an explicit struct constructed once at startup and
//! passed by handle into the handlers; nothing reads it ambiently.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Webhook server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat bot API settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Synthesis engine and transcoder settings.
    #[serde(default)]
    pub synth: SynthConfig,

    /// Filesystem layout settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the webhook HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Chat bot API configuration.
#[derive(Clone, Default, Deserialize)]
pub struct BotConfig {
    /// Bot API token.
    #[serde(default)]
    pub token: String,

    /// Base URL of the chat bot API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Requester ids allowed to use the bot. Empty means open access.
    #[serde(default)]
    pub allowed_requesters: Vec<i64>,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("allowed_requesters", &self.allowed_requesters)
            .finish()
    }
}

/// Synthesis engine and audio-conversion settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthConfig {
    /// Path to the synthesis engine binary.
    #[serde(default = "default_engine_path")]
    pub engine_path: String,

    /// Path to the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Timeout for one synthesis call, in seconds.
    #[serde(default = "default_synth_timeout_secs")]
    pub timeout_secs: u64,
}

/// Filesystem layout. Everything lives under one data directory:
/// `outputs/` for staging, `user_voices/` for per-requester samples,
/// `models/` for synthesis models.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl StorageConfig {
    pub fn staging_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("outputs")
    }

    pub fn voices_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("user_voices")
    }

    pub fn models_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("models")
    }

    /// Creates the data directories if absent.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.staging_dir())?;
        std::fs::create_dir_all(self.voices_dir())?;
        std::fs::create_dir_all(self.models_dir())?;
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voxbot_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8080
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_engine_path() -> String {
    "synth-engine".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_synth_timeout_secs() -> u64 {
    300
}

fn default_data_dir() -> String {
    "bot_data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            engine_path: default_engine_path(),
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_synth_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VOXBOT_HOST` overrides `server.host`
/// - `VOXBOT_PORT` overrides `server.port`
/// - `VOXBOT_TOKEN` overrides `bot.token`
/// - `VOXBOT_API_URL` overrides `bot.api_url`
/// - `VOXBOT_ALLOWED` overrides `bot.allowed_requesters` (comma-separated ids)
/// - `VOXBOT_ENGINE_PATH` overrides `synth.engine_path`
/// - `VOXBOT_FFMPEG_PATH` overrides `synth.ffmpeg_path`
/// - `VOXBOT_DATA_DIR` overrides `storage.data_dir`
/// - `VOXBOT_LOG_LEVEL` overrides `logging.level`
/// - `VOXBOT_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("VOXBOT_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("VOXBOT_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(token) = std::env::var("VOXBOT_TOKEN") {
        config.bot.token = token;
    }
    if let Ok(url) = std::env::var("VOXBOT_API_URL") {
        config.bot.api_url = url;
    }
    if let Ok(allowed) = std::env::var("VOXBOT_ALLOWED") {
        config.bot.allowed_requesters = allowed
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect();
    }
    if let Ok(engine) = std::env::var("VOXBOT_ENGINE_PATH") {
        config.synth.engine_path = engine;
    }
    if let Ok(ffmpeg) = std::env::var("VOXBOT_FFMPEG_PATH") {
        config.synth.ffmpeg_path = ffmpeg;
    }
    if let Ok(data_dir) = std::env::var("VOXBOT_DATA_DIR") {
        config.storage.data_dir = data_dir;
    }
    if let Ok(level) = std::env::var("VOXBOT_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("VOXBOT_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
