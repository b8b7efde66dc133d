/// Custom error types for the VoiceText player
#[derive(Debug, thiserror::Error)]
pub enum VoiceTextError {
    #[error("API key is empty")]
    MissingCredential,

    #[error("Text is empty")]
    MissingText,

    #[error("Malformed response header: {chunk} error: {}", String::from_utf8_lossy(.found))]
    MalformedResponseHeader { chunk: &'static str, found: [u8; 4] },

    #[error(
        "Response ended before the WAV header was complete ({received} of {} bytes)",
        constants::WAV_HEADER_LEN
    )]
    TruncatedHeader { received: usize },

    #[error("Unsupported sample size: {0} bits")]
    UnsupportedSampleSize(u16),

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("VoiceText API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Audio output error: {0}")]
    AudioOutput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Playback task failed: {0}")]
    Task(String),
}

impl VoiceTextError {
    pub fn malformed_header(chunk: &'static str, found: [u8; 4]) -> Self {
        Self::MalformedResponseHeader { chunk, found }
    }

    pub fn invalid_audio_format(message: impl Into<String>) -> Self {
        Self::InvalidAudioFormat(message.into())
    }

    pub fn audio_output(message: impl Into<String>) -> Self {
        Self::AudioOutput(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VoiceTextError>;

/// Constants used throughout the application
pub mod constants {
    // Configuration constants
    pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
    pub const DEFAULT_ENDPOINT: &str = "https://api.voicetext.jp/v1/tts";

    pub const ENV_API_KEY: &str = "VOICETEXT_API_KEY";
    pub const ENV_ENDPOINT: &str = "VOICETEXT_ENDPOINT";
    pub const ENV_OTEL_HTTP_URL: &str = "VOICETEXT_OTEL_HTTP_URL";

    // Voice parameter bounds
    pub const EMOTION_LEVEL_MIN: i32 = 1;
    pub const EMOTION_LEVEL_MAX: i32 = 2;
    pub const PITCH_MIN: i32 = 50;
    pub const PITCH_MAX: i32 = 200;
    pub const SPEED_MIN: i32 = 50;
    pub const SPEED_MAX: i32 = 400;
    pub const VOLUME_MIN: i32 = 50;
    pub const VOLUME_MAX: i32 = 200;

    // Default values
    pub const DEFAULT_EMOTION_LEVEL: i32 = 1;
    pub const DEFAULT_PITCH: i32 = 100;
    pub const DEFAULT_SPEED: i32 = 100;
    pub const DEFAULT_VOLUME: i32 = 100;

    // WAV constants
    pub const WAV_HEADER_LEN: usize = 44;

    // Playback constants
    pub const DRAIN_POLL_INTERVAL_MS: u64 = 10;
}
