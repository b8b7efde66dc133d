use std::{env, path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    errors::{constants::*, Result},
    tts::{
        settings::VoiceSettings,
        speaker::{Emotion, Speaker},
    },
};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub otel_http_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    pub speaker: Speaker,
    pub emotion: Emotion,
    pub emotion_level: i32,
    pub pitch: i32,
    pub speed: i32,
    pub volume: i32,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            speaker: Speaker::Show,
            emotion: Emotion::None,
            emotion_level: DEFAULT_EMOTION_LEVEL,
            pitch: DEFAULT_PITCH,
            speed: DEFAULT_SPEED,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            otel_http_url: None,
            request_timeout_secs: None,
            voice: VoiceConfig::default(),
        }
    }
}

impl Config {
    /// Load `path` if it exists, otherwise build the config from the environment.
    /// `VOICETEXT_API_KEY` fills in a key missing from the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!(path = %path.display(), "Loading config file");
            toml::from_str::<Config>(&std::fs::read_to_string(path)?)?
        } else {
            Self::from_env()
        };

        if config.api_key.is_none() {
            config.api_key = env::var(ENV_API_KEY).ok();
        }

        Ok(config)
    }

    pub fn from_env() -> Self {
        Self {
            api_key: env::var(ENV_API_KEY).ok(),
            endpoint: env::var(ENV_ENDPOINT).unwrap_or_else(|_| default_endpoint()),
            otel_http_url: env::var(ENV_OTEL_HTTP_URL).ok(),
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Settings seeded from this config. Out-of-range values are clamped.
    pub fn voice_settings(&self) -> VoiceSettings {
        let mut settings = VoiceSettings::new();
        if let Some(api_key) = &self.api_key {
            settings.set_api_key(api_key.as_bytes());
        }
        settings.set_speaker(self.voice.speaker);
        settings.set_emotion(self.voice.emotion);
        settings.set_emotion_level(self.voice.emotion_level);
        settings.set_pitch(self.voice.pitch);
        settings.set_speed(self.voice.speed);
        settings.set_volume(self.voice.volume);
        settings.take_changes();
        settings
    }
}
