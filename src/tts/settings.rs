use std::collections::VecDeque;

use crate::{
    errors::constants::*,
    tts::speaker::{Emotion, Speaker},
};

/// Emitted by [`VoiceSettings`] whenever a setter actually changes a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingChanged {
    /// The key itself is never queued.
    ApiKey,
    Text(String),
    Speaker(Speaker),
    Emotion(Emotion),
    EmotionLevel(i32),
    Pitch(i32),
    Speed(i32),
    Volume(i32),
}

/// Text and voice parameters for the next `play()`.
///
/// Numeric setters clamp into the range accepted by the API. Effective
/// changes are queued and drained by the front-end with [`VoiceSettings::take_changes`].
#[derive(Clone)]
pub struct VoiceSettings {
    api_key: Vec<u8>,
    text: String,
    speaker: Speaker,
    emotion: Emotion,
    emotion_level: i32,
    pitch: i32,
    speed: i32,
    volume: i32,
    changes: VecDeque<SettingChanged>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            api_key: Vec::new(),
            text: String::new(),
            speaker: Speaker::Show,
            emotion: Emotion::None,
            emotion_level: DEFAULT_EMOTION_LEVEL,
            pitch: DEFAULT_PITCH,
            speed: DEFAULT_SPEED,
            volume: DEFAULT_VOLUME,
            changes: VecDeque::new(),
        }
    }
}

impl std::fmt::Debug for VoiceSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSettings")
            .field("api_key", &"<redacted>")
            .field("text", &self.text)
            .field("speaker", &self.speaker)
            .field("emotion", &self.emotion)
            .field("emotion_level", &self.emotion_level)
            .field("pitch", &self.pitch)
            .field("speed", &self.speed)
            .field("volume", &self.volume)
            .finish()
    }
}

impl VoiceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(&self) -> &[u8] {
        &self.api_key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn emotion_level(&self) -> i32 {
        self.emotion_level
    }

    pub fn pitch(&self) -> i32 {
        self.pitch
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn set_api_key(&mut self, api_key: impl Into<Vec<u8>>) {
        let api_key = api_key.into();
        if self.api_key == api_key {
            return;
        }
        self.api_key = api_key;
        self.changes.push_back(SettingChanged::ApiKey);
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text == text {
            return;
        }
        self.text = text.clone();
        self.changes.push_back(SettingChanged::Text(text));
    }

    pub fn set_speaker(&mut self, speaker: Speaker) {
        if self.speaker == speaker {
            return;
        }
        self.speaker = speaker;
        self.changes.push_back(SettingChanged::Speaker(speaker));
    }

    pub fn set_emotion(&mut self, emotion: Emotion) {
        if self.emotion == emotion {
            return;
        }
        self.emotion = emotion;
        self.changes.push_back(SettingChanged::Emotion(emotion));
    }

    pub fn set_emotion_level(&mut self, emotion_level: i32) {
        let emotion_level = emotion_level.clamp(EMOTION_LEVEL_MIN, EMOTION_LEVEL_MAX);
        if self.emotion_level == emotion_level {
            return;
        }
        self.emotion_level = emotion_level;
        self.changes
            .push_back(SettingChanged::EmotionLevel(emotion_level));
    }

    pub fn set_pitch(&mut self, pitch: i32) {
        let pitch = pitch.clamp(PITCH_MIN, PITCH_MAX);
        if self.pitch == pitch {
            return;
        }
        self.pitch = pitch;
        self.changes.push_back(SettingChanged::Pitch(pitch));
    }

    pub fn set_speed(&mut self, speed: i32) {
        let speed = speed.clamp(SPEED_MIN, SPEED_MAX);
        if self.speed == speed {
            return;
        }
        self.speed = speed;
        self.changes.push_back(SettingChanged::Speed(speed));
    }

    pub fn set_volume(&mut self, volume: i32) {
        let volume = volume.clamp(VOLUME_MIN, VOLUME_MAX);
        if self.volume == volume {
            return;
        }
        self.volume = volume;
        self.changes.push_back(SettingChanged::Volume(volume));
    }

    /// Drain queued change events in the order they happened.
    pub fn take_changes(&mut self) -> Vec<SettingChanged> {
        self.changes.drain(..).collect()
    }
}
