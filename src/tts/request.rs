use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Client};

use crate::{
    errors::{Result, VoiceTextError},
    tts::settings::VoiceSettings,
};

/// A validated synthesis request: the Basic credential plus the form fields.
///
/// Example:
/// ```
/// # use voicetext_player::{tts::request::TtsRequest, VoiceSettings};
/// let mut settings = VoiceSettings::new();
/// settings.set_api_key("key");
/// settings.set_text("hello");
///
/// let request = TtsRequest::from_settings(&settings)?;
/// let http = request.build(&reqwest::Client::new(), "https://api.voicetext.jp/v1/tts")?;
/// assert_eq!(http.method(), reqwest::Method::POST);
/// # Ok::<(), voicetext_player::VoiceTextError>(())
/// ```
#[derive(Clone, PartialEq)]
pub struct TtsRequest {
    authorization: String,
    form: Vec<(&'static str, String)>,
}

impl std::fmt::Debug for TtsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsRequest")
            .field("authorization", &"Basic <redacted>")
            .field("form", &self.form)
            .finish()
    }
}

impl TtsRequest {
    /// Fails without touching the network when the key or the text is empty.
    pub fn from_settings(settings: &VoiceSettings) -> Result<Self> {
        if settings.api_key().is_empty() {
            return Err(VoiceTextError::MissingCredential);
        }
        if settings.text().is_empty() {
            return Err(VoiceTextError::MissingText);
        }

        let mut form = vec![
            ("text", settings.text().to_string()),
            ("speaker", settings.speaker().as_str().to_string()),
        ];

        if settings.speaker().supports_emotion() {
            if let Some(emotion) = settings.emotion().api_value() {
                form.push(("emotion", emotion.to_string()));
                form.push(("emotion_level", settings.emotion_level().to_string()));
            }
        }

        form.push(("pitch", settings.pitch().to_string()));
        form.push(("speed", settings.speed().to_string()));
        form.push(("volume", settings.volume().to_string()));

        Ok(Self {
            authorization: format!("Basic {}", STANDARD.encode(settings.api_key())),
            form,
        })
    }

    pub fn form(&self) -> &[(&'static str, String)] {
        &self.form
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    /// POST with `Authorization: Basic` and a URL-encoded form body.
    pub fn build(&self, client: &Client, endpoint: &str) -> Result<reqwest::Request> {
        let request = client
            .post(endpoint)
            .header(header::AUTHORIZATION, &self.authorization)
            .form(&self.form)
            .build()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::speaker::{Emotion, Speaker};

    fn settings(speaker: Speaker, emotion: Emotion) -> VoiceSettings {
        let mut settings = VoiceSettings::new();
        settings.set_api_key("key");
        settings.set_text("hello world");
        settings.set_speaker(speaker);
        settings.set_emotion(emotion);
        settings
    }

    #[test]
    fn test_missing_credential() {
        let mut settings = VoiceSettings::new();
        settings.set_text("hello");
        assert!(matches!(
            TtsRequest::from_settings(&settings),
            Err(VoiceTextError::MissingCredential)
        ));
    }

    #[test]
    fn test_missing_text() {
        let mut settings = VoiceSettings::new();
        settings.set_api_key("key");
        assert!(matches!(
            TtsRequest::from_settings(&settings),
            Err(VoiceTextError::MissingText)
        ));
    }

    #[test]
    fn test_show_never_sends_emotion() {
        for emotion in Emotion::ALL {
            let request = TtsRequest::from_settings(&settings(Speaker::Show, emotion)).unwrap();
            assert_eq!(request.field("emotion"), None);
            assert_eq!(request.field("emotion_level"), None);
        }
    }

    #[test]
    fn test_no_emotion_is_omitted() {
        for speaker in [Speaker::Haruka, Speaker::Hikari, Speaker::Takeru] {
            let request = TtsRequest::from_settings(&settings(speaker, Emotion::None)).unwrap();
            assert_eq!(request.field("emotion"), None);
            assert_eq!(request.field("emotion_level"), None);
        }
    }

    #[test]
    fn test_emotion_fields_in_order() {
        let mut settings = settings(Speaker::Haruka, Emotion::Sadness);
        settings.set_emotion_level(2);
        settings.set_pitch(150);
        settings.set_speed(80);
        settings.set_volume(60);
        let request = TtsRequest::from_settings(&settings).unwrap();

        let keys: Vec<_> = request.form().iter().map(|(key, _)| *key).collect();
        assert_eq!(
            keys,
            ["text", "speaker", "emotion", "emotion_level", "pitch", "speed", "volume"]
        );
        assert_eq!(request.field("speaker"), Some("haruka"));
        assert_eq!(request.field("emotion"), Some("sadness"));
        assert_eq!(request.field("emotion_level"), Some("2"));
        assert_eq!(request.field("pitch"), Some("150"));
        assert_eq!(request.field("speed"), Some("80"));
        assert_eq!(request.field("volume"), Some("60"));
    }

    #[test]
    fn test_build_http_request() {
        let request = TtsRequest::from_settings(&settings(Speaker::Show, Emotion::None)).unwrap();
        let http = request
            .build(&Client::new(), "https://api.voicetext.jp/v1/tts")
            .unwrap();

        assert_eq!(http.method(), reqwest::Method::POST);
        assert_eq!(http.url().as_str(), "https://api.voicetext.jp/v1/tts");
        assert_eq!(
            http.headers()[header::AUTHORIZATION].to_str().unwrap(),
            "Basic a2V5"
        );
        assert_eq!(
            http.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "application/x-www-form-urlencoded"
        );
        let body = http.body().and_then(|body| body.as_bytes()).unwrap();
        assert_eq!(
            std::str::from_utf8(body).unwrap(),
            "text=hello+world&speaker=show&pitch=100&speed=100&volume=100"
        );
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let request = TtsRequest::from_settings(&settings(Speaker::Show, Emotion::None)).unwrap();
        assert!(!format!("{:?}", request).contains("a2V5"));
    }
}
