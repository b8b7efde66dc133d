use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::VoiceTextError;

/// Voice persona served by the VoiceText API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    #[default]
    Show,
    Haruka,
    Hikari,
    Takeru,
}

impl Speaker {
    pub const ALL: [Speaker; 4] = [
        Speaker::Show,
        Speaker::Haruka,
        Speaker::Hikari,
        Speaker::Takeru,
    ];

    /// Value sent in the `speaker` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Show => "show",
            Speaker::Haruka => "haruka",
            Speaker::Hikari => "hikari",
            Speaker::Takeru => "takeru",
        }
    }

    /// `show` ignores emotion parameters.
    pub fn supports_emotion(&self) -> bool {
        *self != Speaker::Show
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speaker {
    type Err = VoiceTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Speaker::ALL
            .into_iter()
            .find(|speaker| speaker.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| VoiceTextError::invalid_input(format!("Unknown speaker: {}", s)))
    }
}

/// Expressive tone. Only honored for speakers other than [`Speaker::Show`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    None,
    Happiness,
    Anger,
    Sadness,
}

impl Emotion {
    pub const ALL: [Emotion; 4] = [
        Emotion::None,
        Emotion::Happiness,
        Emotion::Anger,
        Emotion::Sadness,
    ];

    /// Value sent in the `emotion` form field, `None` when the field is omitted.
    pub fn api_value(&self) -> Option<&'static str> {
        match self {
            Emotion::None => None,
            Emotion::Happiness => Some("happiness"),
            Emotion::Anger => Some("anger"),
            Emotion::Sadness => Some("sadness"),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_value().unwrap_or("none"))
    }
}

impl FromStr for Emotion {
    type Err = VoiceTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|emotion| emotion.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| VoiceTextError::invalid_input(format!("Unknown emotion: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_api_values() {
        let values: Vec<_> = Speaker::ALL.iter().map(Speaker::as_str).collect();
        assert_eq!(values, ["show", "haruka", "hikari", "takeru"]);
    }

    #[test]
    fn test_speaker_from_str() {
        assert_eq!("Haruka".parse::<Speaker>().unwrap(), Speaker::Haruka);
        assert_eq!("takeru".parse::<Speaker>().unwrap(), Speaker::Takeru);
        assert!("bob".parse::<Speaker>().is_err());
    }

    #[test]
    fn test_emotion_api_values() {
        assert_eq!(Emotion::None.api_value(), None);
        assert_eq!(Emotion::Happiness.api_value(), Some("happiness"));
        assert_eq!(Emotion::Anger.api_value(), Some("anger"));
        assert_eq!(Emotion::Sadness.api_value(), Some("sadness"));
    }

    #[test]
    fn test_emotion_from_str() {
        assert_eq!("none".parse::<Emotion>().unwrap(), Emotion::None);
        assert_eq!("SADNESS".parse::<Emotion>().unwrap(), Emotion::Sadness);
        assert!("joy".parse::<Emotion>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        #[derive(Deserialize)]
        struct Voice {
            speaker: Speaker,
            emotion: Emotion,
        }

        let voice: Voice = toml::from_str("speaker = \"hikari\"\nemotion = \"anger\"").unwrap();
        assert_eq!(voice.speaker, Speaker::Hikari);
        assert_eq!(voice.emotion, Emotion::Anger);
    }
}
