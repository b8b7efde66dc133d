// Public API for the VoiceText player library

pub mod config;
pub mod errors;
pub mod playback;
pub mod stream_input;
pub mod trace;
pub mod tts;

// Re-export commonly used types
pub use errors::{Result, VoiceTextError};
pub use playback::{AudioOutput, PlaybackOutcome, PlaybackSink, RodioOutput};
pub use tts::{
    settings::{SettingChanged, VoiceSettings},
    speaker::{Emotion, Speaker},
    voicetext::{HttpTransport, PlaybackHandle, SpeechTransport, VoiceText},
    wav_header::{AudioFormat, SampleType, WavHeader},
};
