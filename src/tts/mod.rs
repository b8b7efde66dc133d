pub mod request;
pub mod settings;
pub mod speaker;
pub mod voicetext;
pub mod wav_header;
