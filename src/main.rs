use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn, Level};
use voicetext_player::{
    config::Config, errors::constants::DEFAULT_CONFIG_PATH, trace::init_tracing_subscriber,
    Emotion, HttpTransport, PlaybackHandle, RodioOutput, Speaker, VoiceSettings, VoiceText,
};

/// Speak text through the VoiceText Web API.
///
/// Without TEXT, every line read from stdin is spoken, replacing the
/// line currently playing.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file; environment variables are used when it does not exist
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, env = "VOICETEXT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// show, haruka, hikari or takeru
    #[arg(short, long)]
    speaker: Option<Speaker>,

    /// none, happiness, anger or sadness
    #[arg(short, long)]
    emotion: Option<Emotion>,

    /// 1 or 2
    #[arg(long, allow_negative_numbers = true)]
    emotion_level: Option<i32>,

    /// 50 to 200
    #[arg(long, allow_negative_numbers = true)]
    pitch: Option<i32>,

    /// 50 to 400
    #[arg(long, allow_negative_numbers = true)]
    speed: Option<i32>,

    /// 50 to 200
    #[arg(long, allow_negative_numbers = true)]
    volume: Option<i32>,

    #[arg(short, long)]
    verbose: bool,

    text: Option<String>,
}

impl Cli {
    fn apply(&self, settings: &mut VoiceSettings) {
        if let Some(api_key) = &self.api_key {
            settings.set_api_key(api_key.as_bytes());
        }
        if let Some(speaker) = self.speaker {
            settings.set_speaker(speaker);
        }
        if let Some(emotion) = self.emotion {
            settings.set_emotion(emotion);
        }
        if let Some(emotion_level) = self.emotion_level {
            settings.set_emotion_level(emotion_level);
        }
        if let Some(pitch) = self.pitch {
            settings.set_pitch(pitch);
        }
        if let Some(speed) = self.speed {
            settings.set_speed(speed);
        }
        if let Some(volume) = self.volume {
            settings.set_volume(volume);
        }
    }
}

fn log_changes(settings: &mut VoiceSettings) {
    for change in settings.take_changes() {
        debug!(?change, "Setting changed");
    }
}

fn http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

async fn speak_lines(voice_text: &mut VoiceText) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current: Option<PlaybackHandle> = None;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        voice_text.settings_mut().set_text(text);
        log_changes(voice_text.settings_mut());
        match voice_text.play() {
            Ok(handle) => current = Some(handle),
            Err(e) => warn!(error = %e, "Cannot play line"),
        }
    }

    if let Some(handle) = current {
        handle.finished().await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Cannot load config from {}", cli.config.display()))?;

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let _guard = init_tracing_subscriber(config.otel_http_url.as_deref(), level)?;

    let (_stream, output) = RodioOutput::open_default()?;
    let transport = HttpTransport::new(http_client(&config)?, config.endpoint.clone());
    info!(endpoint = transport.endpoint(), "VoiceText client ready");

    let mut voice_text = VoiceText::with_settings(
        config.voice_settings(),
        Arc::new(transport),
        Arc::new(output),
    );
    cli.apply(voice_text.settings_mut());
    log_changes(voice_text.settings_mut());

    match &cli.text {
        Some(text) => {
            voice_text.settings_mut().set_text(text.as_str());
            log_changes(voice_text.settings_mut());
            let outcome = voice_text.play()?.finished().await?;
            debug!(?outcome, "Done");
        }
        None => speak_lines(&mut voice_text).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_are_clamped() {
        let cli = Cli::parse_from([
            "voicetext-player",
            "--speaker",
            "hikari",
            "--emotion",
            "anger",
            "--pitch",
            "-10",
            "--speed",
            "1000",
            "hello",
        ]);
        let mut settings = VoiceSettings::new();
        cli.apply(&mut settings);

        assert_eq!(cli.text.as_deref(), Some("hello"));
        assert_eq!(settings.speaker(), Speaker::Hikari);
        assert_eq!(settings.emotion(), Emotion::Anger);
        assert_eq!(settings.pitch(), 50);
        assert_eq!(settings.speed(), 400);
        assert_eq!(settings.volume(), 100);
    }

    #[test]
    fn test_cli_rejects_unknown_speaker() {
        assert!(Cli::try_parse_from(["voicetext-player", "--speaker", "alice"]).is_err());
    }
}
