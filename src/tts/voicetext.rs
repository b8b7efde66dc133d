use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    errors::{constants::DEFAULT_ENDPOINT, Result, VoiceTextError},
    playback::{stream_to_sink, AudioOutput, PlaybackOutcome},
    stream_input::{AudioByteStream, WavStream},
    tts::{request::TtsRequest, settings::VoiceSettings},
};

/// Sends one synthesis request and yields the response body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechTransport: Send + Sync {
    async fn synthesize(&self, request: TtsRequest) -> Result<AudioByteStream>;
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
}

/// `message` from the API's JSON error body, or the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Client::new(), DEFAULT_ENDPOINT)
    }
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpeechTransport for HttpTransport {
    #[tracing::instrument(skip(self))]
    async fn synthesize(&self, request: TtsRequest) -> Result<AudioByteStream> {
        let request = request.build(&self.client, &self.endpoint)?;
        let response = self.client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceTextError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(response
            .bytes_stream()
            .map_err(VoiceTextError::from)
            .boxed())
    }
}

/// A spawned playback session. Cancel it through [`VoiceText::stop`].
pub struct PlaybackHandle {
    id: Uuid,
    task: JoinHandle<Result<PlaybackOutcome>>,
}

impl PlaybackHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end.
    pub async fn finished(self) -> Result<PlaybackOutcome> {
        self.task
            .await
            .map_err(|e| VoiceTextError::task(e.to_string()))?
    }
}

struct PlaybackSession {
    id: Uuid,
    transport: Arc<dyn SpeechTransport>,
    output: Arc<dyn AudioOutput>,
    cancel: CancellationToken,
}

impl PlaybackSession {
    #[tracing::instrument(skip_all, fields(session = %self.id))]
    async fn run(self, request: TtsRequest) -> Result<PlaybackOutcome> {
        let result = self.stream(request).await;
        match &result {
            Ok(PlaybackOutcome::Completed {
                pcm_bytes,
                underruns,
            }) => info!(pcm_bytes, underruns, "Playback completed"),
            Ok(PlaybackOutcome::Cancelled) => info!("Playback replaced or stopped"),
            Err(e) => error!(error = %e, "Playback failed"),
        }
        result
    }

    async fn stream(&self, request: TtsRequest) -> Result<PlaybackOutcome> {
        let body = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(PlaybackOutcome::Cancelled),
            body = self.transport.synthesize(request) => body?,
        };

        let (header, pcm) = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(PlaybackOutcome::Cancelled),
            parsed = WavStream::new(body).parse_header() => parsed?,
        };

        let format = header.to_audio_format()?;
        let sink = self.output.open(&format)?;

        stream_to_sink(sink, pcm, &self.cancel).await
    }
}

/// VoiceText Web API client: voice settings plus at most one playback in flight.
///
/// Example:
/// ```no_run
/// # use std::sync::Arc;
/// # use voicetext_player::{HttpTransport, RodioOutput, VoiceText};
/// # #[tokio::main]
/// # async fn main() -> voicetext_player::Result<()> {
/// let (_stream, output) = RodioOutput::open_default()?;
/// let mut voice_text = VoiceText::new(Arc::new(HttpTransport::default()), Arc::new(output));
/// voice_text.settings_mut().set_api_key("...");
/// voice_text.settings_mut().set_text("コンパイルが終わりました");
/// voice_text.play()?.finished().await?;
/// # Ok(())
/// # }
/// ```
pub struct VoiceText {
    settings: VoiceSettings,
    transport: Arc<dyn SpeechTransport>,
    output: Arc<dyn AudioOutput>,
    current: Option<CancellationToken>,
}

impl VoiceText {
    pub fn new(transport: Arc<dyn SpeechTransport>, output: Arc<dyn AudioOutput>) -> Self {
        Self::with_settings(VoiceSettings::default(), transport, output)
    }

    pub fn with_settings(
        settings: VoiceSettings,
        transport: Arc<dyn SpeechTransport>,
        output: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            settings,
            transport,
            output,
            current: None,
        }
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut VoiceSettings {
        &mut self.settings
    }

    /// Synthesize the current text and play it.
    ///
    /// A playback still in flight is cancelled first. Fails with
    /// [`VoiceTextError::Task`] outside a tokio runtime.
    pub fn play(&mut self) -> Result<PlaybackHandle> {
        let request = TtsRequest::from_settings(&self.settings).inspect_err(|e| {
            warn!(error = %e, "Not playing");
        })?;
        let runtime = Handle::try_current().map_err(|e| VoiceTextError::task(e.to_string()))?;

        self.stop();

        let session = PlaybackSession {
            id: Uuid::new_v4(),
            transport: self.transport.clone(),
            output: self.output.clone(),
            cancel: CancellationToken::new(),
        };
        let id = session.id;
        let cancel = session.cancel.clone();
        info!(session = %id, speaker = %self.settings.speaker(), "Starting playback");

        self.current = Some(cancel);
        let task = runtime.spawn(session.run(request));

        Ok(PlaybackHandle { id, task })
    }

    /// Cancel the playback in flight, if any.
    pub fn stop(&mut self) {
        if let Some(previous) = self.current.take() {
            if !previous.is_cancelled() {
                info!("Cancelling previous playback");
                previous.cancel();
            }
        }
    }
}

impl Drop for VoiceText {
    fn drop(&mut self) {
        self.stop();
    }
}
