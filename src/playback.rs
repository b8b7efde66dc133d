use std::time::Duration;

use futures::StreamExt;
use rodio::{buffer::SamplesBuffer, mixer::Mixer, OutputStream, OutputStreamBuilder, Sink};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    errors::{constants::DRAIN_POLL_INTERVAL_MS, Result, VoiceTextError},
    stream_input::PcmStream,
    tts::wav_header::{AudioFormat, SampleType},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Active,
    IdleAtEnd,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    DataQueued,
    Idle { network_finished: bool },
    Stop,
}

impl PlaybackState {
    pub fn next(self, event: SinkEvent) -> Self {
        match (self, event) {
            (PlaybackState::Stopped, _) => PlaybackState::Stopped,
            (_, SinkEvent::Stop) => PlaybackState::Stopped,
            (_, SinkEvent::DataQueued) => PlaybackState::Active,
            (_, SinkEvent::Idle { network_finished: true }) => PlaybackState::IdleAtEnd,
            (PlaybackState::Active, SinkEvent::Idle { network_finished: false }) => {
                PlaybackState::Idle
            }
            (state, _) => state,
        }
    }

    /// The sink drained after the response completed and must be stopped.
    pub fn requires_stop(self) -> bool {
        self == PlaybackState::IdleAtEnd
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// `underruns` counts the times the sink ran dry before the response ended.
    Completed { pcm_bytes: u64, underruns: u32 },
    Cancelled,
}

/// Factory for sinks, one per playback session.
pub trait AudioOutput: Send + Sync {
    fn open(&self, format: &AudioFormat) -> Result<Box<dyn PlaybackSink>>;
}

/// Consumer of raw PCM bytes in the format the sink was opened with.
pub trait PlaybackSink: Send {
    fn append(&mut self, pcm: &[u8]) -> Result<()>;
    fn is_idle(&self) -> bool;
    fn stop(&mut self);
}

/// Converts little-endian PCM bytes into normalized `f32` samples.
///
/// Bytes that do not complete a frame are kept for the next call.
#[derive(Debug)]
pub struct PcmDecoder {
    format: AudioFormat,
    pending: Vec<u8>,
}

impl PcmDecoder {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> Vec<f32> {
        self.pending.extend_from_slice(bytes);

        let sample_len = self.format.bytes_per_sample();
        let frame_len = sample_len * usize::from(self.format.channel_count);
        let usable = self.pending.len() - self.pending.len() % frame_len;

        let samples = self.pending[..usable]
            .chunks_exact(sample_len)
            .map(|sample| match (sample_len, self.format.sample_type) {
                (1, SampleType::UnsignedInt) => (f32::from(sample[0]) - 128.0) / 128.0,
                (1, SampleType::SignedInt) => f32::from(sample[0] as i8) / 128.0,
                (2, _) => f32::from(i16::from_le_bytes([sample[0], sample[1]])) / 32768.0,
                _ => {
                    i32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]]) as f32
                        / 2_147_483_648.0
                }
            })
            .collect();

        self.pending.drain(..usable);
        samples
    }
}

/// Default output device through rodio's mixer.
#[derive(Clone)]
pub struct RodioOutput {
    mixer: Mixer,
}

impl RodioOutput {
    /// Open the default device. The returned stream must outlive every sink.
    pub fn open_default() -> Result<(OutputStream, Self)> {
        let mut stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
            VoiceTextError::audio_output(format!("Failed to open audio output: {}", e))
        })?;
        stream.log_on_drop(false);

        let mixer = stream.mixer().clone();
        Ok((stream, Self { mixer }))
    }
}

impl AudioOutput for RodioOutput {
    fn open(&self, format: &AudioFormat) -> Result<Box<dyn PlaybackSink>> {
        info!(
            sample_rate = format.sample_rate,
            channels = format.channel_count,
            sample_size = format.sample_size,
            sample_type = ?format.sample_type,
            "Opening audio sink"
        );
        Ok(Box::new(RodioSink {
            sink: Sink::connect_new(&self.mixer),
            decoder: PcmDecoder::new(*format),
            format: *format,
        }))
    }
}

pub struct RodioSink {
    sink: Sink,
    decoder: PcmDecoder,
    format: AudioFormat,
}

impl PlaybackSink for RodioSink {
    #[tracing::instrument(level = "trace", name = "append_pcm", skip_all, fields(len = pcm.len()))]
    fn append(&mut self, pcm: &[u8]) -> Result<()> {
        let samples = self.decoder.decode(pcm);
        if samples.is_empty() {
            return Ok(());
        }
        self.sink.append(SamplesBuffer::new(
            self.format.channel_count,
            self.format.sample_rate,
            samples,
        ));
        Ok(())
    }

    fn is_idle(&self) -> bool {
        self.sink.empty()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

/// Feed `pcm` into `sink` until the response ends and the sink drains,
/// or until `cancel` fires. The sink is dropped on return.
pub async fn stream_to_sink(
    mut sink: Box<dyn PlaybackSink>,
    mut pcm: PcmStream,
    cancel: &CancellationToken,
) -> Result<PlaybackOutcome> {
    let mut state = PlaybackState::Idle;
    let mut pcm_bytes = 0u64;
    let mut underruns = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                sink.stop();
                debug!(state = ?state.next(SinkEvent::Stop), "Playback cancelled");
                return Ok(PlaybackOutcome::Cancelled);
            }
            chunk = pcm.next() => match chunk {
                Some(Ok(bytes)) => {
                    if state == PlaybackState::Active && sink.is_idle() {
                        state = state.next(SinkEvent::Idle { network_finished: false });
                        underruns += 1;
                        debug!(underruns, "Audio sink underrun");
                    }
                    sink.append(&bytes)?;
                    pcm_bytes += bytes.len() as u64;
                    state = state.next(SinkEvent::DataQueued);
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Response stream failed, playing buffered audio");
                    break;
                }
                None => break,
            }
        }
    }

    let poll = Duration::from_millis(DRAIN_POLL_INTERVAL_MS);
    while !sink.is_idle() {
        tokio::select! {
            _ = cancel.cancelled() => {
                sink.stop();
                debug!("Playback cancelled while draining");
                return Ok(PlaybackOutcome::Cancelled);
            }
            _ = tokio::time::sleep(poll) => {}
        }
    }

    state = state.next(SinkEvent::Idle {
        network_finished: true,
    });
    if state.requires_stop() {
        sink.stop();
        state = state.next(SinkEvent::Stop);
    }
    debug!(?state, pcm_bytes, underruns, "Playback finished");

    Ok(PlaybackOutcome::Completed {
        pcm_bytes,
        underruns,
    })
}
