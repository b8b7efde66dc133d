use std::{
    pin::Pin,
    task::{Context, Poll},
};

use bytes::{Bytes, BytesMut};
use futures::{stream, stream::BoxStream, Stream, StreamExt};

use crate::{
    errors::{constants::WAV_HEADER_LEN, Result, VoiceTextError},
    tts::wav_header::WavHeader,
};

/// Response body as delivered by the transport.
pub type AudioByteStream = BoxStream<'static, Result<Bytes>>;

/// A response body whose WAV header has not been read yet.
///
/// [`WavStream::parse_header`] consumes the stream, so the header is parsed
/// at most once per response.
pub struct WavStream {
    inner: AudioByteStream,
}

impl WavStream {
    #[must_use]
    pub fn new(inner: AudioByteStream) -> Self {
        Self { inner }
    }

    /// Buffer until the fixed-size header is complete, validate it and
    /// return the rest of the body as PCM.
    pub async fn parse_header(mut self) -> Result<(WavHeader, PcmStream)> {
        let mut buffer = BytesMut::with_capacity(WAV_HEADER_LEN);

        while buffer.len() < WAV_HEADER_LEN {
            match self.inner.next().await {
                Some(chunk) => buffer.extend_from_slice(&chunk?),
                None => {
                    WavHeader::check_riff_id(&buffer)?;
                    return Err(VoiceTextError::TruncatedHeader {
                        received: buffer.len(),
                    });
                }
            }
        }

        let header = WavHeader::parse(&buffer)?;
        let remainder = buffer.split_off(WAV_HEADER_LEN).freeze();
        tracing::debug!(
            sample_rate = header.sample_rate,
            channels = header.num_channels,
            bits_per_sample = header.bits_per_sample,
            buffered = remainder.len(),
            "Parsed WAV header"
        );

        let inner = if remainder.is_empty() {
            self.inner
        } else {
            stream::once(async move { Ok(remainder) })
                .chain(self.inner)
                .boxed()
        };

        Ok((header, PcmStream { inner }))
    }
}

/// PCM bytes following the header.
pub struct PcmStream {
    inner: AudioByteStream,
}

impl Stream for PcmStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
