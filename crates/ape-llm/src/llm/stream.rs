//! Streaming response decoding.
//!
//! The server sends newline-delimited `data: {...}` events terminated by
//! `data: [DONE]`. [`decode_line`] is the per-line transition; [`ChunkStream`]
//! drives it over a byte stream, buffering lines split across chunks.

use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;
use tracing::warn;

use super::error::DecodeError;
use super::types::StreamEvent;

/// Prefix of the text emitted in place of a failed stream.
pub const ERROR_PREFIX: &str = "오류:";

const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of decoding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Keep-alive, comment or a chunk without content.
    Skip,
    Delta(String),
    /// Termination sentinel; nothing after it is read.
    Done,
}

/// Decode a single line of a streaming response.
pub fn decode_line(line: &[u8]) -> Result<LineEvent, DecodeError> {
    let line = std::str::from_utf8(line)?.trim();
    if line.is_empty() || line.starts_with(':') {
        return Ok(LineEvent::Skip);
    }

    let data = line
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(line);
    if data == DONE_SENTINEL {
        return Ok(LineEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)?;
    match chunk.into_content() {
        Some(content) if !content.is_empty() => Ok(LineEvent::Delta(content)),
        _ => Ok(LineEvent::Skip),
    }
}

/// Text emitted when a streaming call fails.
pub(crate) fn error_text(model_name: &str, err: impl Display) -> String {
    format!("{ERROR_PREFIX} {model_name} model streaming call failed: {err}")
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl StreamChunk {
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.delta.content
    }
}

/// Adapts a byte stream into [`StreamEvent`]s.
///
/// Malformed lines are logged and skipped. A transport error ends the stream
/// with a single [`StreamEvent::Error`].
pub struct ChunkStream<S> {
    inner: S,
    model_name: String,
    buffer: Vec<u8>,
    eof: bool,
    done: bool,
}

impl<S> ChunkStream<S> {
    pub fn new(inner: S, model_name: impl Into<String>) -> Self {
        Self {
            inner,
            model_name: model_name.into(),
            buffer: Vec::new(),
            eof: false,
            done: false,
        }
    }

    fn handle_line(&mut self, line: &[u8]) -> Option<StreamEvent> {
        match decode_line(line) {
            Ok(LineEvent::Skip) => None,
            Ok(LineEvent::Delta(content)) => Some(StreamEvent::Delta(content)),
            Ok(LineEvent::Done) => {
                self.done = true;
                Some(StreamEvent::Done)
            }
            Err(e) => {
                warn!(
                    model = %self.model_name,
                    line = %String::from_utf8_lossy(line),
                    error = %e,
                    "Skipping malformed stream chunk"
                );
                None
            }
        }
    }
}

impl<S, E> Stream for ChunkStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        loop {
            // Try to take a complete line from the buffer
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                if let Some(event) = self.handle_line(&line[..pos]) {
                    return Poll::Ready(Some(event));
                }
                continue;
            }

            if self.eof {
                if !self.buffer.is_empty() {
                    let line = std::mem::take(&mut self.buffer);
                    if let Some(event) = self.handle_line(&line) {
                        return Poll::Ready(Some(event));
                    }
                    continue;
                }
                self.done = true;
                return Poll::Ready(Some(StreamEvent::Done));
            }

            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    self.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(e))) => {
                    warn!(model = %self.model_name, error = %e, "Stream transport failed");
                    self.done = true;
                    let text = error_text(&self.model_name, e);
                    return Poll::Ready(Some(StreamEvent::Error(text)));
                }
                Poll::Ready(None) => {
                    self.eof = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn collect(chunks: Vec<Result<&'static str, &'static str>>) -> Vec<StreamEvent> {
        let inner = futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(|s| Bytes::from_static(s.as_bytes()))),
        );
        ChunkStream::new(inner, "Test").collect().await
    }

    #[test]
    fn decode_delta_line() {
        let event =
            decode_line(br#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap();
        assert_eq!(event, LineEvent::Delta("Hi".to_string()));
    }

    #[test]
    fn decode_done_sentinel() {
        assert_eq!(decode_line(b"data: [DONE]").unwrap(), LineEvent::Done);
        assert_eq!(decode_line(b"data:[DONE]\r").unwrap(), LineEvent::Done);
    }

    #[test]
    fn decode_keep_alive_and_comments() {
        assert_eq!(decode_line(b"").unwrap(), LineEvent::Skip);
        assert_eq!(decode_line(b"   \r").unwrap(), LineEvent::Skip);
        assert_eq!(
            decode_line(b": OPENROUTER PROCESSING").unwrap(),
            LineEvent::Skip
        );
    }

    #[test]
    fn decode_chunk_without_content() {
        for line in [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":""}}]}"#,
            r#"data: {"choices":[]}"#,
            r#"data: {"usage":{"total_tokens":3}}"#,
        ] {
            assert_eq!(decode_line(line.as_bytes()).unwrap(), LineEvent::Skip, "{line}");
        }
    }

    #[test]
    fn decode_unprefixed_json_line() {
        let event = decode_line(br#"{"choices":[{"delta":{"content":"raw"}}]}"#).unwrap();
        assert_eq!(event, LineEvent::Delta("raw".to_string()));
    }

    #[test]
    fn decode_malformed_line() {
        assert!(matches!(
            decode_line(b"data: not-json"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode_line(&[b'd', b'a', 0xff, 0xfe]),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[tokio::test]
    async fn stream_yields_delta_then_done() {
        let events = collect(vec![Ok(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\ndata: [DONE]\n",
        )])
        .await;
        assert_eq!(
            events,
            vec![StreamEvent::Delta("Hi".to_string()), StreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn stream_skips_malformed_chunk() {
        let events = collect(vec![Ok("data: not-json\ndata: [DONE]\n")]).await;
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[tokio::test]
    async fn stream_stops_reading_after_done() {
        let events = collect(vec![
            Ok("data: [DONE]\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n"),
        ])
        .await;
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[tokio::test]
    async fn stream_joins_lines_split_across_chunks() {
        let events = collect(vec![
            Ok("data: {\"choices\":[{\"del"),
            Ok("ta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choices\":"),
            Ok("[{\"delta\":{\"content\":\"lo\"}}]}\r\n"),
            Ok("data: [DONE]\n"),
        ])
        .await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".to_string()),
                StreamEvent::Delta("lo".to_string()),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn stream_flushes_unterminated_last_line() {
        let events = collect(vec![Ok(
            "data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}",
        )])
        .await;
        assert_eq!(
            events,
            vec![StreamEvent::Delta("tail".to_string()), StreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn stream_without_sentinel_ends_with_done() {
        let events = collect(vec![]).await;
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[tokio::test]
    async fn transport_error_becomes_single_error_event() {
        let events = collect(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n"),
            Err("connection reset"),
            Ok("data: [DONE]\n"),
        ])
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Delta("Hi".to_string()));
        match &events[1] {
            StreamEvent::Error(text) => {
                assert!(text.starts_with(ERROR_PREFIX));
                assert!(text.contains("Test"));
                assert!(text.contains("connection reset"));
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }
}
