//! Incremental reader for Gemini's `alt=sse` streaming responses.

use super::types::GenerateContentResponse;
use crate::{Error, Result};
use futures::{Stream, StreamExt};

/// Largest single event the reader will buffer. Inline images arrive as one
/// base64 event, so this is sized well above a 4K image.
pub const MAX_EVENT_BYTES: usize = 32 * 1024 * 1024;

/// Splits a byte stream into server-sent events and decodes each `data:`
/// payload as a [`GenerateContentResponse`] chunk.
///
/// Bytes are buffered until a full event arrives, so multi-byte characters
/// split across network reads decode intact. Dropping the reader drops the
/// underlying connection.
pub struct SseReader<S> {
    inner: S,
    buffer: Vec<u8>,
    // Bytes of `buffer` already searched for an event boundary.
    scanned: usize,
    max_event_bytes: usize,
    finished: bool,
}

impl<S, B, E> SseReader<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<Error>,
{
    pub fn new(inner: S) -> Self {
        Self::with_limit(inner, MAX_EVENT_BYTES)
    }

    pub fn with_limit(inner: S, max_event_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            scanned: 0,
            max_event_bytes,
            finished: false,
        }
    }

    /// Next decoded chunk, or `None` once the stream is exhausted.
    ///
    /// An `error` object sent inside the stream surfaces as
    /// [`Error::ProviderStatus`] carrying the provider's code and message.
    pub async fn next_chunk(&mut self) -> Result<Option<GenerateContentResponse>> {
        loop {
            if let Some(event) = self.take_event() {
                if let Some(chunk) = decode_event(&event)? {
                    return Ok(Some(chunk));
                }
                continue;
            }

            if self.finished {
                return Ok(None);
            }

            if self.buffer.len() > self.max_event_bytes {
                return Err(Error::UnrecognizedResponse(format!(
                    "stream event exceeds {} bytes",
                    self.max_event_bytes
                )));
            }

            match self.inner.next().await {
                Some(Ok(bytes)) => self
                    .buffer
                    .extend(bytes.as_ref().iter().copied().filter(|b| *b != b'\r')),
                Some(Err(e)) => return Err(e.into()),
                None => self.finished = true,
            }
        }
    }

    /// Pop one complete event off the buffer. Once the stream has ended, any
    /// trailing bytes count as a final event.
    fn take_event(&mut self) -> Option<Vec<u8>> {
        // Step back one byte so a boundary split across reads is still found.
        let from = self.scanned.saturating_sub(1);
        if let Some(offset) = self.buffer[from..].windows(2).position(|w| w == b"\n\n") {
            let end = from + offset;
            let event = self.buffer[..end].to_vec();
            self.buffer.drain(..end + 2);
            self.scanned = 0;
            return Some(event);
        }
        self.scanned = self.buffer.len();
        if self.finished && !self.buffer.is_empty() {
            self.scanned = 0;
            return Some(std::mem::take(&mut self.buffer));
        }
        None
    }
}

fn decode_event(event: &[u8]) -> Result<Option<GenerateContentResponse>> {
    let event = String::from_utf8_lossy(event);
    let data: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect();

    if data.is_empty() {
        return Ok(None);
    }

    let payload = data.join("\n");
    if payload.trim().is_empty() || payload.trim() == "[DONE]" {
        return Ok(None);
    }

    let mut chunk: GenerateContentResponse = serde_json::from_str(&payload).map_err(|e| {
        tracing::error!("Failed to parse Gemini stream chunk: {}\nData: {}", e, payload);
        Error::UnrecognizedResponse(format!("stream chunk is not a content response: {}", e))
    })?;

    if let Some(error) = chunk.error.take() {
        tracing::error!(
            "Gemini stream returned error (status {}): {}",
            error.code,
            error.message
        );
        return Err(Error::ProviderStatus {
            status: error.code,
            message: error.message,
        });
    }

    Ok(Some(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::types::Part;
    use futures::stream;

    fn reader(
        chunks: Vec<&'static [u8]>,
    ) -> SseReader<impl Stream<Item = Result<&'static [u8]>> + Unpin> {
        SseReader::new(stream::iter(chunks.into_iter().map(Ok)))
    }

    fn text_of(chunk: &GenerateContentResponse) -> String {
        chunk
            .parts()
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_reads_events_in_order() {
        let mut reader = reader(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a\"}]}}]}\n\n".as_bytes(),
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"b\"}]}}]}\n\n".as_bytes(),
        ]);

        assert_eq!(text_of(&reader.next_chunk().await.unwrap().unwrap()), "a");
        assert_eq!(text_of(&reader.next_chunk().await.unwrap().unwrap()), "b");
        assert!(reader.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_event_split_across_reads_and_crlf() {
        let payload: &'static str =
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"학교\"}]}}]}\r\n\r\n";
        let bytes = payload.as_bytes();
        // Split inside the first Korean character.
        let split = payload.find('학').unwrap() + 1;
        let mut reader = reader(vec![&bytes[..split], &bytes[split..]]);

        let chunk = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(text_of(&chunk), "학교");
    }

    #[tokio::test]
    async fn test_trailing_event_without_blank_line() {
        let mut reader = reader(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"end\"}]}}]}".as_bytes(),
        ]);
        assert_eq!(text_of(&reader.next_chunk().await.unwrap().unwrap()), "end");
        assert!(reader.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skips_comments_and_done_marker() {
        let mut reader = reader(vec![": keep-alive\n\n".as_bytes(), "data: [DONE]\n\n".as_bytes()]);
        assert!(reader.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_boundary_split_across_reads() {
        let mut reader = reader(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a\"}]}}]}\n".as_bytes(),
            "\ndata: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"b\"}]}}]}\n\n".as_bytes(),
        ]);

        assert_eq!(text_of(&reader.next_chunk().await.unwrap().unwrap()), "a");
        assert_eq!(text_of(&reader.next_chunk().await.unwrap().unwrap()), "b");
    }

    #[tokio::test]
    async fn test_error_event_keeps_provider_status() {
        let mut reader = reader(vec![
            "data: {\"error\":{\"code\":429,\"message\":\"Resource exhausted\"}}\n\n".as_bytes(),
        ]);

        match reader.next_chunk().await.unwrap_err() {
            Error::ProviderStatus { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource exhausted");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_event_is_rejected() {
        let mut reader = SseReader::with_limit(
            stream::iter(vec![
                Ok::<_, Error>("data: {\"candidates\":".as_bytes()),
                Ok("[{\"content\":{\"parts\":[]}}]".as_bytes()),
                Ok("}\n\n".as_bytes()),
            ]),
            16,
        );

        let err = reader.next_chunk().await.unwrap_err();
        assert!(matches!(err, Error::UnrecognizedResponse(_)));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_unrecognized() {
        let mut reader = reader(vec!["data: not json\n\n".as_bytes()]);
        let err = reader.next_chunk().await.unwrap_err();
        assert!(matches!(err, Error::UnrecognizedResponse(_)));
    }
}
