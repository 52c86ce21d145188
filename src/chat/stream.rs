use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

/// One line of the chat response stream. `log` lines drive the transient
/// status indicator, `event` lines signal side effects (e.g.
/// "expense_added"); `response` and `error` carry final text in pipeline
/// variants where the answer is not delivered through the history
/// subscription.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Log { content: String },
    Response { content: String },
    Error { content: String },
    Event { content: String },
}

/// Incremental newline-delimited JSON decoder. Bytes are buffered until a
/// full line is available; buffering bytes rather than decoded text keeps
/// multi-byte characters split across chunk boundaries intact.
#[derive(Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event completed by it. Blank lines
    /// are ignored; malformed lines are logged and skipped without
    /// aborting the stream.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Drains a final line that arrived without a trailing newline.
    pub fn finish(self) -> Option<StreamEvent> {
        parse_line(&self.buffer)
    }
}

fn parse_line(line: &[u8]) -> Option<StreamEvent> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(err) => {
            log::warn!("skipping non-utf8 stream line: {}", err);
            return None;
        }
    };
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(err) => {
            log::warn!("skipping malformed stream line: {}", err);
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("response has no body")]
    NoBody,
    #[error("stream read failed")]
    Read,
}

/// Consumes the response body chunk by chunk, emitting each decoded event.
/// `cancelled` is probed between chunks; once it reports true the reader
/// is cancelled and the remaining bytes are abandoned.
pub async fn read_events<F>(
    resp: &gloo_net::http::Response,
    mut on_event: F,
    cancelled: impl Fn() -> bool,
) -> Result<(), StreamError>
where
    F: FnMut(StreamEvent),
{
    let body = resp.body().ok_or(StreamError::NoBody)?;
    let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
    let mut decoder = NdjsonDecoder::new();

    loop {
        if cancelled() {
            let _ = reader.cancel();
            return Ok(());
        }
        let chunk = match JsFuture::from(reader.read()).await {
            Ok(chunk) => chunk,
            Err(_) => return Err(StreamError::Read),
        };
        let done = js_sys::Reflect::get(&chunk, &"done".into())
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if done {
            break;
        }
        let value = js_sys::Reflect::get(&chunk, &"value".into()).map_err(|_| StreamError::Read)?;
        let bytes = js_sys::Uint8Array::new(&value).to_vec();
        for event in decoder.push(&bytes) {
            on_event(event);
        }
    }

    if let Some(event) = decoder.finish() {
        on_event(event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_decode_in_order_and_nothing_else_is_produced() {
        let mut decoder = NdjsonDecoder::new();
        let events = decoder.push(
            b"{\"type\":\"log\",\"content\":\"A\"}\n{\"type\":\"log\",\"content\":\"B\"}\n",
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::Log {
                    content: "A".to_string()
                },
                StreamEvent::Log {
                    content: "B".to_string()
                },
            ]
        );
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn malformed_line_is_skipped_and_stream_continues() {
        let mut decoder = NdjsonDecoder::new();
        let events =
            decoder.push(b"{not json}\n{\"type\":\"log\",\"content\":\"still here\"}\n");
        assert_eq!(
            events,
            vec![StreamEvent::Log {
                content: "still here".to_string()
            }]
        );
    }

    #[test]
    fn line_split_across_chunks_is_reassembled() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(b"{\"type\":\"event\",\"co").is_empty());
        let events = decoder.push(b"ntent\":\"expense_added\"}\n");
        assert_eq!(
            events,
            vec![StreamEvent::Event {
                content: "expense_added".to_string()
            }]
        );
    }

    #[test]
    fn multibyte_character_split_across_chunks_survives() {
        let line = "{\"type\":\"log\",\"content\":\"₱ saved\"}\n".as_bytes();
        // split in the middle of the three-byte peso sign
        let cut = line.iter().position(|&b| b == 0xE2).unwrap() + 1;
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder.push(&line[..cut]).is_empty());
        let events = decoder.push(&line[cut..]);
        assert_eq!(
            events,
            vec![StreamEvent::Log {
                content: "₱ saved".to_string()
            }]
        );
    }

    #[test]
    fn blank_and_unknown_lines_are_ignored() {
        let mut decoder = NdjsonDecoder::new();
        let events = decoder.push(b"\n\n{\"type\":\"telemetry\",\"content\":\"x\"}\n");
        assert!(events.is_empty());
    }

    #[test]
    fn unterminated_final_line_is_drained_by_finish() {
        let mut decoder = NdjsonDecoder::new();
        assert!(decoder
            .push(b"{\"type\":\"response\",\"content\":\"done\"}")
            .is_empty());
        assert_eq!(
            decoder.finish(),
            Some(StreamEvent::Response {
                content: "done".to_string()
            })
        );
    }
}
