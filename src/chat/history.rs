use futures::channel::oneshot;
use futures::{FutureExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message as WsMessage};
use serde::Deserialize;
use wasm_bindgen_futures::spawn_local;
use yew::Callback;

use super::message::ChatMessage;
use crate::api;

#[derive(Clone, PartialEq, Debug)]
pub enum HistoryUpdate {
    /// Full ordered snapshot of the conversation's persisted messages.
    Snapshot(Vec<ChatMessage>),
    Failed(String),
}

/// Live subscription to one conversation's persisted history. The server
/// pushes a complete ordered snapshot whenever the conversation changes.
/// Dropping the handle cancels the reader task and closes the socket, so
/// teardown is symmetric with setup and a replaced subscription can never
/// write into the next conversation's state.
pub struct HistorySubscription {
    cancel: Option<oneshot::Sender<()>>,
}

impl HistorySubscription {
    pub fn open(token: &str, chat_id: &str, on_update: Callback<HistoryUpdate>) -> Self {
        let url = format!(
            "{}/ws/chats/{}/messages?token={}",
            api::ws_base(),
            chat_id,
            token
        );
        let ws = match WebSocket::open(&url) {
            Ok(ws) => ws,
            Err(err) => {
                log::error!("history subscription failed to open: {:?}", err);
                on_update.emit(HistoryUpdate::Failed(
                    "Chat history is unavailable.".to_string(),
                ));
                return Self { cancel: None };
            }
        };
        let (cancel_tx, cancel_rx) = oneshot::channel();
        spawn_local(run(ws, cancel_rx, on_update));
        Self {
            cancel: Some(cancel_tx),
        }
    }
}

impl Drop for HistorySubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

async fn run(ws: WebSocket, cancel: oneshot::Receiver<()>, on_update: Callback<HistoryUpdate>) {
    let mut frames = ws.fuse();
    let mut cancel = cancel.fuse();
    loop {
        futures::select! {
            frame = frames.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match parse_frame(&text) {
                    Ok(update) => on_update.emit(update),
                    Err(err) => log::warn!("skipping malformed history frame: {}", err),
                },
                Some(Ok(WsMessage::Bytes(_))) => {}
                Some(Err(err)) => {
                    log::error!("history subscription error: {:?}", err);
                    on_update.emit(HistoryUpdate::Failed(
                        "Lost connection to chat history.".to_string(),
                    ));
                    break;
                }
                None => break,
            },
            _ = cancel => break,
        }
    }
    // the socket closes when `frames` drops here
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum HistoryFrame {
    Snapshot { messages: Vec<serde_json::Value> },
    Error { message: String },
}

fn parse_frame(text: &str) -> Result<HistoryUpdate, serde_json::Error> {
    match serde_json::from_str::<HistoryFrame>(text)? {
        HistoryFrame::Snapshot { messages } => {
            let mut parsed = Vec::with_capacity(messages.len());
            for raw in messages {
                match serde_json::from_value::<ChatMessage>(raw) {
                    Ok(message) => parsed.push(message),
                    Err(err) => log::warn!("skipping malformed history message: {}", err),
                }
            }
            Ok(HistoryUpdate::Snapshot(parsed))
        }
        HistoryFrame::Error { message } => Ok(HistoryUpdate::Failed(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::ChatRole;

    #[test]
    fn snapshot_frame_parses_ordered_messages() {
        let frame = r#"{
            "type": "snapshot",
            "messages": [
                {"id": "m1", "role": "user", "content": "hi", "timestamp": 1.0},
                {"id": "m2", "role": "assistant", "content": "hello", "timestamp": 2.0}
            ]
        }"#;
        match parse_frame(frame).unwrap() {
            HistoryUpdate::Snapshot(messages) => {
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].role, ChatRole::User);
                assert_eq!(messages[1].content, "hello");
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn malformed_rows_are_dropped_without_losing_the_snapshot() {
        let frame = r#"{
            "type": "snapshot",
            "messages": [
                {"role": "user", "content": "ok"},
                {"role": "narrator", "content": "bad role"}
            ]
        }"#;
        match parse_frame(frame).unwrap() {
            HistoryUpdate::Snapshot(messages) => {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].content, "ok");
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn error_frame_surfaces_the_message() {
        let frame = r#"{"type": "error", "message": "permission denied"}"#;
        assert_eq!(
            parse_frame(frame).unwrap(),
            HistoryUpdate::Failed("permission denied".to_string())
        );
    }
}
