use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Caller-side sink for a streamed reply.
///
/// `on_chunk` fires per fragment in arrival order, then exactly one of
/// `on_complete` or `on_error`. Nothing fires after the terminal call.
pub trait StreamObserver: Send {
    fn on_chunk(&mut self, chunk: &str);

    fn on_complete(&mut self);

    fn on_error(&mut self, error: &str);
}

/// A streaming callback reified as a value, for transports that forward events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    Chunk(String),
    Complete,
    Error(String),
}

/// Forwards observer callbacks into an unbounded channel.
///
/// Send failures are ignored: a dropped receiver means the caller stopped listening.
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelObserver {
    pub fn new(sender: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl StreamObserver for ChannelObserver {
    fn on_chunk(&mut self, chunk: &str) {
        let _ = self.sender.send(StreamEvent::Chunk(chunk.to_string()));
    }

    fn on_complete(&mut self) {
        let _ = self.sender.send(StreamEvent::Complete);
    }

    fn on_error(&mut self, error: &str) {
        let _ = self.sender.send(StreamEvent::Error(error.to_string()));
    }
}
