//! Reply stream fed from a line-oriented reader (standard input in the CLI).
//!
//! Each input line becomes one delta; line breaks between lines are kept so
//! the assembled reply matches the input text.

use std::sync::Mutex;

use chatsync_core::stream::{DeltaStream, MessageStreamAdapter};
use chatsync_types::error::StreamError;
use chatsync_types::message::Message;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

type LineSource = Box<dyn AsyncBufRead + Send + Unpin>;

/// Streams the lines of a reader as one assistant reply.
///
/// The reader is consumed by the first reply; later replies fail.
pub struct LineStreamAdapter {
    source: Mutex<Option<LineSource>>,
}

impl LineStreamAdapter {
    pub fn new(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        Self {
            source: Mutex::new(Some(Box::new(reader))),
        }
    }

    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl MessageStreamAdapter for LineStreamAdapter {
    fn stream_reply(&self, _transcript: &[Message]) -> DeltaStream {
        let source = self.source.lock().expect("line source lock poisoned").take();
        Box::pin(async_stream::stream! {
            let Some(reader) = source else {
                yield Err(StreamError::Transport("input already consumed".to_string()));
                return;
            };
            let mut lines = reader.lines();
            let mut first = true;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let delta = if first { line } else { format!("\n{line}") };
                        first = false;
                        yield Ok(delta);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(StreamError::Transport(e.to_string()));
                        break;
                    }
                }
            }
        })
    }
}
