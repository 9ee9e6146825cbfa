//! MessageStreamAdapter trait definition.
//!
//! The transport that produces an assistant reply is external; the core
//! only consumes its output as a stream of text deltas. The stream is boxed
//! so the adapter stays object-safe and can be injected as a trait object.

use std::pin::Pin;

use futures_util::Stream;

use chatsync_types::error::StreamError;
use chatsync_types::message::Message;

/// Incremental text deltas for one assistant message.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send + 'static>>;

/// Source of assistant replies.
pub trait MessageStreamAdapter: Send + Sync {
    /// Start a reply to `transcript` and return its delta stream.
    fn stream_reply(&self, transcript: &[Message]) -> DeltaStream;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    struct Scripted(Vec<&'static str>);

    impl MessageStreamAdapter for Scripted {
        fn stream_reply(&self, _transcript: &[Message]) -> DeltaStream {
            let deltas: Vec<Result<String, StreamError>> =
                self.0.iter().map(|d| Ok(d.to_string())).collect();
            Box::pin(futures_util::stream::iter(deltas))
        }
    }

    #[tokio::test]
    async fn test_adapter_is_object_safe() {
        let adapter: Box<dyn MessageStreamAdapter> = Box::new(Scripted(vec!["a", "b"]));
        let collected: Vec<String> = adapter
            .stream_reply(&[])
            .map(|d| d.unwrap())
            .collect()
            .await;
        assert_eq!(collected, vec!["a", "b"]);
    }
}
