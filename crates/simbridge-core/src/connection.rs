//! The transport seam.
//!
//! A [`Connection`] moves opaque payloads between the bridge and one peer.
//! It knows topics and wire type names but nothing about DataTypes; the
//! registry layers typed handles on top of it.

use simbridge_types::BridgeError;
use tracing::warn;

/// Invoked exactly once when a send has been enqueued or has failed.
pub type CompletionCallback = Box<dyn FnOnce(Result<(), BridgeError>) + Send>;

/// Receives the raw payload of every inbound message on one topic, in
/// arrival order.
pub type RawHandler = Box<dyn Fn(&[u8]) + Send + Sync>;

/// Receives the raw argument of every inbound service request together with
/// the responder for that request.
pub type RawServiceHandler = Box<dyn Fn(&[u8], RawResponder) + Send + Sync>;

/// Transport-side continuation that delivers a service reply.
pub type ReplyFn = Box<dyn FnOnce(Result<Vec<u8>, BridgeError>) + Send>;

/// Abstraction over a live protocol connection.
///
/// Implementations must be shareable across threads: publishers run on the
/// simulation thread while inbound handlers run on the transport's delivery
/// context.
pub trait Connection: Send + Sync {
    /// Declare that `topic` will carry messages of `type_name`.
    fn add_publisher(&self, topic: &str, type_name: &'static str) -> Result<(), BridgeError>;

    /// Enqueue one serialized message on `topic`.  Never blocks; the outcome
    /// is reported through `on_complete`.
    fn send(&self, topic: &str, payload: Vec<u8>, on_complete: CompletionCallback);

    /// Route inbound messages on `topic` to `handler`.
    fn add_subscriber(
        &self,
        topic: &str,
        type_name: &'static str,
        handler: RawHandler,
    ) -> Result<(), BridgeError>;

    /// Serve requests on `topic` with `handler`.
    fn add_service(
        &self,
        topic: &str,
        type_name: &'static str,
        handler: RawServiceHandler,
    ) -> Result<(), BridgeError>;
}

/// One-shot reply slot for a single inbound service request.
///
/// Consuming methods make a second reply unrepresentable.  Dropping the
/// responder without replying fails the request so the peer is never left
/// waiting.
pub struct RawResponder {
    topic: String,
    reply: Option<ReplyFn>,
}

impl RawResponder {
    pub fn new(
        topic: impl Into<String>,
        reply: impl FnOnce(Result<Vec<u8>, BridgeError>) + Send + 'static,
    ) -> Self {
        Self {
            topic: topic.into(),
            reply: Some(Box::new(reply)),
        }
    }

    /// The service topic this request arrived on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Reply with a serialized response.
    pub fn send(mut self, payload: Vec<u8>) {
        if let Some(reply) = self.reply.take() {
            reply(Ok(payload));
        }
    }

    /// Reply with a failure.
    pub fn fail(mut self, err: BridgeError) {
        if let Some(reply) = self.reply.take() {
            reply(Err(err));
        }
    }
}

impl Drop for RawResponder {
    fn drop(&mut self) {
        if let Some(reply) = self.reply.take() {
            warn!(topic = %self.topic, "service request dropped without a response");
            reply(Err(BridgeError::Transport(format!(
                "service handler on {} did not respond",
                self.topic
            ))));
        }
    }
}

impl std::fmt::Debug for RawResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponder")
            .field("topic", &self.topic)
            .field("answered", &self.reply.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn make_responder() -> (RawResponder, Arc<Mutex<Vec<Result<Vec<u8>, BridgeError>>>>) {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&replies);
        let responder = RawResponder::new("/reset", move |r| sink.lock().unwrap().push(r));
        (responder, replies)
    }

    #[test]
    fn send_replies_once() {
        let (responder, replies) = make_responder();
        assert_eq!(responder.topic(), "/reset");
        responder.send(b"{}".to_vec());
        assert_eq!(*replies.lock().unwrap(), vec![Ok(b"{}".to_vec())]);
    }

    #[test]
    fn fail_replies_with_error() {
        let (responder, replies) = make_responder();
        responder.fail(BridgeError::OutOfRange("bad".into()));
        assert_eq!(
            *replies.lock().unwrap(),
            vec![Err(BridgeError::OutOfRange("bad".into()))]
        );
    }

    #[test]
    fn dropped_responder_fails_the_request() {
        let (responder, replies) = make_responder();
        drop(responder);
        let replies = replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert!(matches!(replies[0], Err(BridgeError::Transport(_))));
    }
}
