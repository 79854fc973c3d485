//! Typed transport handles handed to the simulation.

use std::fmt;

use simbridge_types::BridgeError;
use tracing::error;

use crate::connection::{CompletionCallback, RawResponder};

/// The write step behind a [`Publisher`]: converts, serializes and sends one
/// DataType value.
pub type WriteFn<D> = Box<dyn FnMut(&D, CompletionCallback) + Send>;

/// Outbound handle for one DataType on one topic.
///
/// Plain converters and specialized writers produce the same handle, so a
/// sensor cannot tell which one it was given.  `publish` takes `&mut self`:
/// calls on one instance are serialized by the borrow checker, which is what
/// lets specialized writers keep per-instance scratch state.
pub struct Publisher<D> {
    topic: String,
    write: WriteFn<D>,
}

impl<D> Publisher<D> {
    pub fn new(
        topic: impl Into<String>,
        write: impl FnMut(&D, CompletionCallback) + Send + 'static,
    ) -> Self {
        Self {
            topic: topic.into(),
            write: Box::new(write),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish one value.
    ///
    /// Returns as soon as the outbound message(s) are enqueued.
    /// `on_complete` runs exactly once, with `Err` when conversion or the
    /// transport failed.
    pub fn publish(
        &mut self,
        data: &D,
        on_complete: impl FnOnce(Result<(), BridgeError>) + Send + 'static,
    ) {
        (self.write)(data, Box::new(on_complete));
    }
}

impl<D> fmt::Debug for Publisher<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher").field("topic", &self.topic).finish()
    }
}

/// Identifies a live subscription.  It stays active for the lifetime of the
/// connection it was created on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    topic: String,
    type_name: &'static str,
}

impl SubscriptionHandle {
    pub fn new(topic: impl Into<String>, type_name: &'static str) -> Self {
        Self {
            topic: topic.into(),
            type_name,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

type ConvertResult<Res> = Box<dyn FnOnce(Res) -> Result<Vec<u8>, BridgeError> + Send>;

/// Typed reply slot for one service request.
///
/// [`respond`](Self::respond) consumes the responder, so each request is
/// answered at most once.  Dropping it unanswered fails the request.
pub struct Responder<Res> {
    raw: RawResponder,
    convert: ConvertResult<Res>,
}

impl<Res> Responder<Res> {
    pub fn new(
        raw: RawResponder,
        convert: impl FnOnce(Res) -> Result<Vec<u8>, BridgeError> + Send + 'static,
    ) -> Self {
        Self {
            raw,
            convert: Box::new(convert),
        }
    }

    pub fn topic(&self) -> &str {
        self.raw.topic()
    }

    /// Convert `res` and send it as the reply.
    pub fn respond(self, res: Res) {
        let Self { raw, convert } = self;
        match convert(res) {
            Ok(payload) => raw.send(payload),
            Err(e) => {
                error!(topic = %raw.topic(), error = %e, "failed to convert service response");
                raw.fail(e);
            }
        }
    }
}

impl<Res> fmt::Debug for Responder<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder").field("raw", &self.raw).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn publisher_forwards_value_and_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut publisher = Publisher::new("/numbers", move |value: &u32, done: CompletionCallback| {
            sink.lock().unwrap().push(*value);
            done(Ok(()));
        });
        assert_eq!(publisher.topic(), "/numbers");

        let completed = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&completed);
        publisher.publish(&7, move |r| *slot.lock().unwrap() = Some(r));

        assert_eq!(*seen.lock().unwrap(), vec![7]);
        assert_eq!(*completed.lock().unwrap(), Some(Ok(())));
    }

    #[test]
    fn responder_converts_before_replying() {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&replies);
        let raw = RawResponder::new("/double", move |r| sink.lock().unwrap().push(r));
        let responder = Responder::new(raw, |n: u32| Ok((n * 2).to_string().into_bytes()));

        responder.respond(21);
        assert_eq!(*replies.lock().unwrap(), vec![Ok(b"42".to_vec())]);
    }

    #[test]
    fn responder_conversion_failure_fails_the_request() {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&replies);
        let raw = RawResponder::new("/odd", move |r| sink.lock().unwrap().push(r));
        let responder = Responder::new(raw, |_: u32| Err(BridgeError::OutOfRange("odd".into())));

        responder.respond(1);
        assert_eq!(
            *replies.lock().unwrap(),
            vec![Err(BridgeError::OutOfRange("odd".into()))]
        );
    }
}
