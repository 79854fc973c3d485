//! In-memory connection.
//!
//! [`LoopbackConnection`] implements [`Connection`] without a peer: outbound
//! frames are recorded in order, inbound messages and service requests are
//! injected by the caller.  Protocol crates use it to exercise their
//! registrations end to end.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use simbridge_types::BridgeError;

use crate::connection::{CompletionCallback, Connection, RawHandler, RawResponder, RawServiceHandler};
use crate::wire::unserialize;

type SharedHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;
type SharedServiceHandler = Arc<dyn Fn(&[u8], RawResponder) + Send + Sync>;

/// One recorded outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct SentFrame {
    pub topic: String,
    pub type_name: &'static str,
    pub payload: Vec<u8>,
}

impl SentFrame {
    /// Decode the payload as wire message `W`.
    pub fn decode<W: DeserializeOwned>(&self) -> Result<W, BridgeError> {
        unserialize(&self.payload)
    }
}

#[derive(Default)]
struct LoopbackState {
    publishers: HashMap<String, &'static str>,
    subscribers: HashMap<String, (&'static str, Vec<SharedHandler>)>,
    services: HashMap<String, (&'static str, SharedServiceHandler)>,
    sent: Vec<SentFrame>,
    responses: Vec<(String, Result<Vec<u8>, BridgeError>)>,
    fail_sends: bool,
}

/// Recording connection.  Clones share the same state.
#[derive(Clone, Default)]
pub struct LoopbackConnection {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent send fail with a transport error.
    pub fn set_fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// Wire type advertised for `topic`, if any.
    pub fn advertised(&self, topic: &str) -> Option<&'static str> {
        self.lock().publishers.get(topic).copied()
    }

    /// Wire type subscribed on `topic`, if any.
    pub fn subscribed(&self, topic: &str) -> Option<&'static str> {
        self.lock().subscribers.get(topic).map(|(t, _)| *t)
    }

    /// Wire type served on `topic`, if any.
    pub fn service_type(&self, topic: &str) -> Option<&'static str> {
        self.lock().services.get(topic).map(|(t, _)| *t)
    }

    /// Every frame sent so far, oldest first.
    pub fn sent(&self) -> Vec<SentFrame> {
        self.lock().sent.clone()
    }

    /// Frames sent on `topic`, oldest first.
    pub fn sent_on(&self, topic: &str) -> Vec<SentFrame> {
        self.lock()
            .sent
            .iter()
            .filter(|f| f.topic == topic)
            .cloned()
            .collect()
    }

    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }

    /// Deliver `raw` to every subscriber on `topic`.  Returns the number of
    /// handlers invoked.
    pub fn deliver(&self, topic: &str, raw: &[u8]) -> usize {
        let handlers = self
            .lock()
            .subscribers
            .get(topic)
            .map(|(_, hs)| hs.clone())
            .unwrap_or_default();
        for handler in &handlers {
            handler(raw);
        }
        handlers.len()
    }

    /// Issue a service request on `topic`.  Replies are recorded and can be
    /// read with [`responses`](Self::responses).
    pub fn call_service(&self, topic: &str, raw: &[u8]) -> Result<(), BridgeError> {
        let handler = self
            .lock()
            .services
            .get(topic)
            .map(|(_, h)| Arc::clone(h))
            .ok_or_else(|| BridgeError::Transport(format!("no service on {topic}")))?;

        let state = Arc::clone(&self.state);
        let service = topic.to_string();
        let responder = RawResponder::new(topic, move |result| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .responses
                .push((service, result));
        });
        handler(raw, responder);
        Ok(())
    }

    /// Service replies received so far as `(topic, result)`, oldest first.
    pub fn responses(&self) -> Vec<(String, Result<Vec<u8>, BridgeError>)> {
        self.lock().responses.clone()
    }
}

impl Connection for LoopbackConnection {
    fn add_publisher(&self, topic: &str, type_name: &'static str) -> Result<(), BridgeError> {
        self.lock().publishers.insert(topic.to_string(), type_name);
        Ok(())
    }

    fn send(&self, topic: &str, payload: Vec<u8>, on_complete: CompletionCallback) {
        let result = {
            let mut state = self.lock();
            if state.fail_sends {
                Err(BridgeError::Transport(format!("send on {topic} failed")))
            } else if let Some(type_name) = state.publishers.get(topic).copied() {
                state.sent.push(SentFrame {
                    topic: topic.to_string(),
                    type_name,
                    payload,
                });
                Ok(())
            } else {
                Err(BridgeError::Transport(format!("{topic} was not advertised")))
            }
        };
        on_complete(result);
    }

    fn add_subscriber(
        &self,
        topic: &str,
        type_name: &'static str,
        handler: RawHandler,
    ) -> Result<(), BridgeError> {
        let mut state = self.lock();
        let entry = state
            .subscribers
            .entry(topic.to_string())
            .or_insert_with(|| (type_name, Vec::new()));
        if entry.0 != type_name {
            return Err(BridgeError::Transport(format!(
                "{topic} is already subscribed as {}",
                entry.0
            )));
        }
        entry.1.push(Arc::from(handler));
        Ok(())
    }

    fn add_service(
        &self,
        topic: &str,
        type_name: &'static str,
        handler: RawServiceHandler,
    ) -> Result<(), BridgeError> {
        let mut state = self.lock();
        if state.services.contains_key(topic) {
            return Err(BridgeError::Transport(format!("{topic} already has a service")));
        }
        state
            .services
            .insert(topic.to_string(), (type_name, Arc::from(handler)));
        Ok(())
    }
}
