//! rosbridge v2 transport.
//!
//! [`RosbridgeConnection`] implements [`Connection`] over a WebSocket client
//! talking to a `rosbridge_server`:
//!
//! 1. **Outbound** – `advertise`, `publish`, `subscribe`,
//!    `advertise_service` and `service_response` frames are built by pure
//!    functions and pushed onto an unbounded channel that a writer task
//!    drains into the socket.  Sends never block the simulation thread.
//!
//! 2. **Inbound** – a reader task parses every text frame and dispatches
//!    `publish` payloads to the topic's handlers and `call_service` requests
//!    to the topic's service handler, in arrival order.
//!
//! Losing the socket marks the connection closed; later sends complete with
//! [`BridgeError::ConnectionClosed`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::{Value, json};
use simbridge_types::BridgeError;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::connection::{CompletionCallback, Connection, RawHandler, RawResponder, RawServiceHandler};

// ────────────────────────────────────────────────────────────────────────────
// Framing
// ────────────────────────────────────────────────────────────────────────────

pub fn advertise_frame(topic: &str, type_name: &str) -> String {
    json!({ "op": "advertise", "topic": topic, "type": type_name }).to_string()
}

pub fn subscribe_frame(topic: &str, type_name: &str) -> String {
    json!({ "op": "subscribe", "topic": topic, "type": type_name }).to_string()
}

pub fn advertise_service_frame(service: &str, type_name: &str) -> String {
    json!({ "op": "advertise_service", "service": service, "type": type_name }).to_string()
}

/// Wrap a serialized message body in a `publish` frame.
///
/// # Errors
///
/// Returns [`BridgeError::Serialization`] if `payload` is not JSON.
pub fn publish_frame(topic: &str, payload: &[u8]) -> Result<String, BridgeError> {
    let msg: Value = serde_json::from_slice(payload)?;
    Ok(json!({ "op": "publish", "topic": topic, "msg": msg }).to_string())
}

/// Build the `service_response` frame answering request `id`.
///
/// A failed request, or a reply body that is not JSON, is reported with
/// `"result": false` and the error text in `values`.
pub fn service_response_frame(
    service: &str,
    id: Option<&str>,
    result: &Result<Vec<u8>, BridgeError>,
) -> String {
    let (values, ok) = match result {
        Ok(payload) => match serde_json::from_slice::<Value>(payload) {
            Ok(values) => (values, true),
            Err(e) => (Value::String(e.to_string()), false),
        },
        Err(e) => (Value::String(e.to_string()), false),
    };
    let mut frame = json!({
        "op": "service_response",
        "service": service,
        "values": values,
        "result": ok,
    });
    if let Some(id) = id {
        frame["id"] = Value::String(id.to_string());
    }
    frame.to_string()
}

/// A parsed inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A message on a subscribed topic.  `msg` is the JSON body.
    Publish { topic: String, msg: Vec<u8> },
    /// A request for an advertised service.  `args` is the JSON body
    /// (`{}` when the peer sent none).
    CallService {
        service: String,
        id: Option<String>,
        args: Vec<u8>,
    },
    /// Any other operation (status, acknowledgements, …).
    Other(String),
}

/// Parse one inbound text frame.
///
/// # Errors
///
/// Returns [`BridgeError::Serialization`] when the frame is not a JSON
/// object with an `op` field, or a `publish` / `call_service` frame lacks
/// its topic.
pub fn parse_inbound(text: &str) -> Result<Inbound, BridgeError> {
    let json: Value = serde_json::from_str(text)?;
    let op = json
        .get("op")
        .and_then(|o| o.as_str())
        .ok_or_else(|| BridgeError::Serialization("frame has no op".into()))?;

    match op {
        "publish" => {
            let topic = json
                .get("topic")
                .and_then(|t| t.as_str())
                .ok_or_else(|| BridgeError::Serialization("publish frame has no topic".into()))?;
            let msg = json.get("msg").cloned().unwrap_or_else(|| json!({}));
            Ok(Inbound::Publish {
                topic: topic.to_string(),
                msg: serde_json::to_vec(&msg)?,
            })
        }
        "call_service" => {
            let service = json
                .get("service")
                .and_then(|s| s.as_str())
                .ok_or_else(|| {
                    BridgeError::Serialization("call_service frame has no service".into())
                })?;
            let id = json.get("id").and_then(|i| match i {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
            let args = match json.get("args") {
                Some(Value::Null) | None => json!({}),
                Some(args) => args.clone(),
            };
            Ok(Inbound::CallService {
                service: service.to_string(),
                id,
                args: serde_json::to_vec(&args)?,
            })
        }
        other => Ok(Inbound::Other(other.to_string())),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Connection
// ────────────────────────────────────────────────────────────────────────────

type SharedHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;
type SharedServiceHandler = Arc<dyn Fn(&[u8], RawResponder) + Send + Sync>;

#[derive(Default)]
struct Routes {
    subscribers: HashMap<String, Vec<SharedHandler>>,
    services: HashMap<String, SharedServiceHandler>,
}

/// [`Connection`] over a rosbridge WebSocket.
///
/// Cloning is cheap; clones share the socket, the routing table and the
/// closed flag.
#[derive(Clone)]
pub struct RosbridgeConnection {
    outbound: mpsc::UnboundedSender<String>,
    routes: Arc<RwLock<Routes>>,
    closed: Arc<AtomicBool>,
}

impl RosbridgeConnection {
    /// Build a connection whose frames go to `outbound`.
    ///
    /// [`connect`](Self::connect) uses this with a channel drained by the
    /// socket writer; tests read the channel directly.
    pub fn from_sender(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            outbound,
            routes: Arc::new(RwLock::new(Routes::default())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connect to a `rosbridge_server` at `url` and start the reader and
    /// writer tasks on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the WebSocket handshake fails.
    pub async fn connect(url: &str) -> Result<Self, BridgeError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| BridgeError::Transport(format!("connect to {url}: {e}")))?;
        info!(url = %url, "connected to rosbridge");

        let (ws_tx, mut ws_rx) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let conn = Self::from_sender(tx);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let closed = Arc::clone(&conn.closed);
        tokio::spawn(async move {
            drain_outbound(ws_tx, rx, stop_rx).await;
            closed.store(true, Ordering::SeqCst);
        });

        let reader = conn.clone();
        tokio::spawn(async move {
            while let Some(msg) = ws_rx.next().await {
                match msg {
                    Ok(Message::Text(text)) => reader.dispatch(text.as_str()),
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        error!(error = %e, "rosbridge read failed");
                        break;
                    }
                    _ => {}
                }
            }
            reader.close();
            drop(stop_tx);
            warn!("rosbridge connection closed");
        });

        Ok(conn)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark the connection closed.  Later sends fail immediately.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Route one inbound text frame.
    ///
    /// Malformed frames and frames for unknown topics are logged and
    /// dropped.
    pub fn dispatch(&self, text: &str) {
        match parse_inbound(text) {
            Ok(Inbound::Publish { topic, msg }) => {
                let handlers = self
                    .routes
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .subscribers
                    .get(&topic)
                    .cloned()
                    .unwrap_or_default();
                if handlers.is_empty() {
                    debug!(topic = %topic, "no subscriber for inbound message");
                }
                for handler in handlers {
                    handler(&msg);
                }
            }
            Ok(Inbound::CallService { service, id, args }) => {
                let handler = self
                    .routes
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .services
                    .get(&service)
                    .cloned();
                let outbound = self.outbound.clone();
                let name = service.clone();
                let responder = RawResponder::new(&service, move |result| {
                    let frame = service_response_frame(&name, id.as_deref(), &result);
                    if outbound.send(frame).is_err() {
                        warn!(service = %name, "service response lost: connection closed");
                    }
                });
                match handler {
                    Some(handler) => handler(&args, responder),
                    None => {
                        warn!(service = %service, "call for unknown service");
                        responder.fail(BridgeError::not_registered("service", &service));
                    }
                }
            }
            Ok(Inbound::Other(op)) => debug!(op = %op, "ignoring rosbridge frame"),
            Err(e) => warn!(error = %e, "malformed rosbridge frame"),
        }
    }

    fn remove_last_subscriber(&self, topic: &str) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(handlers) = routes.subscribers.get_mut(topic) {
            handlers.pop();
            if handlers.is_empty() {
                routes.subscribers.remove(topic);
            }
        }
    }

    fn enqueue(&self, frame: String) -> Result<(), BridgeError> {
        if self.is_closed() {
            return Err(BridgeError::ConnectionClosed);
        }
        self.outbound.send(frame).map_err(|_| {
            self.close();
            BridgeError::ConnectionClosed
        })
    }
}

impl Connection for RosbridgeConnection {
    fn add_publisher(&self, topic: &str, type_name: &'static str) -> Result<(), BridgeError> {
        self.enqueue(advertise_frame(topic, type_name))
    }

    fn send(&self, topic: &str, payload: Vec<u8>, on_complete: CompletionCallback) {
        let result = publish_frame(topic, &payload).and_then(|frame| self.enqueue(frame));
        if let Err(e) = &result {
            warn!(topic = %topic, error = %e, "publish failed");
        }
        on_complete(result);
    }

    fn add_subscriber(
        &self,
        topic: &str,
        type_name: &'static str,
        handler: RawHandler,
    ) -> Result<(), BridgeError> {
        let first = {
            let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
            let handlers = routes.subscribers.entry(topic.to_string()).or_default();
            handlers.push(Arc::from(handler));
            handlers.len() == 1
        };
        if first && let Err(e) = self.enqueue(subscribe_frame(topic, type_name)) {
            self.remove_last_subscriber(topic);
            return Err(e);
        }
        Ok(())
    }

    fn add_service(
        &self,
        topic: &str,
        type_name: &'static str,
        handler: RawServiceHandler,
    ) -> Result<(), BridgeError> {
        {
            let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
            if routes.services.contains_key(topic) {
                return Err(BridgeError::Transport(format!(
                    "service {topic} is already advertised"
                )));
            }
            routes.services.insert(topic.to_string(), Arc::from(handler));
        }
        self.enqueue(advertise_service_frame(topic, type_name))
            .inspect_err(|_| {
                self.routes
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .services
                    .remove(topic);
            })
    }
}

/// Write queued frames to `sink` until the queue closes, a write fails or
/// `stop` fires, then close the sink.  Frames already queued are written
/// before `stop` is honoured.
async fn drain_outbound<S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<String>,
    mut stop: oneshot::Receiver<()>,
) -> S
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    loop {
        tokio::select! {
            biased;
            frame = rx.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = sink.send(Message::Text(frame.into())).await {
                        error!(error = %e, "rosbridge write failed");
                        break;
                    }
                }
                None => break,
            },
            _ = &mut stop => {
                debug!("rosbridge reader finished, stopping writer");
                break;
            }
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "rosbridge close failed");
    }
    sink
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
