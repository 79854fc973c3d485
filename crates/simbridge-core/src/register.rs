//! Declarative bindings.
//!
//! Each protocol module calls one of these once per supported data kind at
//! startup.  They record the capability descriptor and install a creator
//! that wires a converter between the typed handle and the raw
//! [`Connection`].

use std::sync::Arc;

use simbridge_types::BridgeError;
use tracing::{error, warn};

use crate::connection::{CompletionCallback, RawResponder};
use crate::plugin::BridgePlugin;
use crate::primitives::{Publisher, Responder, SubscriptionHandle};
use crate::wire::{WireMessage, serialize, unserialize};

/// Bind `D → W` with an infallible converter.
pub fn reg_publisher<D, W, F>(plugin: &mut BridgePlugin, convert: F) -> Result<(), BridgeError>
where
    D: 'static,
    W: WireMessage,
    F: Fn(&D) -> W + Send + Sync + 'static,
{
    reg_publisher_fallible::<D, W, _>(plugin, move |data| Ok(convert(data)))
}

/// Bind `D → W` with a converter that can reject a value.
///
/// A rejected value is logged and reported to the publish callback; nothing
/// is sent for it.
pub fn reg_publisher_fallible<D, W, F>(
    plugin: &mut BridgePlugin,
    convert: F,
) -> Result<(), BridgeError>
where
    D: 'static,
    W: WireMessage,
    F: Fn(&D) -> Result<W, BridgeError> + Send + Sync + 'static,
{
    plugin.add_type::<D>(W::TYPE_NAME);
    let convert = Arc::new(convert);
    plugin.add_publisher_creator::<D>(move |conn, topic| {
        conn.add_publisher(topic, W::TYPE_NAME)?;
        let convert = Arc::clone(&convert);
        let topic_name = topic.to_string();
        Ok(Publisher::new(topic, move |data: &D, on_complete: CompletionCallback| {
            match convert(data).and_then(|msg| serialize(&msg)) {
                Ok(payload) => conn.send(&topic_name, payload, on_complete),
                Err(e) => {
                    error!(
                        topic = %topic_name,
                        type_name = W::TYPE_NAME,
                        error = %e,
                        "failed to convert outbound message"
                    );
                    on_complete(Err(e));
                }
            }
        }))
    })
}

/// Bind `W → D`.
///
/// Inbound payloads that fail to decode are logged and dropped; the
/// subscription keeps receiving.
pub fn reg_subscriber<D, W, F>(plugin: &mut BridgePlugin, convert: F) -> Result<(), BridgeError>
where
    D: 'static,
    W: WireMessage,
    F: Fn(W) -> D + Send + Sync + 'static,
{
    plugin.add_type::<D>(W::TYPE_NAME);
    let convert = Arc::new(convert);
    plugin.add_subscriber_creator::<D>(move |conn, topic, callback| {
        let convert = Arc::clone(&convert);
        let topic_name = topic.to_string();
        conn.add_subscriber(
            topic,
            W::TYPE_NAME,
            Box::new(move |raw: &[u8]| match unserialize::<W>(raw) {
                Ok(msg) => callback(convert(msg)),
                Err(e) => warn!(
                    topic = %topic_name,
                    type_name = W::TYPE_NAME,
                    error = %e,
                    "dropping malformed inbound message"
                ),
            }),
        )?;
        Ok(SubscriptionHandle::new(topic, W::TYPE_NAME))
    })
}

/// Bind a service `ArgW → Arg`, `Res → ResW`.
///
/// The service is advertised under `ResW::TYPE_NAME`.  A request whose
/// argument fails to decode is answered with the error and never reaches the
/// handler.
pub fn reg_service<Arg, ArgW, Res, ResW, FA, FR>(
    plugin: &mut BridgePlugin,
    arg_convert: FA,
    res_convert: FR,
) -> Result<(), BridgeError>
where
    Arg: 'static,
    Res: 'static,
    ArgW: WireMessage,
    ResW: WireMessage,
    FA: Fn(ArgW) -> Arg + Send + Sync + 'static,
    FR: Fn(Res) -> ResW + Send + Sync + 'static,
{
    plugin.add_type::<Arg>(ArgW::TYPE_NAME);
    plugin.add_type::<Res>(ResW::TYPE_NAME);
    let arg_convert = Arc::new(arg_convert);
    let res_convert = Arc::new(res_convert);
    plugin.add_service_creator::<Arg, Res, ArgW, ResW>(move |conn, topic, service| {
        let arg_convert = Arc::clone(&arg_convert);
        let res_convert = Arc::clone(&res_convert);
        conn.add_service(
            topic,
            ResW::TYPE_NAME,
            Box::new(move |raw: &[u8], responder: RawResponder| {
                let arg = match unserialize::<ArgW>(raw) {
                    Ok(msg) => arg_convert(msg),
                    Err(e) => {
                        warn!(
                            topic = %responder.topic(),
                            type_name = ArgW::TYPE_NAME,
                            error = %e,
                            "rejecting malformed service request"
                        );
                        responder.fail(e);
                        return;
                    }
                };
                let res_convert = Arc::clone(&res_convert);
                let responder = Responder::new(responder, move |res: Res| serialize(&res_convert(res)));
                service(arg, responder);
            }),
        )
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
