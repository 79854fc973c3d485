//! `simbridge-core` – the generic registration and marshaling layer.
//!
//! Protocol modules bind engine DataTypes to wire messages here once at
//! startup; sensors and actuators then ask the registry for a publisher,
//! subscriber or service on a live connection without knowing which
//! protocol sits behind it.
//!
//! # Modules
//!
//! - [`wire`] – the [`WireMessage`] trait and the opaque serialize /
//!   unserialize capability.
//! - [`connection`] – the [`Connection`] transport trait and its raw handler
//!   and responder types.
//! - [`primitives`] – typed handles: [`Publisher`], [`SubscriptionHandle`],
//!   [`Responder`].
//! - [`plugin`] – the type-erased [`BridgePlugin`] registry and the
//!   [`BridgeFactory`] trait implemented by every protocol module.
//! - [`register`] – one-line declarative bindings (`reg_publisher`,
//!   `reg_subscriber`, `reg_service`).
//! - [`loopback`] – an in-memory [`LoopbackConnection`] that records traffic.
//! - [`rosbridge`] – rosbridge v2 JSON framing and a WebSocket
//!   [`RosbridgeConnection`].

pub mod connection;
pub mod loopback;
pub mod plugin;
pub mod primitives;
pub mod register;
pub mod rosbridge;
pub mod wire;

pub use connection::{CompletionCallback, Connection, RawHandler, RawResponder, RawServiceHandler};
pub use loopback::{LoopbackConnection, SentFrame};
pub use plugin::{BridgeFactory, BridgePlugin, ServiceHandler};
pub use primitives::{Publisher, Responder, SubscriptionHandle};
pub use register::{reg_publisher, reg_publisher_fallible, reg_service, reg_subscriber};
pub use rosbridge::RosbridgeConnection;
pub use wire::{WireMessage, serialize, unserialize};
