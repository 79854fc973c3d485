//! The type registry.
//!
//! A [`BridgePlugin`] records, for every bridged DataType, the wire type it
//! is advertised as and the creators that build publishers, subscribers and
//! services for it.  Storage is keyed by [`TypeId`] and type-erased behind
//! `dyn Any`, so one registry holds creators for any number of unrelated
//! DataTypes.  It is built once at startup and only read afterwards.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use simbridge_types::BridgeError;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::primitives::{Publisher, Responder, SubscriptionHandle};
use crate::wire::WireMessage;

/// Simulation-side service implementation.  Receives the converted argument
/// and answers through the [`Responder`], immediately or later.
pub type ServiceHandler<Arg, Res> = Arc<dyn Fn(Arg, Responder<Res>) + Send + Sync>;

/// Callback handed to a subscriber creator.
pub type DataCallback<D> = Box<dyn Fn(D) + Send + Sync>;

type PublisherCreator<D> =
    Arc<dyn Fn(Arc<dyn Connection>, &str) -> Result<Publisher<D>, BridgeError> + Send + Sync>;

type SubscriberCreator<D> = Arc<
    dyn Fn(Arc<dyn Connection>, &str, DataCallback<D>) -> Result<SubscriptionHandle, BridgeError>
        + Send
        + Sync,
>;

type ServiceCreator<Arg, Res> = Arc<
    dyn Fn(Arc<dyn Connection>, &str, ServiceHandler<Arg, Res>) -> Result<(), BridgeError>
        + Send
        + Sync,
>;

type ErasedCreator = Box<dyn Any + Send + Sync>;

/// Implemented by every protocol module.
pub trait BridgeFactory {
    /// Protocol name shown to users, e.g. `"ROS"`.
    fn name(&self) -> &'static str;

    /// Register every supported mapping on `plugin`.
    fn register(&self, plugin: &mut BridgePlugin) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone)]
struct TypeEntry {
    type_name: &'static str,
    descriptors: Vec<&'static str>,
}

/// Registry of bridgeable DataTypes for one protocol.
pub struct BridgePlugin {
    name: String,
    types: HashMap<TypeId, TypeEntry>,
    publishers: HashMap<TypeId, ErasedCreator>,
    subscribers: HashMap<TypeId, ErasedCreator>,
    services: HashMap<(TypeId, TypeId), ErasedCreator>,
    service_wires: HashSet<(TypeId, TypeId)>,
}

impl BridgePlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: HashMap::new(),
            publishers: HashMap::new(),
            subscribers: HashMap::new(),
            services: HashMap::new(),
            service_wires: HashSet::new(),
        }
    }

    /// Build a registry populated by `factory`.
    ///
    /// # Errors
    ///
    /// Propagates the first [`BridgeError::Registration`] the factory hits;
    /// a half-built registry is never returned.
    pub fn from_factory(factory: &dyn BridgeFactory) -> Result<Self, BridgeError> {
        let mut plugin = Self::new(factory.name());
        factory.register(&mut plugin)?;
        info!(
            protocol = factory.name(),
            types = plugin.types.len(),
            publishers = plugin.publishers.len(),
            subscribers = plugin.subscribers.len(),
            services = plugin.services.len(),
            "bridge registry ready"
        );
        Ok(plugin)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -----------------------------------------------------------------------
    // Capability advertisement
    // -----------------------------------------------------------------------

    /// Record that `D` is bridged as `descriptor`.
    ///
    /// The first descriptor becomes canonical; other distinct descriptors are
    /// kept as alternates; repeating a pair has no effect.
    pub fn add_type<D: 'static>(&mut self, descriptor: &'static str) {
        let entry = self.types.entry(TypeId::of::<D>()).or_insert_with(|| TypeEntry {
            type_name: short_type_name::<D>(),
            descriptors: Vec::new(),
        });
        if !entry.descriptors.contains(&descriptor) {
            entry.descriptors.push(descriptor);
        }
    }

    /// Canonical wire descriptor of `D`, if `D` is bridgeable.
    pub fn message_type<D: 'static>(&self) -> Option<&'static str> {
        self.types
            .get(&TypeId::of::<D>())
            .and_then(|e| e.descriptors.first().copied())
    }

    /// Every descriptor recorded for `D`, canonical first.
    pub fn message_types<D: 'static>(&self) -> &[&'static str] {
        self.types
            .get(&TypeId::of::<D>())
            .map(|e| e.descriptors.as_slice())
            .unwrap_or(&[])
    }

    /// `(DataType name, canonical descriptor)` for every bridgeable type,
    /// sorted by name.
    pub fn capabilities(&self) -> Vec<(&'static str, &'static str)> {
        let mut caps: Vec<_> = self
            .types
            .values()
            .filter_map(|e| e.descriptors.first().map(|d| (e.type_name, *d)))
            .collect();
        caps.sort_unstable();
        caps
    }

    // -----------------------------------------------------------------------
    // Creator registration
    // -----------------------------------------------------------------------

    pub fn add_publisher_creator<D: 'static>(
        &mut self,
        creator: impl Fn(Arc<dyn Connection>, &str) -> Result<Publisher<D>, BridgeError>
        + Send
        + Sync
        + 'static,
    ) -> Result<(), BridgeError> {
        let key = TypeId::of::<D>();
        if self.publishers.contains_key(&key) {
            return Err(BridgeError::registration(format!(
                "duplicate publisher creator for {}",
                short_type_name::<D>()
            )));
        }
        let creator: PublisherCreator<D> = Arc::new(creator);
        self.publishers.insert(key, Box::new(creator));
        debug!(data_type = short_type_name::<D>(), "publisher creator registered");
        Ok(())
    }

    pub fn add_subscriber_creator<D: 'static>(
        &mut self,
        creator: impl Fn(Arc<dyn Connection>, &str, DataCallback<D>) -> Result<SubscriptionHandle, BridgeError>
        + Send
        + Sync
        + 'static,
    ) -> Result<(), BridgeError> {
        let key = TypeId::of::<D>();
        if self.subscribers.contains_key(&key) {
            return Err(BridgeError::registration(format!(
                "duplicate subscriber creator for {}",
                short_type_name::<D>()
            )));
        }
        let creator: SubscriberCreator<D> = Arc::new(creator);
        self.subscribers.insert(key, Box::new(creator));
        debug!(data_type = short_type_name::<D>(), "subscriber creator registered");
        Ok(())
    }

    /// Register a service creator.
    ///
    /// The wire transport can only tell services apart by their
    /// `(ArgW, ResW)` message pair, so that pair must be unique across the
    /// registry.  Topics then distinguish individual services sharing it.
    pub fn add_service_creator<Arg, Res, ArgW, ResW>(
        &mut self,
        creator: impl Fn(Arc<dyn Connection>, &str, ServiceHandler<Arg, Res>) -> Result<(), BridgeError>
        + Send
        + Sync
        + 'static,
    ) -> Result<(), BridgeError>
    where
        Arg: 'static,
        Res: 'static,
        ArgW: WireMessage,
        ResW: WireMessage,
    {
        let wire_key = (TypeId::of::<ArgW>(), TypeId::of::<ResW>());
        if self.service_wires.contains(&wire_key) {
            return Err(BridgeError::registration(format!(
                "service wire pair ({}, {}) is already bound",
                ArgW::TYPE_NAME,
                ResW::TYPE_NAME
            )));
        }
        let data_key = (TypeId::of::<Arg>(), TypeId::of::<Res>());
        if self.services.contains_key(&data_key) {
            return Err(BridgeError::registration(format!(
                "duplicate service creator for ({}, {})",
                short_type_name::<Arg>(),
                short_type_name::<Res>()
            )));
        }
        let creator: ServiceCreator<Arg, Res> = Arc::new(creator);
        self.service_wires.insert(wire_key);
        self.services.insert(data_key, Box::new(creator));
        debug!(
            arg = short_type_name::<Arg>(),
            res = short_type_name::<Res>(),
            wire = ResW::TYPE_NAME,
            "service creator registered"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Instantiation
    // -----------------------------------------------------------------------

    /// Build a publisher for `D` on `topic`.
    pub fn create_publisher<D: 'static>(
        &self,
        conn: Arc<dyn Connection>,
        topic: &str,
    ) -> Result<Publisher<D>, BridgeError> {
        let creator = self
            .publishers
            .get(&TypeId::of::<D>())
            .and_then(|c| c.downcast_ref::<PublisherCreator<D>>())
            .ok_or_else(|| BridgeError::not_registered("publisher", short_type_name::<D>()))?;
        creator(conn, topic)
    }

    /// Subscribe `callback` to `topic`, delivering converted `D` values.
    pub fn create_subscriber<D: 'static>(
        &self,
        conn: Arc<dyn Connection>,
        topic: &str,
        callback: impl Fn(D) + Send + Sync + 'static,
    ) -> Result<SubscriptionHandle, BridgeError> {
        let creator = self
            .subscribers
            .get(&TypeId::of::<D>())
            .and_then(|c| c.downcast_ref::<SubscriberCreator<D>>())
            .ok_or_else(|| BridgeError::not_registered("subscriber", short_type_name::<D>()))?;
        creator(conn, topic, Box::new(callback))
    }

    /// Serve `handler` on `topic`.
    pub fn create_service<Arg: 'static, Res: 'static>(
        &self,
        conn: Arc<dyn Connection>,
        topic: &str,
        handler: impl Fn(Arg, Responder<Res>) + Send + Sync + 'static,
    ) -> Result<(), BridgeError> {
        let creator = self
            .services
            .get(&(TypeId::of::<Arg>(), TypeId::of::<Res>()))
            .and_then(|c| c.downcast_ref::<ServiceCreator<Arg, Res>>())
            .ok_or_else(|| {
                BridgeError::not_registered(
                    "service",
                    &format!("({}, {})", short_type_name::<Arg>(), short_type_name::<Res>()),
                )
            })?;
        creator(conn, topic, Arc::new(handler))
    }

    pub fn has_publisher<D: 'static>(&self) -> bool {
        self.publishers.contains_key(&TypeId::of::<D>())
    }

    pub fn has_subscriber<D: 'static>(&self) -> bool {
        self.subscribers.contains_key(&TypeId::of::<D>())
    }

    pub fn has_service<Arg: 'static, Res: 'static>(&self) -> bool {
        self.services
            .contains_key(&(TypeId::of::<Arg>(), TypeId::of::<Res>()))
    }
}

/// Last path segment of a type name (`simbridge_types::data::ImuData` →
/// `ImuData`).
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::CompletionCallback;
    use crate::loopback::LoopbackConnection;
    use serde::{Deserialize, Serialize};

    struct Speed(f32);
    struct Reset;
    struct Done;

    #[derive(Default, Serialize, Deserialize)]
    struct EmptyMsg {}
    impl WireMessage for EmptyMsg {
        const TYPE_NAME: &'static str = "test_srvs/Empty";
    }

    fn make_plugin() -> BridgePlugin {
        BridgePlugin::new("test")
    }

    fn dummy_publisher(_: Arc<dyn Connection>, topic: &str) -> Result<Publisher<Speed>, BridgeError> {
        Ok(Publisher::new(topic, |_: &Speed, done: CompletionCallback| done(Ok(()))))
    }

    #[test]
    fn first_descriptor_is_canonical_and_alternates_are_kept() {
        let mut plugin = make_plugin();
        plugin.add_type::<Speed>("test_msgs/Speed");
        plugin.add_type::<Speed>("test_msgs/Speed");
        plugin.add_type::<Speed>("test_msgs/SpeedStamped");

        assert_eq!(plugin.message_type::<Speed>(), Some("test_msgs/Speed"));
        assert_eq!(
            plugin.message_types::<Speed>(),
            &["test_msgs/Speed", "test_msgs/SpeedStamped"]
        );
        assert_eq!(plugin.message_type::<Reset>(), None);
        assert!(plugin.message_types::<Reset>().is_empty());
    }

    #[test]
    fn capabilities_are_sorted_by_type_name() {
        let mut plugin = make_plugin();
        plugin.add_type::<Speed>("test_msgs/Speed");
        plugin.add_type::<Done>("test_msgs/Done");
        assert_eq!(
            plugin.capabilities(),
            vec![("Done", "test_msgs/Done"), ("Speed", "test_msgs/Speed")]
        );
    }

    #[test]
    fn duplicate_publisher_creator_is_rejected() {
        let mut plugin = make_plugin();
        plugin.add_publisher_creator::<Speed>(dummy_publisher).unwrap();
        let err = plugin.add_publisher_creator::<Speed>(dummy_publisher).unwrap_err();
        assert!(matches!(err, BridgeError::Registration(_)));
        assert!(plugin.has_publisher::<Speed>());
    }

    #[test]
    fn unknown_publisher_is_not_registered() {
        let plugin = make_plugin();
        let conn: Arc<dyn Connection> = Arc::new(LoopbackConnection::new());
        let err = plugin.create_publisher::<Speed>(conn, "/speed").unwrap_err();
        assert_eq!(err, BridgeError::not_registered("publisher", "Speed"));
    }

    #[test]
    fn created_publisher_uses_registered_creator() {
        let mut plugin = make_plugin();
        plugin.add_publisher_creator::<Speed>(dummy_publisher).unwrap();
        let conn: Arc<dyn Connection> = Arc::new(LoopbackConnection::new());
        let publisher = plugin.create_publisher::<Speed>(conn, "/speed").unwrap();
        assert_eq!(publisher.topic(), "/speed");
    }

    #[test]
    fn service_wire_pair_conflict_is_rejected() {
        let mut plugin = make_plugin();
        plugin
            .add_service_creator::<Reset, Done, EmptyMsg, EmptyMsg>(|_, _, _| Ok(()))
            .unwrap();
        // Different internal types, same wire pair.
        let err = plugin
            .add_service_creator::<Speed, Done, EmptyMsg, EmptyMsg>(|_, _, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Registration(_)));
        assert!(plugin.has_service::<Reset, Done>());
        assert!(!plugin.has_service::<Speed, Done>());
    }

    #[test]
    fn unknown_service_is_not_registered() {
        let plugin = make_plugin();
        let conn: Arc<dyn Connection> = Arc::new(LoopbackConnection::new());
        let err = plugin
            .create_service::<Reset, Done>(conn, "/reset", |_, responder| responder.respond(Done))
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotRegistered { .. }));
    }

    struct TestFactory;

    impl BridgeFactory for TestFactory {
        fn name(&self) -> &'static str {
            "Test"
        }

        fn register(&self, plugin: &mut BridgePlugin) -> Result<(), BridgeError> {
            plugin.add_type::<Speed>("test_msgs/Speed");
            plugin.add_publisher_creator::<Speed>(dummy_publisher)?;
            plugin.add_publisher_creator::<Speed>(dummy_publisher)
        }
    }

    #[test]
    fn factory_registration_errors_abort_construction() {
        let result = BridgePlugin::from_factory(&TestFactory);
        assert!(matches!(result, Err(BridgeError::Registration(_))));
    }

    #[test]
    fn short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name::<Speed>(), "Speed");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }
}
