//! Apollo registration.

use simbridge_core::{BridgeFactory, BridgePlugin, reg_publisher, reg_subscriber};
use simbridge_types::{
    BridgeError, CanBusData, CorrectedImuData, Detected3DObjectData, DetectedRadarObjectData,
    GpsData, GpsOdometryData, ImuData, SignalDataArray, VehicleControlData,
};

use crate::convert;
use crate::msg;

/// Binds the engine DataTypes to the Apollo message family.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApolloBridgeFactory;

impl BridgeFactory for ApolloBridgeFactory {
    fn name(&self) -> &'static str {
        "Apollo"
    }

    fn register(&self, plugin: &mut BridgePlugin) -> Result<(), BridgeError> {
        reg_publisher::<Detected3DObjectData, msg::PerceptionObstacles, _>(
            plugin,
            convert::perception_obstacles,
        )?;
        reg_publisher::<SignalDataArray, msg::TrafficLightDetection, _>(
            plugin,
            convert::traffic_lights,
        )?;
        reg_publisher::<DetectedRadarObjectData, msg::ContiRadar, _>(plugin, convert::conti_radar)?;
        reg_publisher::<CanBusData, msg::Chassis, _>(plugin, convert::chassis)?;
        reg_publisher::<GpsData, msg::GnssBestPose, _>(plugin, convert::gnss_best_pose)?;
        reg_publisher::<GpsOdometryData, msg::Gps, _>(plugin, convert::localization_gps)?;
        reg_publisher::<ImuData, msg::Imu, _>(plugin, convert::imu)?;
        reg_publisher::<CorrectedImuData, msg::CorrectedImu, _>(plugin, convert::corrected_imu)?;

        reg_subscriber::<VehicleControlData, msg::ControlCommand, _>(
            plugin,
            convert::control_command,
        )?;

        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use simbridge_core::{Connection, LoopbackConnection};
    use simbridge_types::{EmptySrv, PointCloudData};
    use std::sync::{Arc, Mutex};

    fn make_plugin() -> BridgePlugin {
        BridgePlugin::from_factory(&ApolloBridgeFactory).unwrap()
    }

    #[test]
    fn chassis_published_under_apollo_descriptor() {
        let plugin = make_plugin();
        let conn = LoopbackConnection::new();
        let mut publisher = plugin
            .create_publisher::<CanBusData>(Arc::new(conn.clone()), "/apollo/canbus/chassis")
            .unwrap();
        assert_eq!(conn.advertised("/apollo/canbus/chassis"), Some("apollo.canbus.Chassis"));

        publisher.publish(
            &CanBusData {
                speed: 12.0,
                ..Default::default()
            },
            |_| {},
        );
        let chassis: msg::Chassis = conn.sent()[0].decode().unwrap();
        assert_eq!(chassis.speed_mps, 12.0);
        assert_eq!(chassis.header.module_name, "chassis");
    }

    #[test]
    fn control_command_subscription() {
        let plugin = make_plugin();
        let conn = LoopbackConnection::new();
        let shared: Arc<dyn Connection> = Arc::new(conn.clone());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        plugin
            .create_subscriber::<VehicleControlData>(shared, "/apollo/control", move |c| {
                sink.lock().unwrap().push(c)
            })
            .unwrap();

        conn.deliver("/apollo/control", br#"{"throttle": 50.0, "brake": 0.0}"#);
        let received = received.lock().unwrap();
        assert_eq!(received[0].acceleration, Some(0.5));
        assert_eq!(received[0].braking, Some(0.0));
    }

    #[test]
    fn registry_is_independent_of_ros() {
        let plugin = make_plugin();
        assert_eq!(plugin.name(), "Apollo");
        assert_eq!(
            plugin.message_type::<ImuData>(),
            Some("apollo.drivers.gnss.Imu")
        );
        assert_eq!(
            plugin.message_type::<GpsData>(),
            Some("apollo.drivers.gnss.GnssBestPose")
        );
        assert!(!plugin.has_publisher::<PointCloudData>());
        assert!(!plugin.has_service::<EmptySrv, EmptySrv>());
        assert_eq!(plugin.capabilities().len(), 9);
    }
}
