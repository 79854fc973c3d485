//! ROS registration.

use simbridge_core::{
    BridgeFactory, BridgePlugin, Publisher, WireMessage, reg_publisher, reg_publisher_fallible,
    reg_service, reg_subscriber,
};
use simbridge_types::{
    BridgeError, CameraInfoData, CanBusData, ClockData, Detected2DObjectArray, Detected2DObjectData,
    Detected3DObjectArray, Detected3DObjectData, DetectedRadarObjectData, EmptySrv, GpsData,
    GpsOdometryData, ImageData, ImuData, LaneLinesData, LaserScanData, PointCloudData, SetBoolSrv,
    SignalDataArray, TriggerSrv, UltrasonicData, VehicleControlData, VehicleOdometryData,
    VehicleStateData,
};

use crate::convert;
use crate::msg;
use crate::nmea::{self, NmeaWriter};
use crate::point_cloud::{self, PointCloudWriter};

/// Binds the engine DataTypes to the ROS 1 message family spoken through
/// `rosbridge_server`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RosBridgeFactory;

impl BridgeFactory for RosBridgeFactory {
    fn name(&self) -> &'static str {
        "ROS"
    }

    fn register(&self, plugin: &mut BridgePlugin) -> Result<(), BridgeError> {
        // Point clouds bypass the field converter and pack a binary buffer.
        plugin.add_type::<PointCloudData>(msg::PointCloud2::TYPE_NAME);
        plugin.add_publisher_creator::<PointCloudData>(|conn, topic| {
            point_cloud::advertise(conn.as_ref(), topic)?;
            let mut writer = PointCloudWriter::new(conn, topic);
            Ok(Publisher::new(topic, move |data: &PointCloudData, done| {
                writer.write(data, done)
            }))
        })?;

        reg_publisher::<ImageData, msg::CompressedImage, _>(plugin, convert::compressed_image)?;
        reg_publisher::<LaserScanData, msg::LaserScan, _>(plugin, convert::laser_scan)?;
        reg_publisher::<CameraInfoData, msg::CameraInfo, _>(plugin, convert::camera_info)?;
        reg_publisher::<Detected2DObjectData, msg::Detection2DArray, _>(
            plugin,
            convert::detection_2d_array,
        )?;
        reg_publisher::<ClockData, msg::Clock, _>(plugin, convert::clock)?;
        reg_publisher_fallible::<LaneLinesData, msg::LaneLineArray, _>(
            plugin,
            convert::lane_line_array,
        )?;

        reg_subscriber::<VehicleStateData, msg::VehicleStateData, _>(plugin, convert::vehicle_state)?;
        reg_subscriber::<Detected2DObjectArray, msg::Detection2DArray, _>(
            plugin,
            convert::detected_2d_objects,
        )?;
        reg_subscriber::<Detected3DObjectArray, msg::Detection3DArray, _>(
            plugin,
            convert::detected_3d_objects,
        )?;
        reg_subscriber::<VehicleControlData, msg::VehicleControlData, _>(
            plugin,
            convert::vehicle_control,
        )?;

        reg_service::<EmptySrv, msg::Empty, EmptySrv, msg::Empty, _, _>(
            plugin,
            convert::empty_request,
            convert::empty_response,
        )?;
        reg_service::<SetBoolSrv, msg::SetBoolRequest, SetBoolSrv, msg::SetBoolResponse, _, _>(
            plugin,
            convert::set_bool_request,
            convert::set_bool_response,
        )?;
        reg_service::<EmptySrv, msg::Empty, TriggerSrv, msg::TriggerResponse, _, _>(
            plugin,
            convert::empty_request,
            convert::trigger_response,
        )?;

        // One GNSS sample fans out into two NMEA sentences.
        plugin.add_type::<GpsData>(msg::Sentence::TYPE_NAME);
        plugin.add_publisher_creator::<GpsData>(|conn, topic| {
            nmea::advertise(conn.as_ref(), topic)?;
            let writer = NmeaWriter::new(conn, topic);
            Ok(Publisher::new(topic, move |data: &GpsData, done| {
                writer.write(data, done)
            }))
        })?;

        reg_publisher::<CanBusData, msg::CanBusData, _>(plugin, convert::can_bus)?;
        reg_publisher::<DetectedRadarObjectData, msg::DetectedRadarObjectArray, _>(
            plugin,
            convert::radar_objects,
        )?;
        reg_publisher::<GpsOdometryData, msg::Odometry, _>(plugin, convert::odometry)?;
        reg_publisher::<ImuData, msg::Imu, _>(plugin, convert::imu)?;
        reg_publisher::<Detected3DObjectData, msg::Detection3DArray, _>(
            plugin,
            convert::detection_3d_array,
        )?;
        reg_publisher::<SignalDataArray, msg::SignalArray, _>(plugin, convert::signal_array)?;
        reg_publisher::<UltrasonicData, msg::Ultrasonic, _>(plugin, convert::ultrasonic)?;
        reg_publisher::<VehicleOdometryData, msg::VehicleOdometry, _>(
            plugin,
            convert::vehicle_odometry,
        )?;

        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
