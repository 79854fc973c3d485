//! Apollo message family.
//!
//! Field names follow the Apollo `.proto` definitions; enums serialize as
//! their proto value names.

use serde::{Deserialize, Serialize};
use simbridge_core::WireMessage;

macro_rules! wire_message {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl WireMessage for $ty {
            const TYPE_NAME: &'static str = $name;
        })*
    };
}

// ────────────────────────────────────────────────────────────────────────────
// common
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub timestamp_sec: f64,
    pub module_name: String,
    pub sequence_num: u32,
    pub lidar_timestamp: u64,
    pub camera_timestamp: u64,
    pub radar_timestamp: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointENU {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    pub qx: f64,
    pub qy: f64,
    pub qz: f64,
    pub qw: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[default]
    Ok,
    PerceptionError,
}

// ────────────────────────────────────────────────────────────────────────────
// perception
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObstacleType {
    #[default]
    Unknown,
    UnknownMovable,
    UnknownUnmovable,
    Pedestrian,
    Bicycle,
    Vehicle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionObstacle {
    pub id: i32,
    pub position: Point3D,
    /// Radians, counter-clockwise from East.
    pub theta: f64,
    pub velocity: Point3D,
    pub acceleration: Point3D,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub polygon_point: Vec<Point3D>,
    pub tracking_time: f64,
    #[serde(rename = "type")]
    pub obstacle_type: ObstacleType,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionObstacles {
    pub header: Header,
    pub perception_obstacle: Vec<PerceptionObstacle>,
    pub error_code: ErrorCode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficLightColor {
    #[default]
    Unknown,
    Red,
    Yellow,
    Green,
    Black,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficLight {
    pub color: TrafficLightColor,
    pub id: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficLightDetection {
    pub header: Header,
    pub traffic_light: Vec<TrafficLight>,
    pub contain_lights: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// drivers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectListStatus60A {
    pub nof_objects: i32,
    pub meas_counter: i32,
    pub interface_version: i32,
}

/// One Continental ARS-408 track.  `oritation_angle` keeps the upstream
/// spelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContiRadarObs {
    pub header: Header,
    pub clusterortrack: bool,
    pub obstacle_id: i32,
    pub longitude_dist: f64,
    pub lateral_dist: f64,
    pub longitude_vel: f64,
    pub lateral_vel: f64,
    pub rcs: f64,
    pub dynprop: i32,
    pub longitude_dist_rms: f64,
    pub lateral_dist_rms: f64,
    pub longitude_vel_rms: f64,
    pub lateral_vel_rms: f64,
    pub probexist: f64,
    pub meas_state: i32,
    pub longitude_accel: f64,
    pub lateral_accel: f64,
    pub oritation_angle: f64,
    pub longitude_accel_rms: f64,
    pub lateral_accel_rms: f64,
    pub oritation_angle_rms: f64,
    pub length: f64,
    pub width: f64,
    pub obstacle_class: i32,
}

impl ContiRadarObs {
    pub const MEAS_STATE_NEW: i32 = 1;
    pub const MEAS_STATE_EXISTING: i32 = 2;
    pub const CLASS_CAR: i32 = 1;
    pub const CLASS_TRUCK: i32 = 2;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContiRadar {
    pub header: Header,
    pub contiobs: Vec<ContiRadarObs>,
    pub object_list_status: ObjectListStatus60A,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GnssBestPose {
    pub header: Header,
    pub measurement_time: f64,
    pub sol_status: u32,
    pub sol_type: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub height_msl: f64,
    pub undulation: f32,
    pub datum_id: u32,
    pub latitude_std_dev: f32,
    pub longitude_std_dev: f32,
    pub height_std_dev: f32,
    pub base_station_id: String,
    pub differential_age: f32,
    pub solution_age: f32,
    pub num_sats_tracked: u32,
    pub num_sats_in_solution: u32,
    pub num_sats_l1: u32,
    pub num_sats_multi: u32,
    pub extended_solution_status: u32,
    pub galileo_beidou_used_mask: u32,
    pub gps_glonass_used_mask: u32,
}

/// Raw IMU sample from the GNSS receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Imu {
    pub header: Header,
    pub measurement_time: f64,
    pub measurement_span: f32,
    pub linear_acceleration: Point3D,
    pub angular_velocity: Point3D,
}

// ────────────────────────────────────────────────────────────────────────────
// canbus
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrivingMode {
    #[default]
    CompleteManual,
    CompleteAutoDrive,
    AutoSteerOnly,
    AutoSpeedOnly,
    EmergencyMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GearPosition {
    #[default]
    GearNeutral,
    GearDrive,
    GearReverse,
    GearParking,
    GearLow,
    GearInvalid,
    GearNone,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpsQuality {
    #[default]
    #[serde(rename = "FIX_NO")]
    FixNo,
    #[serde(rename = "FIX_2D")]
    Fix2D,
    #[serde(rename = "FIX_3D")]
    Fix3D,
    #[serde(rename = "FIX_INVALID")]
    FixInvalid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisGps {
    pub latitude: f64,
    pub longitude: f64,
    pub gps_valid: bool,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
    pub compass_direction: f64,
    pub pdop: f64,
    pub is_gps_fault: bool,
    pub is_inferred: bool,
    pub altitude: f64,
    pub heading: f64,
    pub hdop: f64,
    pub vdop: f64,
    pub quality: GpsQuality,
    pub num_satellites: i32,
    pub gps_speed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chassis {
    pub header: Header,
    pub engine_started: bool,
    pub engine_rpm: f32,
    pub speed_mps: f32,
    pub odometer_m: f32,
    pub fuel_range_m: i32,
    pub throttle_percentage: f32,
    pub brake_percentage: f32,
    pub steering_percentage: f32,
    pub parking_brake: bool,
    pub high_beam_signal: bool,
    pub low_beam_signal: bool,
    pub left_turn_signal: bool,
    pub right_turn_signal: bool,
    pub wiper: bool,
    pub driving_mode: DrivingMode,
    pub gear_location: GearPosition,
    pub chassis_gps: ChassisGps,
}

// ────────────────────────────────────────────────────────────────────────────
// localization
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: PointENU,
    pub orientation: Quaternion,
    pub linear_velocity: Point3D,
    pub linear_acceleration: Point3D,
    pub angular_velocity: Point3D,
    pub heading: f64,
    pub euler_angles: Point3D,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gps {
    pub header: Header,
    pub localization: Pose,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectedImu {
    pub header: Header,
    pub imu: Pose,
}

// ────────────────────────────────────────────────────────────────────────────
// control
// ────────────────────────────────────────────────────────────────────────────

/// Actuation request from the Apollo control module.  Percentages are in
/// `[0, 100]`, steering in `[-100, 100]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlCommand {
    pub header: Header,
    pub throttle: f64,
    pub brake: f64,
    pub steering_rate: f64,
    pub steering_target: f64,
    pub parking_brake: bool,
    pub speed: f64,
    pub acceleration: f64,
    pub driving_mode: DrivingMode,
    pub gear_location: GearPosition,
}

wire_message! {
    PerceptionObstacles => "apollo.perception.PerceptionObstacles",
    TrafficLightDetection => "apollo.perception.TrafficLightDetection",
    ContiRadar => "apollo.drivers.ContiRadar",
    GnssBestPose => "apollo.drivers.gnss.GnssBestPose",
    Imu => "apollo.drivers.gnss.Imu",
    Chassis => "apollo.canbus.Chassis",
    Gps => "apollo.localization.Gps",
    CorrectedImu => "apollo.localization.CorrectedImu",
    ControlCommand => "apollo.control.ControlCommand",
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enums_use_proto_value_names() {
        let v = serde_json::to_value(GpsQuality::Fix3D).unwrap();
        assert_eq!(v, json!("FIX_3D"));
        let v = serde_json::to_value(DrivingMode::CompleteAutoDrive).unwrap();
        assert_eq!(v, json!("COMPLETE_AUTO_DRIVE"));
        let v = serde_json::to_value(GearPosition::GearReverse).unwrap();
        assert_eq!(v, json!("GEAR_REVERSE"));
    }

    #[test]
    fn obstacle_type_field_is_named_type() {
        let obstacle = PerceptionObstacle {
            obstacle_type: ObstacleType::Pedestrian,
            ..Default::default()
        };
        let v = serde_json::to_value(&obstacle).unwrap();
        assert_eq!(v["type"], json!("PEDESTRIAN"));
    }

    #[test]
    fn control_command_accepts_partial_bodies() {
        let cmd: ControlCommand =
            serde_json::from_value(json!({ "throttle": 30.0, "header": { "timestamp_sec": 1.5 } }))
                .unwrap();
        assert_eq!(cmd.throttle, 30.0);
        assert_eq!(cmd.header.timestamp_sec, 1.5);
        assert_eq!(cmd.gear_location, GearPosition::GearNeutral);
    }
}
