//! ROS message family.
//!
//! Field names and types follow the `.msg` definitions so that the JSON
//! bodies are accepted by `rosbridge_server` as-is.  Every struct defaults
//! missing fields, matching how rosbridge fills absent fields with zero
//! values.

use serde::{Deserialize, Serialize};
use simbridge_core::WireMessage;
use simbridge_core::wire::base64_bytes;
use simbridge_frames::WireTime;

macro_rules! wire_message {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl WireMessage for $ty {
            const TYPE_NAME: &'static str = $name;
        })*
    };
}

// ────────────────────────────────────────────────────────────────────────────
// std_msgs / geometry_msgs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub seq: u32,
    pub stamp: WireTime,
    pub frame_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseWithCovariance {
    pub pose: Pose,
    /// Row-major 6x6.
    pub covariance: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwistWithCovariance {
    pub twist: Twist,
    /// Row-major 6x6.
    pub covariance: Vec<f64>,
}

// ────────────────────────────────────────────────────────────────────────────
// sensor_msgs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressedImage {
    pub header: Header,
    pub format: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserScan {
    pub header: Header,
    pub angle_min: f32,
    pub angle_max: f32,
    pub angle_increment: f32,
    pub time_increment: f32,
    pub scan_time: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub ranges: Vec<f32>,
    pub intensities: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionOfInterest {
    pub x_offset: u32,
    pub y_offset: u32,
    pub height: u32,
    pub width: u32,
    pub do_rectify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraInfo {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub distortion_model: String,
    #[serde(rename = "D")]
    pub d: Vec<f64>,
    #[serde(rename = "K")]
    pub k: [f64; 9],
    #[serde(rename = "R")]
    pub r: [f64; 9],
    #[serde(rename = "P")]
    pub p: [f64; 12],
    pub binning_x: u32,
    pub binning_y: u32,
    pub roi: RegionOfInterest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointField {
    pub name: String,
    pub offset: u32,
    pub datatype: u8,
    pub count: u32,
}

impl PointField {
    pub const INT8: u8 = 1;
    pub const UINT8: u8 = 2;
    pub const INT16: u8 = 3;
    pub const UINT16: u8 = 4;
    pub const INT32: u8 = 5;
    pub const UINT32: u8 = 6;
    pub const FLOAT32: u8 = 7;
    pub const FLOAT64: u8 = 8;

    pub fn new(name: &str, offset: u32, datatype: u8) -> Self {
        Self {
            name: name.to_string(),
            offset,
            datatype,
            count: 1,
        }
    }
}

/// Owned form, used to decode published clouds.  The writer serializes a
/// borrowed view with the same layout instead; see
/// [`point_cloud`](crate::point_cloud).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointCloud2 {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub fields: Vec<PointField>,
    pub is_bigendian: bool,
    pub point_step: u32,
    pub row_step: u32,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub is_dense: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Imu {
    pub header: Header,
    pub orientation: Quaternion,
    pub orientation_covariance: [f64; 9],
    pub angular_velocity: Vector3,
    pub angular_velocity_covariance: [f64; 9],
    pub linear_acceleration: Vector3,
    pub linear_acceleration_covariance: [f64; 9],
}

// ────────────────────────────────────────────────────────────────────────────
// nav_msgs / rosgraph_msgs / nmea_msgs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Odometry {
    pub header: Header,
    pub child_frame_id: String,
    pub pose: PoseWithCovariance,
    pub twist: TwistWithCovariance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clock {
    pub clock: WireTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentence {
    pub header: Header,
    pub sentence: String,
}

// ────────────────────────────────────────────────────────────────────────────
// std_srvs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetBoolRequest {
    pub data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetBoolResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// lgsvl_msgs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox2D {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection2D {
    pub header: Header,
    pub id: u32,
    pub label: String,
    pub score: f32,
    pub bbox: BoundingBox2D,
    pub velocity: Twist,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection2DArray {
    pub header: Header,
    pub detections: Vec<Detection2D>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox3D {
    pub position: Pose,
    pub size: Vector3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection3D {
    pub header: Header,
    pub id: u32,
    pub label: String,
    pub score: f32,
    pub bbox: BoundingBox3D,
    pub velocity: Twist,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection3DArray {
    pub header: Header,
    pub detections: Vec<Detection3D>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signal {
    pub header: Header,
    pub id: u32,
    pub label: String,
    pub score: f32,
    pub bbox: BoundingBox3D,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalArray {
    pub header: Header,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneLineCubicCurve {
    pub longitude_min: f32,
    pub longitude_max: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneLine {
    #[serde(rename = "type")]
    pub line_type: u8,
    pub pos_type: i8,
    pub curve_camera_coord: LaneLineCubicCurve,
}

impl LaneLine {
    pub const WHITE_DASHED: u8 = 0;
    pub const WHITE_SOLID: u8 = 1;
    pub const YELLOW_DASHED: u8 = 2;
    pub const YELLOW_SOLID: u8 = 3;

    pub const BOLLARD_LEFT: i8 = -5;
    pub const FOURTH_LEFT: i8 = -4;
    pub const THIRD_LEFT: i8 = -3;
    pub const ADJACENT_LEFT: i8 = -2;
    pub const EGO_LEFT: i8 = -1;
    pub const EGO_RIGHT: i8 = 1;
    pub const ADJACENT_RIGHT: i8 = 2;
    pub const THIRD_RIGHT: i8 = 3;
    pub const FOURTH_RIGHT: i8 = 4;
    pub const BOLLARD_RIGHT: i8 = 5;
    pub const OTHER: i8 = 6;
    pub const UNKNOWN: i8 = 7;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneLineArray {
    pub header: Header,
    pub camera_laneline: Vec<LaneLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ultrasonic {
    pub header: Header,
    pub minimum_distance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanBusData {
    pub header: Header,
    pub speed_mps: f32,
    pub throttle_pct: f32,
    pub brake_pct: f32,
    pub steer_pct: f32,
    pub parking_brake_active: bool,
    pub high_beams_active: bool,
    pub low_beams_active: bool,
    pub hazard_lights_active: bool,
    pub fog_lights_active: bool,
    pub left_turn_signal_active: bool,
    pub right_turn_signal_active: bool,
    pub wipers_active: bool,
    pub reverse_gear_active: bool,
    pub selected_gear: i8,
    pub engine_active: bool,
    pub engine_rpm: f32,
    pub gps_latitude: f64,
    pub gps_longitude: f64,
    pub gps_altitude: f64,
    pub orientation: Quaternion,
    pub linear_velocities: Vector3,
}

impl CanBusData {
    pub const GEAR_NEUTRAL: i8 = 0;
    pub const GEAR_DRIVE: i8 = 1;
    pub const GEAR_REVERSE: i8 = 2;
    pub const GEAR_PARKING: i8 = 3;
    pub const GEAR_LOW: i8 = 4;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectedRadarObject {
    pub id: i32,
    pub sensor_aim: Vector3,
    pub sensor_right: Vector3,
    pub sensor_position: Point,
    pub sensor_velocity: Vector3,
    pub sensor_angle: f64,
    pub object_position: Point,
    pub object_velocity: Vector3,
    pub object_relative_position: Point,
    pub object_relative_velocity: Vector3,
    pub object_collider_size: Vector3,
    pub object_state: u8,
    pub new_detection: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectedRadarObjectArray {
    pub header: Header,
    pub objects: Vec<DetectedRadarObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleOdometry {
    pub header: Header,
    pub velocity: f32,
    /// Radians.
    pub front_wheel_angle: f32,
    /// Radians.
    pub rear_wheel_angle: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleControlData {
    pub header: Header,
    pub acceleration_pct: f32,
    pub braking_pct: f32,
    /// Radians.
    pub target_wheel_angle: f32,
    pub target_wheel_angular_rate: f32,
    pub target_gear: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleStateData {
    pub header: Header,
    pub blinker_state: u8,
    pub headlight_state: u8,
    pub wiper_state: u8,
    pub current_gear: u8,
    pub vehicle_mode: u8,
    pub hand_brake_active: bool,
    pub horn_active: bool,
    pub autonomous_mode_active: bool,
}

wire_message! {
    CompressedImage => "sensor_msgs/CompressedImage",
    LaserScan => "sensor_msgs/LaserScan",
    CameraInfo => "sensor_msgs/CameraInfo",
    PointCloud2 => "sensor_msgs/PointCloud2",
    Imu => "sensor_msgs/Imu",
    Odometry => "nav_msgs/Odometry",
    Clock => "rosgraph_msgs/Clock",
    Sentence => "nmea_msgs/Sentence",
    Empty => "std_srvs/Empty",
    SetBoolRequest => "std_srvs/SetBool",
    SetBoolResponse => "std_srvs/SetBool",
    TriggerResponse => "std_srvs/Trigger",
    Detection2DArray => "lgsvl_msgs/Detection2DArray",
    Detection3DArray => "lgsvl_msgs/Detection3DArray",
    SignalArray => "lgsvl_msgs/SignalArray",
    LaneLineArray => "lgsvl_msgs/LaneLineArray",
    Ultrasonic => "lgsvl_msgs/Ultrasonic",
    CanBusData => "lgsvl_msgs/CanBusData",
    DetectedRadarObjectArray => "lgsvl_msgs/DetectedRadarObjectArray",
    VehicleOdometry => "lgsvl_msgs/VehicleOdometry",
    VehicleControlData => "lgsvl_msgs/VehicleControlData",
    VehicleStateData => "lgsvl_msgs/VehicleStateData",
}
