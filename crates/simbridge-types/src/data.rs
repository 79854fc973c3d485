//! Engine-native DataTypes.
//!
//! Every record below is produced by a simulated sensor (or consumed by a
//! simulated actuator) and handed to the bridge by reference for a single
//! publish call.  Times are fractional Unix-epoch seconds; vectors use the
//! engine's Right/Up/Forward frame.

use serde::{Deserialize, Serialize};

use crate::math::{Matrix4, Quaternion, Vec2, Vec3, Vec4};

// ────────────────────────────────────────────────────────────────────────────
// Cameras
// ────────────────────────────────────────────────────────────────────────────

/// An encoded (JPEG) camera frame.
///
/// `bytes` may be a reusable buffer larger than the frame; only the first
/// `length` bytes belong to the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    pub length: usize,
}

/// Pinhole intrinsics of a camera sensor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraInfoData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub width: u32,
    pub height: u32,
    pub focal_length_x: f64,
    pub focal_length_y: f64,
    pub principal_point_x: f64,
    pub principal_point_y: f64,
    /// Radial distortion `[k1, k2, k3]`.
    pub distortion_parameters: [f64; 3],
}

// ────────────────────────────────────────────────────────────────────────────
// Range sensors
// ────────────────────────────────────────────────────────────────────────────

/// A full LiDAR sweep.  `points` are in sensor space; `lidar_transform`
/// maps them into the published frame.  `w` holds normalised intensity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointCloudData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub lidar_transform: Matrix4,
    pub points: Vec<Vec4>,
}

/// A planar laser scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaserScanData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub min_angle: f32,
    pub max_angle: f32,
    pub angle_step: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub time_increment: f32,
    pub scan_time: f32,
    pub transform: Matrix4,
    pub points: Vec<Vec4>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UltrasonicData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub minimum_distance: f64,
}

/// One radar return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectedRadarObject {
    pub id: i32,
    pub sensor_aim: Vec3,
    pub sensor_right: Vec3,
    pub sensor_position: Vec3,
    pub sensor_velocity: Vec3,
    pub sensor_angle: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub relative_position: Vec3,
    pub relative_velocity: Vec3,
    pub collider_size: Vec3,
    /// 0 = moving, 1 = stationary, 2 = oncoming, …
    pub state: i32,
    pub new_detection: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectedRadarObjectData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub data: Vec<DetectedRadarObject>,
}

// ────────────────────────────────────────────────────────────────────────────
// Ground-truth detections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detected2DObject {
    pub id: u32,
    pub label: String,
    pub score: f64,
    pub position: Vec2,
    pub scale: Vec2,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Outbound 2-D detections from a camera sensor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detected2DObjectData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub data: Vec<Detected2DObject>,
}

/// Inbound 2-D detections to be visualised by the simulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detected2DObjectArray {
    pub data: Vec<Detected2DObject>,
}

/// World-frame GNSS position of an object, in map metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub easting: f64,
    pub northing: f64,
    pub altitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detected3DObject {
    pub id: u32,
    pub label: String,
    pub score: f64,
    pub position: Vec3,
    pub rotation: Quaternion,
    pub scale: Vec3,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// World-frame velocity.
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub gps: GpsPosition,
    /// Degrees clockwise from North.
    pub heading: f64,
    pub tracking_time: f64,
}

/// Outbound 3-D detections from a LiDAR/ground-truth sensor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detected3DObjectData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub data: Vec<Detected3DObject>,
}

/// Inbound 3-D detections to be visualised by the simulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detected3DObjectArray {
    pub data: Vec<Detected3DObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalData {
    /// Map identifier of the signal.
    pub id: String,
    /// Per-frame sequential identifier.
    pub seq_id: u32,
    /// `"green"`, `"yellow"`, `"red"` or anything else for unknown.
    pub label: String,
    pub score: f64,
    pub position: Vec3,
    pub rotation: Quaternion,
    pub scale: Vec3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalDataArray {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub data: Vec<SignalData>,
}

// ────────────────────────────────────────────────────────────────────────────
// Lane lines
// ────────────────────────────────────────────────────────────────────────────

/// Lateral slot of a lane line relative to the ego vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneLinePositionType {
    BollardLeft,
    FourthLeft,
    ThirdLeft,
    AdjacentLeft,
    EgoLeft,
    EgoRight,
    AdjacentRight,
    ThirdRight,
    FourthRight,
    BollardRight,
    Other,
    Unknown,
}

/// Paint style of a lane line.
///
/// [`LaneLineType::Curb`] is produced by the road-edge detector and has no
/// counterpart in the published lane-line message family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneLineType {
    WhiteDashed,
    WhiteSolid,
    YellowDashed,
    YellowSolid,
    Curb,
}

/// `y = c0 + c1·x + c2·x² + c3·x³` in camera coordinates, valid on
/// `[min_x, max_x]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneLineCubicCurve {
    pub c0: f32,
    pub c1: f32,
    pub c2: f32,
    pub c3: f32,
    pub min_x: f32,
    pub max_x: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneLine {
    pub position_type: LaneLinePositionType,
    pub line_type: LaneLineType,
    pub curve_camera_coord: LaneLineCubicCurve,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaneLinesData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub line_data: Vec<LaneLine>,
}

// ────────────────────────────────────────────────────────────────────────────
// Localisation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockData {
    /// Simulation clock, fractional Unix-epoch seconds.
    pub clock: f64,
}

/// A GNSS fix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub easting: f64,
    pub northing: f64,
    pub altitude: f64,
    pub orientation: Quaternion,
}

/// GNSS-aided odometry of the ego vehicle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpsOdometryData {
    pub frame: String,
    pub child_frame: String,
    pub time: f64,
    pub sequence: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub easting: f64,
    pub northing: f64,
    pub altitude: f64,
    pub orientation: Quaternion,
    pub forward_speed: f32,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImuData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub measurement_span: f64,
    pub orientation: Quaternion,
    pub acceleration: Vec3,
    pub angular_velocity: Vec3,
}

/// IMU sample already corrected into the vehicle frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectedImuData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub orientation: Quaternion,
    pub acceleration: Vec3,
    pub angular_velocity: Vec3,
}

// ────────────────────────────────────────────────────────────────────────────
// Vehicle
// ────────────────────────────────────────────────────────────────────────────

/// Chassis telemetry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanBusData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub speed: f32,
    pub throttle: f32,
    pub braking: f32,
    /// Normalised steering in `[-1, 1]`.
    pub steering: f32,
    pub parking_brake: bool,
    pub high_beam_signal: bool,
    pub low_beam_signal: bool,
    pub hazard_lights: bool,
    pub fog_lights: bool,
    pub left_turn_signal: bool,
    pub right_turn_signal: bool,
    pub wipers: bool,
    pub in_reverse: bool,
    pub engine_on: bool,
    pub engine_rpm: f32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub orientation: Quaternion,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleOdometryData {
    pub frame: String,
    pub time: f64,
    pub sequence: u32,
    pub speed: f32,
    /// Degrees.
    pub steering_angle_front: f32,
    /// Degrees.
    pub steering_angle_back: f32,
}

/// Actuator command.  Every field is optional: each protocol sets only the
/// channels it carries and the vehicle keeps its previous value for the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleControlData {
    pub time_stamp_sec: Option<f64>,
    pub acceleration: Option<f32>,
    pub braking: Option<f32>,
    /// Degrees.
    pub steer_angle: Option<f32>,
    pub steer_rate: Option<f32>,
    pub steer_target: Option<f32>,
    pub steer_input: Option<f32>,
}

/// Auxiliary vehicle state requested by an external stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleStateData {
    pub time: f64,
    pub blinker: u8,
    pub head_light: u8,
    pub wiper: u8,
    pub gear: u8,
    pub mode: u8,
    pub hand_brake: bool,
    pub horn: bool,
    pub autonomous: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Service payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptySrv;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetBoolSrv {
    pub data: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerSrv {
    pub data: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_control_defaults_to_no_channels() {
        let c = VehicleControlData::default();
        assert!(c.acceleration.is_none());
        assert!(c.steer_angle.is_none());
    }

    #[test]
    fn lane_line_serialization_roundtrip() {
        let line = LaneLine {
            position_type: LaneLinePositionType::EgoLeft,
            line_type: LaneLineType::YellowSolid,
            curve_camera_coord: LaneLineCubicCurve {
                c0: 1.0,
                max_x: 40.0,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&line).unwrap();
        let back: LaneLine = serde_json::from_str(&json).unwrap();
        assert_eq!(line, back);
    }

    #[test]
    fn default_records_carry_identity_transforms() {
        let scan = LaserScanData::default();
        assert_eq!(scan.transform, Matrix4::identity());
        let gps = GpsData::default();
        assert_eq!(gps.orientation, Quaternion::identity());
    }
}
