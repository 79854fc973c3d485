//! DataType ↔ ROS message converters.
//!
//! Body-frame messages (detections, radar objects) use Forward/Left/Up.
//! Sensor-native messages (IMU, CAN bus, signals) carry engine vectors as-is,
//! and odometry positions are ENU map coordinates taken from the GPS fix.
//! Each converter allocates its own output; none keeps state between calls.

use simbridge_frames::angles::{DEG2RAD, RAD2DEG};
use simbridge_frames::axes::{
    flu_to_ruf, flu_to_ruf_extent, flu_to_ruf_rotation, ruf_to_flu, ruf_to_flu_extent,
    ruf_to_flu_rotation,
};
use simbridge_frames::WireTime;
use simbridge_types as data;
use simbridge_types::{BridgeError, LaneLinePositionType, LaneLineType, Vec2, Vec3};

use crate::msg;

const COVARIANCE_DIAGONAL: f64 = 0.0001;

#[rustfmt::skip]
const COVARIANCE_3X3: [f64; 9] = [
    COVARIANCE_DIAGONAL, 0.0, 0.0,
    0.0, COVARIANCE_DIAGONAL, 0.0,
    0.0, 0.0, COVARIANCE_DIAGONAL,
];

fn covariance_6x6() -> Vec<f64> {
    (0..36)
        .map(|i| if i % 7 == 0 { COVARIANCE_DIAGONAL } else { 0.0 })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Primitive helpers
// ────────────────────────────────────────────────────────────────────────────

pub fn header(frame: &str, sequence: u32, time: f64) -> msg::Header {
    msg::Header {
        seq: sequence,
        stamp: WireTime::from_secs_f64(time),
        frame_id: frame.to_string(),
    }
}

fn vector(v: Vec3) -> msg::Vector3 {
    msg::Vector3 {
        x: v.x as f64,
        y: v.y as f64,
        z: v.z as f64,
    }
}

fn point(v: Vec3) -> msg::Point {
    msg::Point {
        x: v.x as f64,
        y: v.y as f64,
        z: v.z as f64,
    }
}

fn quaternion(q: data::Quaternion) -> msg::Quaternion {
    msg::Quaternion {
        x: q.x as f64,
        y: q.y as f64,
        z: q.z as f64,
        w: q.w as f64,
    }
}

fn vec3_from_vector(v: msg::Vector3) -> Vec3 {
    Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

fn vec3_from_point(p: msg::Point) -> Vec3 {
    Vec3::new(p.x as f32, p.y as f32, p.z as f32)
}

fn quaternion_from_msg(q: msg::Quaternion) -> data::Quaternion {
    data::Quaternion::new(q.x as f32, q.y as f32, q.z as f32, q.w as f32)
}

// ────────────────────────────────────────────────────────────────────────────
// Cameras and range sensors
// ────────────────────────────────────────────────────────────────────────────

/// Only the first `length` bytes of the engine buffer are the image.
pub fn compressed_image(d: &data::ImageData) -> msg::CompressedImage {
    let length = d.length.min(d.bytes.len());
    msg::CompressedImage {
        header: header(&d.frame, d.sequence, d.time),
        format: "jpeg".to_string(),
        data: d.bytes[..length].to_vec(),
    }
}

/// Points are moved into the scan frame and reduced to their distance.
/// Out-of-range samples become `+inf` with zero intensity.  The engine
/// sweeps clockwise, so the output order is reversed.
///
/// `+inf` has no JSON representation and is emitted as `null`.
pub fn laser_scan(d: &data::LaserScanData) -> msg::LaserScan {
    let count = d.points.len();
    let mut ranges = vec![0.0f32; count];
    let mut intensities = vec![0.0f32; count];

    for (i, p) in d.points.iter().enumerate() {
        let distance = d.transform.multiply_point3x4(p.xyz()).magnitude();
        let (range, intensity) = if distance < d.range_min || distance > d.range_max {
            (f32::INFINITY, 0.0)
        } else {
            (distance, p.w * 255.0)
        };
        let out = count - 1 - i;
        ranges[out] = range;
        intensities[out] = intensity;
    }

    msg::LaserScan {
        header: msg::Header {
            seq: 0,
            ..header(&d.frame, d.sequence, d.time)
        },
        angle_min: d.min_angle,
        angle_max: d.max_angle,
        angle_increment: d.angle_step,
        time_increment: d.time_increment,
        scan_time: d.scan_time,
        range_min: d.range_min,
        range_max: d.range_max,
        ranges,
        intensities,
    }
}

/// Pinhole model with `plumb_bob` distortion `[k1, k2, p1 = 0, p2 = 0, k3]`.
pub fn camera_info(d: &data::CameraInfoData) -> msg::CameraInfo {
    let (fx, fy) = (d.focal_length_x, d.focal_length_y);
    let (cx, cy) = (d.principal_point_x, d.principal_point_y);
    let [k1, k2, k3] = d.distortion_parameters;
    msg::CameraInfo {
        header: header(&d.frame, d.sequence, d.time),
        height: d.height,
        width: d.width,
        distortion_model: "plumb_bob".to_string(),
        d: vec![k1, k2, 0.0, 0.0, k3],
        k: [fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0],
        r: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        p: [fx, 0.0, cx, 0.0, 0.0, fy, cy, 0.0, 0.0, 0.0, 1.0, 0.0],
        binning_x: 0,
        binning_y: 0,
        roi: msg::RegionOfInterest::default(),
    }
}

pub fn ultrasonic(d: &data::UltrasonicData) -> msg::Ultrasonic {
    msg::Ultrasonic {
        header: msg::Header {
            seq: 0,
            ..header(&d.frame, d.sequence, d.time)
        },
        minimum_distance: d.minimum_distance,
    }
}

/// Radar geometry is re-expressed in Forward/Left/Up.
pub fn radar_objects(d: &data::DetectedRadarObjectData) -> msg::DetectedRadarObjectArray {
    msg::DetectedRadarObjectArray {
        header: header(&d.frame, d.sequence, d.time),
        objects: d
            .data
            .iter()
            .map(|o| msg::DetectedRadarObject {
                id: o.id,
                sensor_aim: vector(ruf_to_flu(o.sensor_aim)),
                sensor_right: vector(ruf_to_flu(o.sensor_right)),
                sensor_position: point(ruf_to_flu(o.sensor_position)),
                sensor_velocity: vector(ruf_to_flu(o.sensor_velocity)),
                sensor_angle: o.sensor_angle,
                object_position: point(ruf_to_flu(o.position)),
                object_velocity: vector(ruf_to_flu(o.velocity)),
                object_relative_position: point(ruf_to_flu(o.relative_position)),
                object_relative_velocity: vector(ruf_to_flu(o.relative_velocity)),
                object_collider_size: vector(ruf_to_flu(o.collider_size)),
                object_state: u8::try_from(o.state).unwrap_or(u8::MAX),
                new_detection: o.new_detection,
            })
            .collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Detections
// ────────────────────────────────────────────────────────────────────────────

pub fn detection_2d_array(d: &data::Detected2DObjectData) -> msg::Detection2DArray {
    msg::Detection2DArray {
        header: header(&d.frame, d.sequence, d.time),
        detections: d
            .data
            .iter()
            .map(|o| msg::Detection2D {
                header: msg::Header::default(),
                id: o.id,
                label: o.label.clone(),
                score: o.score as f32,
                bbox: msg::BoundingBox2D {
                    x: o.position.x,
                    y: o.position.y,
                    width: o.scale.x,
                    height: o.scale.y,
                },
                velocity: msg::Twist {
                    linear: vector(o.linear_velocity),
                    angular: vector(o.angular_velocity),
                },
            })
            .collect(),
    }
}

/// Image-plane detections only move along the image x axis and turn about
/// the optical axis, so the other velocity components are dropped.
pub fn detected_2d_objects(m: msg::Detection2DArray) -> data::Detected2DObjectArray {
    data::Detected2DObjectArray {
        data: m
            .detections
            .into_iter()
            .map(|o| data::Detected2DObject {
                id: o.id,
                label: o.label,
                score: o.score as f64,
                position: Vec2::new(o.bbox.x, o.bbox.y),
                scale: Vec2::new(o.bbox.width, o.bbox.height),
                linear_velocity: Vec3::new(o.velocity.linear.x as f32, 0.0, 0.0),
                angular_velocity: Vec3::new(0.0, 0.0, o.velocity.angular.z as f32),
            })
            .collect(),
    }
}

/// Boxes are re-expressed in Forward/Left/Up; yaw rate flips sign with the
/// handedness change.
pub fn detection_3d_array(d: &data::Detected3DObjectData) -> msg::Detection3DArray {
    msg::Detection3DArray {
        header: header(&d.frame, d.sequence, d.time),
        detections: d
            .data
            .iter()
            .map(|o| {
                let angular = Vec3::new(o.angular_velocity.x, o.angular_velocity.y, -o.angular_velocity.z);
                msg::Detection3D {
                    header: msg::Header::default(),
                    id: o.id,
                    label: o.label.clone(),
                    score: o.score as f32,
                    bbox: msg::BoundingBox3D {
                        position: msg::Pose {
                            position: point(ruf_to_flu(o.position)),
                            orientation: quaternion(ruf_to_flu_rotation(o.rotation)),
                        },
                        size: vector(ruf_to_flu_extent(o.scale)),
                    },
                    velocity: msg::Twist {
                        linear: vector(o.linear_velocity),
                        angular: vector(angular),
                    },
                }
            })
            .collect(),
    }
}

/// Inverse of [`detection_3d_array`] for the fields the message carries.
pub fn detected_3d_objects(m: msg::Detection3DArray) -> data::Detected3DObjectArray {
    data::Detected3DObjectArray {
        data: m
            .detections
            .into_iter()
            .map(|o| {
                let angular = vec3_from_vector(o.velocity.angular);
                data::Detected3DObject {
                    id: o.id,
                    label: o.label,
                    score: o.score as f64,
                    position: flu_to_ruf(vec3_from_point(o.bbox.position.position)),
                    rotation: flu_to_ruf_rotation(quaternion_from_msg(o.bbox.position.orientation)),
                    scale: flu_to_ruf_extent(vec3_from_vector(o.bbox.size)),
                    linear_velocity: vec3_from_vector(o.velocity.linear),
                    angular_velocity: Vec3::new(angular.x, angular.y, -angular.z),
                    ..Default::default()
                }
            })
            .collect(),
    }
}

pub fn signal_array(d: &data::SignalDataArray) -> msg::SignalArray {
    msg::SignalArray {
        header: header(&d.frame, d.sequence, d.time),
        signals: d
            .data
            .iter()
            .map(|s| msg::Signal {
                header: msg::Header::default(),
                id: s.seq_id,
                label: s.label.clone(),
                score: s.score as f32,
                bbox: msg::BoundingBox3D {
                    position: msg::Pose {
                        position: point(s.position),
                        orientation: quaternion(s.rotation),
                    },
                    size: vector(s.scale),
                },
            })
            .collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lane lines
// ────────────────────────────────────────────────────────────────────────────

pub fn lane_line_position(position: LaneLinePositionType) -> i8 {
    match position {
        LaneLinePositionType::BollardLeft => msg::LaneLine::BOLLARD_LEFT,
        LaneLinePositionType::FourthLeft => msg::LaneLine::FOURTH_LEFT,
        LaneLinePositionType::ThirdLeft => msg::LaneLine::THIRD_LEFT,
        LaneLinePositionType::AdjacentLeft => msg::LaneLine::ADJACENT_LEFT,
        LaneLinePositionType::EgoLeft => msg::LaneLine::EGO_LEFT,
        LaneLinePositionType::EgoRight => msg::LaneLine::EGO_RIGHT,
        LaneLinePositionType::AdjacentRight => msg::LaneLine::ADJACENT_RIGHT,
        LaneLinePositionType::ThirdRight => msg::LaneLine::THIRD_RIGHT,
        LaneLinePositionType::FourthRight => msg::LaneLine::FOURTH_RIGHT,
        LaneLinePositionType::BollardRight => msg::LaneLine::BOLLARD_RIGHT,
        LaneLinePositionType::Other => msg::LaneLine::OTHER,
        LaneLinePositionType::Unknown => msg::LaneLine::UNKNOWN,
    }
}

/// # Errors
///
/// [`LaneLineType::Curb`] has no lane-line paint code and yields
/// [`BridgeError::OutOfRange`].
pub fn lane_line_type(line_type: LaneLineType) -> Result<u8, BridgeError> {
    match line_type {
        LaneLineType::WhiteDashed => Ok(msg::LaneLine::WHITE_DASHED),
        LaneLineType::WhiteSolid => Ok(msg::LaneLine::WHITE_SOLID),
        LaneLineType::YellowDashed => Ok(msg::LaneLine::YELLOW_DASHED),
        LaneLineType::YellowSolid => Ok(msg::LaneLine::YELLOW_SOLID),
        LaneLineType::Curb => Err(BridgeError::OutOfRange(
            "lane line type Curb has no lgsvl_msgs/LaneLine code".into(),
        )),
    }
}

/// # Errors
///
/// Fails on the first line whose type has no mapping; the whole message is
/// rejected rather than published with that line missing.
pub fn lane_line_array(d: &data::LaneLinesData) -> Result<msg::LaneLineArray, BridgeError> {
    let camera_laneline = d
        .line_data
        .iter()
        .map(|line| {
            let c = line.curve_camera_coord;
            Ok(msg::LaneLine {
                line_type: lane_line_type(line.line_type)?,
                pos_type: lane_line_position(line.position_type),
                curve_camera_coord: msg::LaneLineCubicCurve {
                    longitude_min: c.min_x,
                    longitude_max: c.max_x,
                    a: c.c0,
                    b: c.c1,
                    c: c.c2,
                    d: c.c3,
                },
            })
        })
        .collect::<Result<Vec<_>, BridgeError>>()?;

    Ok(msg::LaneLineArray {
        header: header(&d.frame, d.sequence, d.time),
        camera_laneline,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Localisation
// ────────────────────────────────────────────────────────────────────────────

pub fn clock(d: &data::ClockData) -> msg::Clock {
    msg::Clock {
        clock: WireTime::from_secs_f64(d.clock),
    }
}

/// IMU vectors are published in the engine frame unchanged.
pub fn imu(d: &data::ImuData) -> msg::Imu {
    msg::Imu {
        header: header(&d.frame, d.sequence, d.time),
        orientation: quaternion(d.orientation),
        orientation_covariance: COVARIANCE_3X3,
        angular_velocity: vector(d.angular_velocity),
        angular_velocity_covariance: COVARIANCE_3X3,
        linear_acceleration: vector(d.acceleration),
        linear_acceleration_covariance: COVARIANCE_3X3,
    }
}

/// Pose is the ENU map position of the fix.  Twist is body-frame: forward
/// speed along x and yaw rate about z (engine yaw is about -y).
pub fn odometry(d: &data::GpsOdometryData) -> msg::Odometry {
    msg::Odometry {
        header: header(&d.frame, d.sequence, d.time),
        child_frame_id: d.child_frame.clone(),
        pose: msg::PoseWithCovariance {
            pose: msg::Pose {
                position: msg::Point {
                    x: d.easting,
                    y: d.northing,
                    z: d.altitude,
                },
                orientation: quaternion(d.orientation),
            },
            covariance: covariance_6x6(),
        },
        twist: msg::TwistWithCovariance {
            twist: msg::Twist {
                linear: msg::Vector3 {
                    x: d.forward_speed as f64,
                    y: 0.0,
                    z: 0.0,
                },
                angular: msg::Vector3 {
                    x: 0.0,
                    y: 0.0,
                    z: -(d.angular_velocity.y as f64),
                },
            },
            covariance: covariance_6x6(),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vehicle
// ────────────────────────────────────────────────────────────────────────────

/// The simulated vehicle has no parking-brake channel on this message.
pub fn can_bus(d: &data::CanBusData) -> msg::CanBusData {
    msg::CanBusData {
        header: msg::Header {
            seq: 0,
            ..header(&d.frame, d.sequence, d.time)
        },
        speed_mps: d.speed,
        throttle_pct: d.throttle,
        brake_pct: d.braking,
        steer_pct: d.steering,
        parking_brake_active: false,
        high_beams_active: d.high_beam_signal,
        low_beams_active: d.low_beam_signal,
        hazard_lights_active: d.hazard_lights,
        fog_lights_active: d.fog_lights,
        left_turn_signal_active: d.left_turn_signal,
        right_turn_signal_active: d.right_turn_signal,
        wipers_active: d.wipers,
        reverse_gear_active: d.in_reverse,
        selected_gear: if d.in_reverse {
            msg::CanBusData::GEAR_REVERSE
        } else {
            msg::CanBusData::GEAR_DRIVE
        },
        engine_active: d.engine_on,
        engine_rpm: d.engine_rpm,
        gps_latitude: d.latitude,
        gps_longitude: d.longitude,
        gps_altitude: d.altitude,
        orientation: quaternion(d.orientation),
        linear_velocities: vector(d.velocity),
    }
}

pub fn vehicle_odometry(d: &data::VehicleOdometryData) -> msg::VehicleOdometry {
    msg::VehicleOdometry {
        header: msg::Header {
            stamp: WireTime::from_secs_f64(d.time),
            ..Default::default()
        },
        velocity: d.speed,
        front_wheel_angle: (d.steering_angle_front as f64 * DEG2RAD) as f32,
        rear_wheel_angle: (d.steering_angle_back as f64 * DEG2RAD) as f32,
    }
}

/// `target_gear` is not applied by the simulated vehicle and is dropped.
pub fn vehicle_control(m: msg::VehicleControlData) -> data::VehicleControlData {
    data::VehicleControlData {
        acceleration: Some(m.acceleration_pct),
        braking: Some(m.braking_pct),
        steer_angle: Some((m.target_wheel_angle as f64 * RAD2DEG) as f32),
        ..Default::default()
    }
}

pub fn vehicle_state(m: msg::VehicleStateData) -> data::VehicleStateData {
    data::VehicleStateData {
        time: m.header.stamp.as_secs_f64(),
        blinker: m.blinker_state,
        head_light: m.headlight_state,
        wiper: m.wiper_state,
        gear: m.current_gear,
        mode: m.vehicle_mode,
        hand_brake: m.hand_brake_active,
        horn: m.horn_active,
        autonomous: m.autonomous_mode_active,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Services
// ────────────────────────────────────────────────────────────────────────────

pub fn empty_request(_: msg::Empty) -> data::EmptySrv {
    data::EmptySrv
}

pub fn empty_response(_: data::EmptySrv) -> msg::Empty {
    msg::Empty {}
}

pub fn set_bool_request(m: msg::SetBoolRequest) -> data::SetBoolSrv {
    data::SetBoolSrv {
        data: m.data,
        message: String::new(),
    }
}

pub fn set_bool_response(d: data::SetBoolSrv) -> msg::SetBoolResponse {
    msg::SetBoolResponse {
        success: d.data,
        message: d.message,
    }
}

pub fn trigger_response(d: data::TriggerSrv) -> msg::TriggerResponse {
    msg::TriggerResponse {
        success: d.data,
        message: d.message,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
