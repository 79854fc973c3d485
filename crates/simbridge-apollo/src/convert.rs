//! DataType ↔ Apollo message converters.

use chrono::{DateTime, Datelike, Timelike, Utc};
use simbridge_frames::angles::{DEG2RAD, compass_direction, euler_degrees, heading_to_yaw};
use simbridge_frames::axes::{ruf_to_enu, ruf_to_rfu, to_rfu_attitude};
use simbridge_frames::time::utc_to_gps_seconds;
use simbridge_types as data;
use simbridge_types::{GpsPosition, Vec3};

use crate::msg;

const RADAR_MEAS_COUNTER: i32 = 22_800;
const RADAR_RCS: f64 = 11.0;
/// Colliders longer than this are reported as trucks.
const TRUCK_LENGTH: f32 = 5.0;

const GNSS_STD_DEV: f32 = 0.01;
const GNSS_SATELLITES: u32 = 15;

fn header(module: &str, sequence: u32, time: f64) -> msg::Header {
    msg::Header {
        timestamp_sec: time,
        module_name: module.to_string(),
        sequence_num: sequence,
        ..Default::default()
    }
}

fn point(v: Vec3) -> msg::Point3D {
    msg::Point3D {
        x: v.x as f64,
        y: v.y as f64,
        z: v.z as f64,
    }
}

fn quaternion(q: data::Quaternion) -> msg::Quaternion {
    msg::Quaternion {
        qx: q.x as f64,
        qy: q.y as f64,
        qz: q.z as f64,
        qw: q.w as f64,
    }
}

fn nanos(time: f64) -> u64 {
    (time * 1e9) as u64
}

/// `+1` when `v` points against `axis`, `-1` when with it.
fn against(v: Vec3, axis: Vec3) -> f64 {
    if v.dot(axis) > 0.0 { -1.0 } else { 1.0 }
}

// ────────────────────────────────────────────────────────────────────────────
// Perception
// ────────────────────────────────────────────────────────────────────────────

/// Footprint corners of a box of RFU `size` centred on `center`, rotated by
/// the clockwise-from-North `heading` in degrees.
pub fn obstacle_polygon(center: GpsPosition, size: Vec3, heading: f64) -> Vec<msg::Point3D> {
    let angle = -(heading as f32) * DEG2RAD as f32;
    let (s, c) = angle.sin_cos();
    let px = 0.5 * size.x;
    let py = 0.5 * size.y;
    let corner = |x: f32, y: f32| msg::Point3D {
        x: x as f64 + center.easting,
        y: y as f64 + center.northing,
        z: center.altitude,
    };
    vec![
        corner(-px * c + py * s, -px * s - py * c),
        corner(px * c + py * s, px * s - py * c),
        corner(px * c - py * s, px * s + py * c),
        corner(-px * c - py * s, -px * s + py * c),
    ]
}

fn obstacle_type(label: &str) -> msg::ObstacleType {
    match label {
        "Pedestrian" => msg::ObstacleType::Pedestrian,
        _ => msg::ObstacleType::Vehicle,
    }
}

pub fn perception_obstacles(d: &data::Detected3DObjectData) -> msg::PerceptionObstacles {
    msg::PerceptionObstacles {
        header: msg::Header {
            lidar_timestamp: nanos(d.time),
            ..header("perception_obstacle", d.sequence, d.time)
        },
        perception_obstacle: d
            .data
            .iter()
            .map(|o| {
                let size = ruf_to_rfu(o.scale);
                msg::PerceptionObstacle {
                    id: o.id as i32,
                    position: msg::Point3D {
                        x: o.gps.easting,
                        y: o.gps.northing,
                        z: o.gps.altitude,
                    },
                    theta: heading_to_yaw(o.heading),
                    velocity: point(ruf_to_rfu(o.velocity)),
                    acceleration: point(ruf_to_rfu(o.acceleration)),
                    width: size.x as f64,
                    length: size.y as f64,
                    height: size.z as f64,
                    polygon_point: obstacle_polygon(o.gps, size, o.heading),
                    tracking_time: o.tracking_time,
                    obstacle_type: obstacle_type(&o.label),
                    timestamp: d.time,
                }
            })
            .collect(),
        error_code: msg::ErrorCode::Ok,
    }
}

fn light_color(label: &str) -> msg::TrafficLightColor {
    match label {
        "green" => msg::TrafficLightColor::Green,
        "yellow" => msg::TrafficLightColor::Yellow,
        "red" => msg::TrafficLightColor::Red,
        _ => msg::TrafficLightColor::Black,
    }
}

pub fn traffic_lights(d: &data::SignalDataArray) -> msg::TrafficLightDetection {
    msg::TrafficLightDetection {
        header: msg::Header {
            timestamp_sec: d.time,
            sequence_num: d.sequence,
            camera_timestamp: nanos(d.time),
            ..Default::default()
        },
        traffic_light: d
            .data
            .iter()
            .map(|s| msg::TrafficLight {
                color: light_color(&s.label),
                id: s.id.clone(),
                confidence: 1.0,
            })
            .collect(),
        contain_lights: !d.data.is_empty(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drivers
// ────────────────────────────────────────────────────────────────────────────

/// Distances and velocities are projections onto the sensor's aim and right
/// axes.  Lateral offsets are positive to the left, closing speed positive.
pub fn conti_radar(d: &data::DetectedRadarObjectData) -> msg::ContiRadar {
    let header = header("conti_radar", d.sequence, d.time);
    msg::ContiRadar {
        contiobs: d
            .data
            .iter()
            .map(|o| {
                let (pos, vel) = (o.relative_position, o.relative_velocity);
                msg::ContiRadarObs {
                    header: header.clone(),
                    clusterortrack: false,
                    obstacle_id: o.id,
                    longitude_dist: pos.project(o.sensor_aim).magnitude() as f64,
                    lateral_dist: pos.project(o.sensor_right).magnitude() as f64
                        * against(pos, o.sensor_right),
                    longitude_vel: vel.project(o.sensor_aim).magnitude() as f64
                        * against(vel, o.sensor_aim),
                    lateral_vel: vel.project(o.sensor_right).magnitude() as f64
                        * against(vel, o.sensor_right),
                    rcs: RADAR_RCS,
                    dynprop: o.state,
                    probexist: 1.0,
                    meas_state: if o.new_detection {
                        msg::ContiRadarObs::MEAS_STATE_NEW
                    } else {
                        msg::ContiRadarObs::MEAS_STATE_EXISTING
                    },
                    oritation_angle: o.sensor_angle,
                    length: o.collider_size.z as f64,
                    width: o.collider_size.x as f64,
                    obstacle_class: if o.collider_size.z > TRUCK_LENGTH {
                        msg::ContiRadarObs::CLASS_TRUCK
                    } else {
                        msg::ContiRadarObs::CLASS_CAR
                    },
                    ..Default::default()
                }
            })
            .collect(),
        object_list_status: msg::ObjectListStatus60A {
            nof_objects: d.data.len() as i32,
            meas_counter: RADAR_MEAS_COUNTER,
            interface_version: 0,
        },
        header,
    }
}

/// Best position solution.  `header.sequence_num` echoes the sample's
/// sequence; the sample itself is not modified.
pub fn gnss_best_pose(d: &data::GpsData) -> msg::GnssBestPose {
    let measurement_time = utc_to_gps_seconds(d.time);
    msg::GnssBestPose {
        header: msg::Header {
            timestamp_sec: measurement_time,
            sequence_num: d.sequence,
            ..Default::default()
        },
        measurement_time,
        sol_status: 0,
        sol_type: 50,
        latitude: d.latitude,
        longitude: d.longitude,
        height_msl: 0.0,
        undulation: 0.0,
        datum_id: 61,
        latitude_std_dev: GNSS_STD_DEV,
        longitude_std_dev: GNSS_STD_DEV,
        height_std_dev: GNSS_STD_DEV,
        base_station_id: "0".to_string(),
        differential_age: 2.0,
        solution_age: 0.0,
        num_sats_tracked: GNSS_SATELLITES,
        num_sats_in_solution: GNSS_SATELLITES,
        num_sats_l1: GNSS_SATELLITES,
        num_sats_multi: 12,
        extended_solution_status: 33,
        galileo_beidou_used_mask: 0,
        gps_glonass_used_mask: 51,
    }
}

pub fn imu(d: &data::ImuData) -> msg::Imu {
    msg::Imu {
        header: msg::Header {
            timestamp_sec: d.time,
            sequence_num: d.sequence,
            ..Default::default()
        },
        measurement_time: d.time,
        measurement_span: d.measurement_span as f32,
        linear_acceleration: point(d.acceleration),
        angular_velocity: point(d.angular_velocity),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Canbus
// ────────────────────────────────────────────────────────────────────────────

pub fn chassis(d: &data::CanBusData) -> msg::Chassis {
    let euler = euler_degrees(d.orientation);
    let gps_time = DateTime::<Utc>::from_timestamp(utc_to_gps_seconds(d.time) as i64, 0)
        .unwrap_or_default();

    msg::Chassis {
        header: header("chassis", d.sequence, d.time),
        engine_started: d.engine_on,
        engine_rpm: d.engine_rpm,
        speed_mps: d.speed,
        odometer_m: 0.0,
        fuel_range_m: 0,
        throttle_percentage: d.throttle,
        brake_percentage: d.braking,
        steering_percentage: -d.steering * 100.0,
        parking_brake: d.parking_brake,
        high_beam_signal: d.high_beam_signal,
        low_beam_signal: d.low_beam_signal,
        left_turn_signal: d.left_turn_signal,
        right_turn_signal: d.right_turn_signal,
        wiper: d.wipers,
        driving_mode: msg::DrivingMode::CompleteAutoDrive,
        gear_location: if d.in_reverse {
            msg::GearPosition::GearReverse
        } else {
            msg::GearPosition::GearDrive
        },
        chassis_gps: msg::ChassisGps {
            latitude: d.latitude,
            longitude: d.longitude,
            gps_valid: true,
            year: gps_time.year(),
            month: gps_time.month() as i32,
            day: gps_time.day() as i32,
            hours: gps_time.hour() as i32,
            minutes: gps_time.minute() as i32,
            seconds: gps_time.second() as i32,
            compass_direction: compass_direction(euler.y) as f64,
            pdop: 0.1,
            is_gps_fault: false,
            is_inferred: false,
            altitude: d.altitude,
            heading: euler.y as f64,
            hdop: 0.1,
            vdop: 0.1,
            quality: msg::GpsQuality::Fix3D,
            num_satellites: GNSS_SATELLITES as i32,
            gps_speed: d.velocity.magnitude() as f64,
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Localization
// ────────────────────────────────────────────────────────────────────────────

/// Map pose of the vehicle reference point.  The attitude is re-expressed
/// in the Right/Forward/Up IMU frame; `heading` is its roll-axis Euler angle
/// in degrees.
pub fn localization_gps(d: &data::GpsOdometryData) -> msg::Gps {
    let attitude = to_rfu_attitude(d.orientation);
    msg::Gps {
        header: msg::Header {
            timestamp_sec: utc_to_gps_seconds(d.time),
            sequence_num: d.sequence,
            ..Default::default()
        },
        localization: msg::Pose {
            position: msg::PointENU {
                x: d.easting,
                y: d.northing,
                z: d.altitude,
            },
            orientation: quaternion(attitude),
            linear_velocity: point(ruf_to_enu(d.velocity)),
            heading: euler_degrees(attitude).z as f64,
            ..Default::default()
        },
    }
}

pub fn corrected_imu(d: &data::CorrectedImuData) -> msg::CorrectedImu {
    let euler = euler_degrees(d.orientation);
    let a = d.acceleration;
    msg::CorrectedImu {
        header: msg::Header {
            timestamp_sec: d.time,
            ..Default::default()
        },
        imu: msg::Pose {
            linear_acceleration: msg::Point3D {
                x: a.x as f64,
                y: a.y as f64,
                z: -(a.z as f64),
            },
            angular_velocity: point(d.angular_velocity),
            heading: euler.z as f64,
            euler_angles: msg::Point3D {
                x: euler.x as f64 * DEG2RAD,
                y: euler.y as f64 * DEG2RAD,
                z: euler.z as f64 * DEG2RAD,
            },
            ..Default::default()
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Control
// ────────────────────────────────────────────────────────────────────────────

pub fn control_command(m: msg::ControlCommand) -> data::VehicleControlData {
    data::VehicleControlData {
        time_stamp_sec: Some(m.header.timestamp_sec),
        acceleration: Some((m.throttle / 100.0) as f32),
        braking: Some((m.brake / 100.0) as f32),
        steer_rate: Some(m.steering_rate as f32),
        steer_target: Some((m.steering_target / 100.0) as f32),
        ..Default::default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use simbridge_types::{Detected3DObject, Quaternion};
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-5;

    fn make_obstacle(label: &str, heading: f64) -> Detected3DObject {
        Detected3DObject {
            id: 11,
            label: label.into(),
            scale: Vec3::new(2.0, 1.5, 4.0),
            velocity: Vec3::new(1.0, 0.5, 8.0),
            gps: GpsPosition {
                easting: 1000.0,
                northing: 2000.0,
                altitude: 10.0,
            },
            heading,
            tracking_time: 3.5,
            ..Default::default()
        }
    }

    #[test]
    fn obstacle_frame_and_heading() {
        let out = perception_obstacles(&data::Detected3DObjectData {
            time: 12.5,
            sequence: 4,
            data: vec![make_obstacle("Sedan", 0.0)],
            ..Default::default()
        });
        assert_eq!(out.header.module_name, "perception_obstacle");
        assert_eq!(out.header.lidar_timestamp, 12_500_000_000);
        assert_eq!(out.error_code, msg::ErrorCode::Ok);

        let o = &out.perception_obstacle[0];
        assert_eq!(o.obstacle_type, msg::ObstacleType::Vehicle);
        assert!((o.theta - FRAC_PI_2).abs() < EPS);
        assert_eq!(o.velocity, msg::Point3D { x: 1.0, y: 8.0, z: 0.5 });
        assert_eq!((o.width, o.length, o.height), (2.0, 4.0, 1.5));
        assert_eq!(o.position, msg::Point3D { x: 1000.0, y: 2000.0, z: 10.0 });
        assert_eq!(o.tracking_time, 3.5);
        assert_eq!(o.timestamp, 12.5);
    }

    #[test]
    fn heading_east_is_zero_theta() {
        let out = perception_obstacles(&data::Detected3DObjectData {
            data: vec![make_obstacle("Pedestrian", 90.0)],
            ..Default::default()
        });
        let o = &out.perception_obstacle[0];
        assert!(o.theta.abs() < EPS);
        assert_eq!(o.obstacle_type, msg::ObstacleType::Pedestrian);
    }

    #[test]
    fn polygon_corners_of_north_facing_box() {
        let center = GpsPosition {
            easting: 100.0,
            northing: 50.0,
            altitude: 2.0,
        };
        let corners = obstacle_polygon(center, Vec3::new(2.0, 4.0, 1.5), 0.0);
        let expected = [(99.0, 48.0), (101.0, 48.0), (101.0, 52.0), (99.0, 52.0)];
        for (p, (x, y)) in corners.iter().zip(expected) {
            assert!((p.x - x).abs() < EPS && (p.y - y).abs() < EPS, "{p:?}");
            assert_eq!(p.z, 2.0);
        }
    }

    #[test]
    fn polygon_is_centred_for_any_heading() {
        let center = GpsPosition {
            easting: -30.0,
            northing: 7.0,
            altitude: 0.0,
        };
        for heading in [0.0, 33.0, 90.0, 181.0, 270.0] {
            let corners = obstacle_polygon(center, Vec3::new(1.8, 4.6, 1.5), heading);
            let mx: f64 = corners.iter().map(|p| p.x).sum::<f64>() / 4.0;
            let my: f64 = corners.iter().map(|p| p.y).sum::<f64>() / 4.0;
            assert!((mx + 30.0).abs() < EPS && (my - 7.0).abs() < EPS);
        }
    }

    #[test]
    fn traffic_light_colours() {
        let make = |label: &str| data::SignalData {
            id: format!("signal_{label}"),
            label: label.into(),
            ..Default::default()
        };
        let out = traffic_lights(&data::SignalDataArray {
            time: 2.0,
            data: vec![make("green"), make("yellow"), make("red"), make("flashing")],
            ..Default::default()
        });
        let colors: Vec<_> = out.traffic_light.iter().map(|l| l.color).collect();
        assert_eq!(
            colors,
            vec![
                msg::TrafficLightColor::Green,
                msg::TrafficLightColor::Yellow,
                msg::TrafficLightColor::Red,
                msg::TrafficLightColor::Black,
            ]
        );
        assert!(out.contain_lights);
        assert_eq!(out.traffic_light[0].id, "signal_green");
        assert_eq!(out.traffic_light[0].confidence, 1.0);
        assert_eq!(out.header.camera_timestamp, 2_000_000_000);

        let empty = traffic_lights(&data::SignalDataArray::default());
        assert!(!empty.contain_lights);
    }

    #[test]
    fn radar_projection_signs() {
        let out = conti_radar(&data::DetectedRadarObjectData {
            sequence: 9,
            data: vec![data::DetectedRadarObject {
                id: 3,
                sensor_aim: Vec3::new(0.0, 0.0, 1.0),
                sensor_right: Vec3::new(1.0, 0.0, 0.0),
                relative_position: Vec3::new(2.0, 0.0, 10.0),
                relative_velocity: Vec3::new(-1.0, 0.0, -3.0),
                collider_size: Vec3::new(2.5, 3.0, 12.0),
                sensor_angle: 0.25,
                state: 2,
                new_detection: true,
                ..Default::default()
            }],
            ..Default::default()
        });
        assert_eq!(out.header.module_name, "conti_radar");
        assert_eq!(out.object_list_status.nof_objects, 1);
        assert_eq!(out.object_list_status.meas_counter, 22_800);

        let o = &out.contiobs[0];
        assert_eq!(o.header.sequence_num, 9);
        assert!((o.longitude_dist - 10.0).abs() < EPS);
        assert!((o.lateral_dist + 2.0).abs() < EPS);
        assert!((o.longitude_vel - 3.0).abs() < EPS);
        assert!((o.lateral_vel - 1.0).abs() < EPS);
        assert_eq!(o.dynprop, 2);
        assert_eq!(o.meas_state, msg::ContiRadarObs::MEAS_STATE_NEW);
        assert_eq!(o.obstacle_class, msg::ContiRadarObs::CLASS_TRUCK);
        assert_eq!((o.length, o.width), (12.0, 2.5));
        assert_eq!(o.rcs, 11.0);
    }

    #[test]
    fn chassis_gps_time_and_steering() {
        let out = chassis(&data::CanBusData {
            time: 1_600_000_000.0,
            steering: 0.25,
            in_reverse: true,
            velocity: Vec3::new(3.0, 0.0, 4.0),
            orientation: Quaternion::angle_axis(100.0, Vec3::new(0.0, 1.0, 0.0)),
            ..Default::default()
        });
        assert_eq!(out.steering_percentage, -25.0);
        assert_eq!(out.gear_location, msg::GearPosition::GearReverse);
        assert_eq!(out.driving_mode, msg::DrivingMode::CompleteAutoDrive);

        let gps = &out.chassis_gps;
        assert_eq!(
            (gps.year, gps.month, gps.day, gps.hours, gps.minutes, gps.seconds),
            (2010, 9, 9, 12, 26, 58)
        );
        assert_eq!(gps.compass_direction, 90.0);
        assert!((gps.heading - 100.0).abs() < 1e-3);
        assert_eq!(gps.quality, msg::GpsQuality::Fix3D);
        assert_eq!(gps.num_satellites, 15);
        assert!((gps.gps_speed - 5.0).abs() < EPS);
    }

    #[test]
    fn best_pose_uses_gps_time() {
        let sample = data::GpsData {
            time: 1_600_000_000.5,
            sequence: 17,
            latitude: 37.4,
            longitude: -122.1,
            ..Default::default()
        };
        let out = gnss_best_pose(&sample);
        assert_eq!(out.measurement_time, 1_284_035_218.5);
        assert_eq!(out.header.timestamp_sec, out.measurement_time);
        assert_eq!(out.header.sequence_num, 17);
        assert_eq!(sample.sequence, 17);
        assert_eq!((out.sol_type, out.datum_id), (50, 61));
        assert_eq!(out.base_station_id, "0");
        assert_eq!(out.num_sats_multi, 12);
        assert_eq!(out.gps_glonass_used_mask, 51);
    }

    #[test]
    fn localization_rotates_attitude_and_velocity() {
        let out = localization_gps(&data::GpsOdometryData {
            easting: 5.0,
            northing: 6.0,
            altitude: 7.0,
            velocity: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        });
        let pose = &out.localization;
        assert_eq!(pose.position, msg::PointENU { x: 5.0, y: 6.0, z: 7.0 });
        assert_eq!(pose.linear_velocity, msg::Point3D { x: 1.0, y: 3.0, z: 2.0 });
        assert!((pose.heading - 270.0).abs() < 1e-3);
        let q = pose.orientation;
        assert!((q.qz + std::f64::consts::FRAC_1_SQRT_2).abs() < EPS);
        assert!((q.qw - std::f64::consts::FRAC_1_SQRT_2).abs() < EPS);
    }

    #[test]
    fn corrected_imu_flips_vertical_acceleration() {
        let out = corrected_imu(&data::CorrectedImuData {
            time: 4.0,
            acceleration: Vec3::new(0.1, 0.2, 9.8),
            angular_velocity: Vec3::new(0.0, 0.0, 0.5),
            ..Default::default()
        });
        assert_eq!(out.header.timestamp_sec, 4.0);
        assert!((out.imu.linear_acceleration.z + 9.8).abs() < EPS);
        assert_eq!(out.imu.angular_velocity.z, 0.5);
        assert_eq!(out.imu.euler_angles, msg::Point3D::default());
    }

    #[test]
    fn imu_copies_measurement_span() {
        let out = imu(&data::ImuData {
            time: 8.0,
            sequence: 2,
            measurement_span: 0.01,
            acceleration: Vec3::new(0.0, 9.8, 0.0),
            ..Default::default()
        });
        assert_eq!(out.measurement_time, 8.0);
        assert!((out.measurement_span - 0.01).abs() < 1e-6);
        assert!((out.linear_acceleration.y - 9.8).abs() < EPS);
    }

    #[test]
    fn control_percentages_are_normalised() {
        let control = control_command(msg::ControlCommand {
            header: msg::Header {
                timestamp_sec: 99.5,
                ..Default::default()
            },
            throttle: 30.0,
            brake: 5.0,
            steering_rate: 120.0,
            steering_target: -50.0,
            ..Default::default()
        });
        assert_eq!(control.acceleration, Some(0.3));
        assert_eq!(control.braking, Some(0.05));
        assert_eq!(control.steer_rate, Some(120.0));
        assert_eq!(control.steer_target, Some(-0.5));
        assert_eq!(control.time_stamp_sec, Some(99.5));
        assert_eq!(control.steer_angle, None);
    }
}
