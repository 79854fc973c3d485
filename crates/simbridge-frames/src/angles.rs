//! Angle conventions.
//!
//! The engine measures heading clockwise from North in degrees; protocols
//! measure yaw counter-clockwise from East in radians.

use simbridge_types::{Quaternion, Vec3};

pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * (std::f32::consts::PI / 180.0)
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad * (180.0 / std::f32::consts::PI)
}

/// Compass heading (degrees, clockwise from North) to protocol yaw
/// (radians, counter-clockwise from East): `θ = (90 - heading) · π/180`.
pub fn heading_to_yaw(heading_deg: f64) -> f64 {
    (90.0 - heading_deg) * DEG2RAD
}

/// Inverse of [`heading_to_yaw`].
pub fn yaw_to_heading(yaw_rad: f64) -> f64 {
    90.0 - yaw_rad * RAD2DEG
}

/// Euler angles of an engine attitude in degrees, each normalised to
/// `[0, 360)`.
///
/// The engine composes rotations as Z (roll) first, then X (pitch), then
/// Y (yaw), so `x` is pitch, `y` is yaw and `z` is roll.
pub fn euler_degrees(q: Quaternion) -> Vec3 {
    let (x, y, z, w) = (q.x as f64, q.y as f64, q.z as f64, q.w as f64);

    let sin_pitch = (2.0 * (w * x - y * z)).clamp(-1.0, 1.0);
    let pitch = sin_pitch.asin();
    let yaw = (2.0 * (w * y + x * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    let roll = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (x * x + z * z));

    Vec3::new(
        normalize_degrees(pitch * RAD2DEG) as f32,
        normalize_degrees(yaw * RAD2DEG) as f32,
        normalize_degrees(roll * RAD2DEG) as f32,
    )
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Snap a yaw in degrees to the nearest of the eight compass points.
///
/// Ties round to even, so 22.5° snaps to 0° and 67.5° to 90°.
pub fn compass_direction(yaw_deg: f32) -> f32 {
    let wrapped = if yaw_deg >= 0.0 {
        yaw_deg % 360.0
    } else {
        yaw_deg % 360.0 + 360.0
    };
    45.0 * (wrapped / 45.0).round_ties_even()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
