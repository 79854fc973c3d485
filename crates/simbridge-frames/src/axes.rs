//! Axis conventions.
//!
//! | Name | x | y | z | Used by |
//! |---|---|---|---|---|
//! | RUF (engine) | right | up | forward | every DataType |
//! | FLU | forward | left | up | ROS body-frame messages |
//! | RFU | right | forward | up | Apollo vehicle/IMU frame |
//! | ENU | east | north | up | Apollo world frame (engine x = east, z = north) |
//!
//! Each mapping is a permutation plus sign flips, so every forward function
//! has an exact inverse here and `inverse(forward(v)) == v` bit-for-bit.

use simbridge_types::{Quaternion, Vec3};

/// Engine (Right/Up/Forward) position or velocity to Forward/Left/Up.
pub fn ruf_to_flu(v: Vec3) -> Vec3 {
    Vec3::new(v.z, -v.x, v.y)
}

/// Inverse of [`ruf_to_flu`].
pub fn flu_to_ruf(v: Vec3) -> Vec3 {
    Vec3::new(-v.y, v.z, v.x)
}

/// Engine rotation to Forward/Left/Up.
///
/// The handedness change flips the sign of the rotation axis components
/// that do not come from a negated position axis.
pub fn ruf_to_flu_rotation(q: Quaternion) -> Quaternion {
    Quaternion::new(-q.z, q.x, -q.y, q.w)
}

/// Inverse of [`ruf_to_flu_rotation`].
pub fn flu_to_ruf_rotation(q: Quaternion) -> Quaternion {
    Quaternion::new(q.y, -q.z, -q.x, q.w)
}

/// Engine extents (always non-negative) to Forward/Left/Up extents: a pure
/// permutation with no sign flip.
pub fn ruf_to_flu_extent(v: Vec3) -> Vec3 {
    Vec3::new(v.z, v.x, v.y)
}

/// Inverse of [`ruf_to_flu_extent`].
pub fn flu_to_ruf_extent(v: Vec3) -> Vec3 {
    Vec3::new(v.y, v.z, v.x)
}

/// Engine vector to Right/Forward/Up.  Swapping `y` and `z` is its own
/// inverse.
pub fn ruf_to_rfu(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// Inverse of [`ruf_to_rfu`].
pub fn rfu_to_ruf(v: Vec3) -> Vec3 {
    ruf_to_rfu(v)
}

/// Engine world-frame vector to East/North/Up.  The engine's world axes are
/// aligned so that `x` is east and `z` is north.
pub fn ruf_to_enu(v: Vec3) -> Vec3 {
    ruf_to_rfu(v)
}

/// Inverse of [`ruf_to_enu`].
pub fn enu_to_ruf(v: Vec3) -> Vec3 {
    ruf_to_rfu(v)
}

/// Re-express an engine attitude in the Right/Forward/Up vehicle frame:
/// a -90° turn about the forward axis.
pub fn to_rfu_attitude(q: Quaternion) -> Quaternion {
    q.mul(Quaternion::angle_axis(-90.0, Vec3::new(0.0, 0.0, 1.0)))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
