//! Engine math primitives.
//!
//! All vectors are expressed in the engine's left-handed Right/Up/Forward
//! frame (`x` right, `y` up, `z` forward).  Quaternions store their
//! components in `(x, y, z, w)` order to match the engine's layout.
//!
//! # Example
//!
//! ```rust
//! use simbridge_types::math::{Matrix4, Quaternion, Vec3};
//!
//! let m = Matrix4::from_translation(Vec3::new(1.0, 0.0, 0.0));
//! let p = m.multiply_point3x4(Vec3::new(0.5, 2.0, 0.0));
//! assert!((p.x - 1.5).abs() < 1e-6);
//!
//! let q = Quaternion::angle_axis(90.0, Vec3::new(0.0, 1.0, 0.0));
//! let v = q.rotate(Vec3::new(0.0, 0.0, 1.0));
//! assert!((v.x - 1.0).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Vectors
// ────────────────────────────────────────────────────────────────────────────

/// A 2-D vector (image-plane positions and extents).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 3-D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Euclidean length.
    pub fn magnitude(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Projection of `self` onto `onto`.
    ///
    /// Returns the zero vector when `onto` is (numerically) zero-length, so
    /// the result is always finite.
    pub fn project(self, onto: Self) -> Self {
        let sq = onto.dot(onto);
        if sq < f32::EPSILON {
            return Self::zero();
        }
        onto.scale(self.dot(onto) / sq)
    }
}

/// A 4-D vector.  Point-cloud and laser samples carry `(x, y, z)` position
/// plus a normalised intensity in `w`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0 && self.w == 0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation, stored as `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `degrees` around `axis` (assumed normalised).
    pub fn angle_axis(degrees: f32, axis: Vec3) -> Self {
        let half = degrees.to_radians() * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Hamilton product: compose two rotations (`rhs` applied first).
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(v.x, v.y, v.z, 0.0);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Matrix4
// ────────────────────────────────────────────────────────────────────────────

/// A row-major 4x4 matrix used for sensor-to-frame transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix4 {
    pub rows: [[f32; 4]; 4],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4 {
    pub fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn from_translation(t: Vec3) -> Self {
        let mut m = Self::identity();
        m.rows[0][3] = t.x;
        m.rows[1][3] = t.y;
        m.rows[2][3] = t.z;
        m
    }

    /// Uniform scale about the origin.
    pub fn from_scale(k: f32) -> Self {
        let mut m = Self::identity();
        m.rows[0][0] = k;
        m.rows[1][1] = k;
        m.rows[2][2] = k;
        m
    }

    /// Transform a point by the upper 3x4 block (rotation/scale plus
    /// translation), ignoring the projective row.
    pub fn multiply_point3x4(&self, p: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * p.x + r[0][1] * p.y + r[0][2] * p.z + r[0][3],
            r[1][0] * p.x + r[1][1] * p.y + r[1][2] * p.z + r[1][3],
            r[2][0] * p.x + r[2][1] * p.y + r[2][2] * p.z + r[2][3],
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn identity_rotation_leaves_vector_unchanged() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let r = Quaternion::identity().rotate(v);
        assert!(approx(r.x, 1.0) && approx(r.y, 2.0) && approx(r.z, 3.0));
    }

    #[test]
    fn quarter_turn_about_up_maps_forward_to_right() {
        let q = Quaternion::angle_axis(90.0, Vec3::new(0.0, 1.0, 0.0));
        let r = q.rotate(Vec3::new(0.0, 0.0, 1.0));
        assert!(approx(r.x, 1.0), "x = {}", r.x);
        assert!(approx(r.y, 0.0));
        assert!(approx(r.z, 0.0), "z = {}", r.z);
    }

    #[test]
    fn conjugate_undoes_rotation() {
        let q = Quaternion::angle_axis(37.0, Vec3::new(0.0, 0.0, 1.0));
        let v = Vec3::new(0.3, -1.2, 4.0);
        let back = q.conjugate().rotate(q.rotate(v));
        assert!(approx(back.x, v.x) && approx(back.y, v.y) && approx(back.z, v.z));
    }

    #[test]
    fn project_onto_zero_vector_is_zero() {
        let p = Vec3::new(1.0, 2.0, 3.0).project(Vec3::zero());
        assert_eq!(p, Vec3::zero());
    }

    #[test]
    fn project_onto_axis_keeps_component() {
        let p = Vec3::new(1.0, 2.0, 3.0).project(Vec3::new(0.0, 0.0, 2.0));
        assert!(approx(p.z, 3.0));
        assert!(approx(p.magnitude(), 3.0));
    }

    #[test]
    fn matrix_translation_and_scale() {
        let m = Matrix4::from_translation(Vec3::new(0.0, 1.0, -2.0));
        let p = m.multiply_point3x4(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vec3::new(1.0, 2.0, -1.0));

        let s = Matrix4::from_scale(2.0).multiply_point3x4(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s, Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn default_quaternion_and_matrix_are_identity() {
        assert_eq!(Quaternion::default(), Quaternion::identity());
        assert_eq!(Matrix4::default(), Matrix4::identity());
    }
}
