//! `simbridge-types` – engine-native records shared by every bridge crate.
//!
//! # Modules
//!
//! - [`math`] – small vector, quaternion and affine-matrix primitives in the
//!   engine's Right/Up/Forward convention.
//! - [`data`] – the DataTypes produced by simulated sensors and consumed by
//!   simulated actuators.
//! - [`error`] – [`BridgeError`], the error type spanning registration,
//!   conversion and transport failures.

pub mod data;
pub mod error;
pub mod math;

pub use data::*;
pub use error::BridgeError;
pub use math::{Matrix4, Quaternion, Vec2, Vec3, Vec4};
