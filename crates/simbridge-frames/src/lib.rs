//! `simbridge-frames` – coordinate-frame and unit conversion rules.
//!
//! Every value that crosses the bridge boundary passes through one of these
//! pure functions.  There is no universal transform: each message family
//! picks the convention it documents.
//!
//! # Modules
//!
//! - [`axes`] – axis permutations between the engine's Right/Up/Forward
//!   frame and the protocol frames (Forward/Left/Up, Right/Forward/Up,
//!   East/North/Up).
//! - [`angles`] – degree/radian conversion, compass heading to protocol yaw,
//!   and engine-convention Euler angle extraction.
//! - [`time`] – [`WireTime`][time::WireTime]: the `(secs, nsecs)` wire stamp
//!   and GPS-time conversion.

pub mod angles;
pub mod axes;
pub mod time;

pub use time::WireTime;
