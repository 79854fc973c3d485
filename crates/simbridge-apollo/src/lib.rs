//! `simbridge-apollo` – the Apollo protocol module.
//!
//! Apollo expresses vehicle-frame vectors as Right/Forward/Up, world
//! positions as East/North/Up map coordinates, headings counter-clockwise
//! from East in radians and measurement times in GPS seconds.
//!
//! # Modules
//!
//! - [`msg`] – perception, drivers, canbus, localization and control
//!   messages.
//! - [`convert`] – pure DataType ↔ message converters.
//! - [`factory`] – [`ApolloBridgeFactory`].

pub mod convert;
pub mod factory;
pub mod msg;

pub use factory::ApolloBridgeFactory;
