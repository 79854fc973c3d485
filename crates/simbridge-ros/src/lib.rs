//! `simbridge-ros` – the ROS 1 protocol module.
//!
//! Registers every engine DataType the simulator can exchange with a ROS
//! stack through `rosbridge_server`.  Body-frame geometry is converted to the
//! ROS Forward/Left/Up convention (REP 103); map positions are East/North/Up.
//!
//! # Modules
//!
//! - [`msg`] – `std_msgs`, `geometry_msgs`, `sensor_msgs`, `nav_msgs`,
//!   `nmea_msgs`, `std_srvs` and `lgsvl_msgs` definitions.
//! - [`convert`] – pure DataType ↔ message converters.
//! - [`point_cloud`] – the binary `PointCloud2` writer.
//! - [`nmea`] – the two-sentence NMEA writer for GNSS samples.
//! - [`factory`] – [`RosBridgeFactory`], which wires all of the above into a
//!   [`BridgePlugin`](simbridge_core::BridgePlugin).

pub mod convert;
pub mod factory;
pub mod msg;
pub mod nmea;
pub mod point_cloud;

pub use factory::RosBridgeFactory;
