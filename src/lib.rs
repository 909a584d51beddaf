//! Blackmagic Speed Editor driver
//!
//! Configuration and device opening shared by the `speededitor` binary.
//! The protocol itself lives in the `speededitor` crate, HID access in
//! `speededitor-transport`.

pub mod config;
pub mod device;

pub use config::{DeviceConfig, DriverConfig};
pub use device::open_transport;
