//! wgpu device acquisition.
//!
//! Creates the Instance/Adapter/Device/Queue used by `backend::GpuBackend`.
//! Window and surface creation are left to the embedding application.

mod init;

pub use init::{DeviceInit, request_device, request_device_blocking};
