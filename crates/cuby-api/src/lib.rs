// cuby-api: Async Rust client for the Cuby cloud A/C control API

pub mod auth;
pub mod client;
pub mod control;
pub mod devices;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::{CubyClient, DEFAULT_BASE_URL};
pub use error::Error;
pub use models::{
    AcMode, Device, DeviceInfo, DeviceState, DiscoveredDevice, FanSpeed, MAX_TEMPERATURE,
    MIN_TEMPERATURE, StateUpdate, SwingMode, clamp_temperature,
};
pub use transport::{TlsMode, TransportConfig};
