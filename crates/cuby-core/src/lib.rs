// cuby-core: Host-facing adapters between cuby-api and a home-automation host.

pub mod climate;
pub mod config;
pub mod config_flow;
pub mod entity;
pub mod error;
pub mod registry;
pub mod sensor;
pub mod setup;

/// Integration domain, used for unique ids and device identifiers.
pub const DOMAIN: &str = "cuby";

// ── Primary re-exports ──────────────────────────────────────────────
pub use climate::CubyClimate;
pub use config::IntegrationConfig;
pub use config_flow::{ConfigEntries, ConfigFlow, FlowError, FlowResult, UserInput};
pub use entity::{
    ClimateEntity, ClimateFeature, DeviceDescriptor, Entity, EntityRegistry, FanMode, HvacMode,
    Platform, PlatformEntities, SensorDeviceClass, SensorEntity, SensorStateClass, SensorValue,
    TemperatureUnit,
};
pub use error::CoreError;
pub use registry::{EntityCollection, EntitySnapshot, PollFailure};
pub use sensor::{CubyModeSensor, CubyOnlineSensor, CubyWifiSensor};
pub use setup::{ConfigEntry, CubyIntegration, setup_entry, setup_integration};

// Re-export the API crate so hosts need a single dependency.
pub use cuby_api;
