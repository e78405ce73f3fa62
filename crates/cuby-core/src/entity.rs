// ── Host entity contracts ──
//
// The surface a home-automation host sees. Adapters implement these traits;
// the host polls `async_update`, reads attributes, and calls the setters.
// Vocabulary here is the host's (HVAC/fan modes), not the Cuby wire format.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, VariantNames};

use crate::DOMAIN;
use crate::error::CoreError;

// ── Vocabularies ─────────────────────────────────────────────────────

/// Host-side HVAC mode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Auto,
    Dry,
    FanOnly,
}

/// Host-side fan mode. Wider than what Cuby units offer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FanMode {
    On,
    Off,
    Auto,
    Low,
    Medium,
    High,
    Top,
    Middle,
    Focus,
    Diffuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClimateFeature {
    TargetTemperature,
    FanMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "°C")]
    Celsius,
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => f.write_str("°C"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorDeviceClass {
    SignalStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorStateClass {
    Measurement,
}

/// Native value of a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Device registry info ─────────────────────────────────────────────

/// Groups entities under one physical unit in the host's device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    /// `(domain, device id)` pairs.
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: Option<String>,
}

impl DeviceDescriptor {
    pub const MANUFACTURER: &'static str = "Cuby";
    pub const DEFAULT_MODEL: &'static str = "AC Controller";

    pub fn for_device(device: &cuby_api::Device) -> Self {
        Self {
            identifiers: vec![(DOMAIN.to_owned(), device.id.clone())],
            name: device.display_name(),
            manufacturer: Self::MANUFACTURER.to_owned(),
            model: device
                .model
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_MODEL.to_owned()),
            sw_version: device.firmware_version.clone(),
        }
    }
}

// ── Entity traits ────────────────────────────────────────────────────

/// Anything the host polls and displays.
#[async_trait]
pub trait Entity: Send + Sync {
    /// Stable id, unique within the domain.
    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    fn device_info(&self) -> &DeviceDescriptor;

    /// `false` after a failed poll until the next successful one.
    fn available(&self) -> bool {
        true
    }

    /// Refresh cached attributes from the cloud.
    async fn async_update(&mut self) -> Result<(), CoreError>;
}

/// A controllable thermostat-like entity.
#[async_trait]
pub trait ClimateEntity: Entity {
    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    fn current_temperature(&self) -> Option<f64>;

    fn target_temperature(&self) -> Option<f64>;

    fn hvac_mode(&self) -> Option<HvacMode>;

    fn hvac_modes(&self) -> &[HvacMode];

    fn fan_mode(&self) -> Option<FanMode>;

    fn fan_modes(&self) -> &[FanMode];

    fn supported_features(&self) -> &[ClimateFeature];

    fn min_temp(&self) -> f64 {
        cuby_api::MIN_TEMPERATURE
    }

    fn max_temp(&self) -> f64 {
        cuby_api::MAX_TEMPERATURE
    }

    fn target_temperature_step(&self) -> f64 {
        1.0
    }

    async fn async_set_temperature(&self, temperature: f64) -> Result<(), CoreError>;

    async fn async_set_hvac_mode(&self, mode: HvacMode) -> Result<(), CoreError>;

    /// Takes the host's raw fan string; unknown or unmapped values are
    /// rejected with [`CoreError::UnsupportedFanMode`].
    async fn async_set_fan_mode(&self, fan_mode: &str) -> Result<(), CoreError>;

    async fn async_turn_on(&self) -> Result<(), CoreError>;

    async fn async_turn_off(&self) -> Result<(), CoreError>;
}

/// A read-only value.
pub trait SensorEntity: Entity {
    fn native_value(&self) -> Option<SensorValue>;

    fn native_unit_of_measurement(&self) -> Option<&str> {
        None
    }

    fn device_class(&self) -> Option<SensorDeviceClass> {
        None
    }

    fn state_class(&self) -> Option<SensorStateClass> {
        None
    }
}

// ── Registration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Climate,
    Sensor,
}

/// A batch of entities for one platform.
pub enum PlatformEntities {
    Climate(Vec<Box<dyn ClimateEntity>>),
    Sensor(Vec<Box<dyn SensorEntity>>),
}

impl PlatformEntities {
    pub fn platform(&self) -> Platform {
        match self {
            Self::Climate(_) => Platform::Climate,
            Self::Sensor(_) => Platform::Sensor,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Climate(e) => e.len(),
            Self::Sensor(e) => e.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PlatformEntities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformEntities")
            .field("platform", &self.platform())
            .field("count", &self.len())
            .finish()
    }
}

/// Host hook receiving constructed entities.
pub trait EntityRegistry: Send {
    fn add_entities(&mut self, entities: PlatformEntities);
}
