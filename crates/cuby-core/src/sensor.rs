// ── Sensor adapters ──
//
// Three read-only pollers per unit. WiFi signal and online status read the
// device details endpoint; the mode sensor reads the state endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use cuby_api::{CubyClient, Device};
use tracing::debug;

use crate::entity::{
    DeviceDescriptor, Entity, SensorDeviceClass, SensorEntity, SensorStateClass, SensorValue,
};
use crate::error::CoreError;

const SIGNAL_UNIT: &str = "dBm";

/// Fields shared by every Cuby sensor.
struct SensorBase {
    client: Arc<CubyClient>,
    device_id: String,
    unique_id: String,
    name: String,
    device_info: DeviceDescriptor,
    available: bool,
    value: Option<SensorValue>,
}

impl SensorBase {
    fn new(client: Arc<CubyClient>, device: &Device, suffix: &str, label: &str) -> Self {
        let prefix = device.name.as_deref().unwrap_or("Cuby AC");
        Self {
            client,
            device_id: device.id.clone(),
            unique_id: format!("{}_{suffix}", device.id),
            name: format!("{prefix} {label}"),
            device_info: DeviceDescriptor::for_device(device),
            available: true,
            value: None,
        }
    }

    /// Record the outcome of a poll. `None` from `extract` keeps the
    /// previous value (empty payload).
    fn settle<T>(
        &mut self,
        result: Result<T, cuby_api::Error>,
        extract: impl FnOnce(T) -> Option<SensorValue>,
    ) -> Result<(), CoreError> {
        match result {
            Ok(payload) => {
                self.available = true;
                match extract(payload) {
                    Some(value) => self.value = Some(value),
                    None => debug!(unique_id = %self.unique_id, "empty payload, keeping previous value"),
                }
                Ok(())
            }
            Err(e) => {
                self.available = false;
                Err(e.into())
            }
        }
    }
}

/// `Entity` impl forwarding to `base` and the sensor's own `refresh`.
macro_rules! delegate_entity {
    ($ty:ident) => {
        #[async_trait]
        impl Entity for $ty {
            fn unique_id(&self) -> &str {
                &self.base.unique_id
            }

            fn name(&self) -> &str {
                &self.base.name
            }

            fn device_info(&self) -> &DeviceDescriptor {
                &self.base.device_info
            }

            fn available(&self) -> bool {
                self.base.available
            }

            async fn async_update(&mut self) -> Result<(), CoreError> {
                self.refresh().await
            }
        }
    };
}

// ── WiFi signal ──────────────────────────────────────────────────────

/// Received signal strength in dBm.
pub struct CubyWifiSensor {
    base: SensorBase,
}

impl CubyWifiSensor {
    pub fn new(client: Arc<CubyClient>, device: &Device) -> Self {
        Self {
            base: SensorBase::new(client, device, "wifi", "WiFi Signal"),
        }
    }

    async fn refresh(&mut self) -> Result<(), CoreError> {
        let result = self.base.client.try_get_device_info(&self.base.device_id).await;
        self.base.settle(result, |info| {
            if info.is_empty() {
                None
            } else {
                info.wifi_signal.map(|dbm| SensorValue::Int(i64::from(dbm)))
            }
        })
    }
}

delegate_entity!(CubyWifiSensor);

impl SensorEntity for CubyWifiSensor {
    fn native_value(&self) -> Option<SensorValue> {
        self.base.value.clone()
    }

    fn native_unit_of_measurement(&self) -> Option<&str> {
        Some(SIGNAL_UNIT)
    }

    fn device_class(&self) -> Option<SensorDeviceClass> {
        Some(SensorDeviceClass::SignalStrength)
    }

    fn state_class(&self) -> Option<SensorStateClass> {
        Some(SensorStateClass::Measurement)
    }
}

// ── Online status ────────────────────────────────────────────────────

/// `"online"` or `"offline"`; a missing flag counts as offline.
pub struct CubyOnlineSensor {
    base: SensorBase,
}

impl CubyOnlineSensor {
    pub fn new(client: Arc<CubyClient>, device: &Device) -> Self {
        Self {
            base: SensorBase::new(client, device, "online", "Online Status"),
        }
    }

    async fn refresh(&mut self) -> Result<(), CoreError> {
        let result = self.base.client.try_get_device_info(&self.base.device_id).await;
        self.base.settle(result, |info| {
            if info.is_empty() {
                return None;
            }
            let label = if info.online.unwrap_or(false) {
                "online"
            } else {
                "offline"
            };
            Some(SensorValue::Text(label.to_owned()))
        })
    }
}

delegate_entity!(CubyOnlineSensor);

impl SensorEntity for CubyOnlineSensor {
    fn native_value(&self) -> Option<SensorValue> {
        self.base.value.clone()
    }
}

// ── Operating mode ───────────────────────────────────────────────────

/// Raw wire mode, or `"unknown"` when the state omits it.
pub struct CubyModeSensor {
    base: SensorBase,
}

impl CubyModeSensor {
    pub fn new(client: Arc<CubyClient>, device: &Device) -> Self {
        Self {
            base: SensorBase::new(client, device, "mode", "Mode"),
        }
    }

    async fn refresh(&mut self) -> Result<(), CoreError> {
        let result = self.base.client.try_get_device_state(&self.base.device_id).await;
        self.base.settle(result, |state| {
            if state.is_empty() {
                return None;
            }
            let mode = state.mode.unwrap_or_else(|| "unknown".to_owned());
            Some(SensorValue::Text(mode))
        })
    }
}

delegate_entity!(CubyModeSensor);

impl SensorEntity for CubyModeSensor {
    fn native_value(&self) -> Option<SensorValue> {
        self.base.value.clone()
    }
}
