// ── Climate adapter ──
//
// One `CubyClimate` per A/C unit. Mirrors the device state into host
// attributes on poll and translates host commands into state updates.

use std::sync::Arc;

use async_trait::async_trait;
use cuby_api::{AcMode, CubyClient, Device, DeviceState, FanSpeed, StateUpdate};
use tracing::{debug, warn};

use crate::entity::{ClimateEntity, ClimateFeature, DeviceDescriptor, Entity, FanMode, HvacMode};
use crate::error::CoreError;

// ── Mapping tables ───────────────────────────────────────────────────

const HVAC_MODES: [HvacMode; 6] = [
    HvacMode::Off,
    HvacMode::Cool,
    HvacMode::Heat,
    HvacMode::Auto,
    HvacMode::Dry,
    HvacMode::FanOnly,
];

const FAN_MODES: [FanMode; 4] = [FanMode::Auto, FanMode::Low, FanMode::Medium, FanMode::High];

const FEATURES: [ClimateFeature; 2] = [ClimateFeature::TargetTemperature, ClimateFeature::FanMode];

pub fn hvac_from_wire(mode: AcMode) -> HvacMode {
    match mode {
        AcMode::Cool => HvacMode::Cool,
        AcMode::Heat => HvacMode::Heat,
        AcMode::Auto => HvacMode::Auto,
        AcMode::Dry => HvacMode::Dry,
        AcMode::FanOnly => HvacMode::FanOnly,
    }
}

/// `None` for `Off` (a power flag on the wire) and `HeatCool` (no Cuby
/// equivalent).
pub fn hvac_to_wire(mode: HvacMode) -> Option<AcMode> {
    match mode {
        HvacMode::Cool => Some(AcMode::Cool),
        HvacMode::Heat => Some(AcMode::Heat),
        HvacMode::Auto => Some(AcMode::Auto),
        HvacMode::Dry => Some(AcMode::Dry),
        HvacMode::FanOnly => Some(AcMode::FanOnly),
        HvacMode::Off | HvacMode::HeatCool => None,
    }
}

pub fn fan_from_wire(speed: FanSpeed) -> FanMode {
    match speed {
        FanSpeed::Auto => FanMode::Auto,
        FanSpeed::Low => FanMode::Low,
        FanSpeed::Medium => FanMode::Medium,
        FanSpeed::High => FanMode::High,
    }
}

/// `None` for the host fan modes Cuby units don't offer.
pub fn fan_to_wire(mode: FanMode) -> Option<FanSpeed> {
    match mode {
        FanMode::Auto => Some(FanSpeed::Auto),
        FanMode::Low => Some(FanSpeed::Low),
        FanMode::Medium => Some(FanSpeed::Medium),
        FanMode::High => Some(FanSpeed::High),
        FanMode::On
        | FanMode::Off
        | FanMode::Top
        | FanMode::Middle
        | FanMode::Focus
        | FanMode::Diffuse => None,
    }
}

// ── Entity ───────────────────────────────────────────────────────────

/// Climate entity for one Cuby unit.
pub struct CubyClimate {
    client: Arc<CubyClient>,
    device_id: String,
    name: String,
    device_info: DeviceDescriptor,
    available: bool,
    current_temperature: Option<f64>,
    target_temperature: Option<f64>,
    hvac_mode: Option<HvacMode>,
    fan_mode: Option<FanMode>,
}

impl CubyClimate {
    pub fn new(client: Arc<CubyClient>, device: &Device) -> Self {
        Self {
            client,
            device_id: device.id.clone(),
            name: device.display_name(),
            device_info: DeviceDescriptor::for_device(device),
            available: true,
            current_temperature: None,
            target_temperature: None,
            hvac_mode: None,
            fan_mode: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn apply_state(&mut self, state: &DeviceState) {
        self.current_temperature = state.current_temperature;
        self.target_temperature = state.target_temperature;

        self.hvac_mode = if state.power == Some(false) || state.mode.as_deref() == Some("off") {
            Some(HvacMode::Off)
        } else {
            match state.parsed_mode() {
                Some(Ok(mode)) => Some(hvac_from_wire(mode)),
                Some(Err(e)) => {
                    warn!(device_id = %self.device_id, error = %e, "unrecognized mode from cloud");
                    None
                }
                None => None,
            }
        };

        self.fan_mode = match state.parsed_fan_mode() {
            Some(Ok(speed)) => Some(fan_from_wire(speed)),
            Some(Err(e)) => {
                warn!(device_id = %self.device_id, error = %e, "unrecognized fan mode from cloud");
                None
            }
            None => None,
        };
    }

    async fn send(&self, update: StateUpdate) -> Result<(), CoreError> {
        self.client
            .try_set_device_state(&self.device_id, &update)
            .await
            .map_err(CoreError::from)
    }
}

#[async_trait]
impl Entity for CubyClimate {
    fn unique_id(&self) -> &str {
        &self.device_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_info(&self) -> &DeviceDescriptor {
        &self.device_info
    }

    fn available(&self) -> bool {
        self.available
    }

    async fn async_update(&mut self) -> Result<(), CoreError> {
        match self.client.try_get_device_state(&self.device_id).await {
            Ok(state) => {
                self.available = true;
                if state.is_empty() {
                    debug!(device_id = %self.device_id, "empty state payload, keeping previous attributes");
                } else {
                    self.apply_state(&state);
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

#[async_trait]
impl ClimateEntity for CubyClimate {
    fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    fn target_temperature(&self) -> Option<f64> {
        self.target_temperature
    }

    fn hvac_mode(&self) -> Option<HvacMode> {
        self.hvac_mode
    }

    fn hvac_modes(&self) -> &[HvacMode] {
        &HVAC_MODES
    }

    fn fan_mode(&self) -> Option<FanMode> {
        self.fan_mode
    }

    fn fan_modes(&self) -> &[FanMode] {
        &FAN_MODES
    }

    fn supported_features(&self) -> &[ClimateFeature] {
        &FEATURES
    }

    async fn async_set_temperature(&self, temperature: f64) -> Result<(), CoreError> {
        self.client
            .try_set_ac_temperature(&self.device_id, temperature)
            .await
            .map_err(CoreError::from)
    }

    async fn async_set_hvac_mode(&self, mode: HvacMode) -> Result<(), CoreError> {
        let update = if mode == HvacMode::Off {
            StateUpdate::new().power(false)
        } else {
            let wire = hvac_to_wire(mode).ok_or(CoreError::UnsupportedHvacMode { mode })?;
            StateUpdate::new().power(true).mode(wire)
        };
        self.send(update).await
    }

    async fn async_set_fan_mode(&self, fan_mode: &str) -> Result<(), CoreError> {
        let speed = fan_mode
            .parse::<FanMode>()
            .ok()
            .and_then(fan_to_wire)
            .ok_or_else(|| CoreError::UnsupportedFanMode {
                mode: fan_mode.to_owned(),
            })?;
        self.send(StateUpdate::new().fan_mode(speed)).await
    }

    async fn async_turn_on(&self) -> Result<(), CoreError> {
        self.send(StateUpdate::new().power(true)).await
    }

    async fn async_turn_off(&self) -> Result<(), CoreError> {
        self.send(StateUpdate::new().power(false)).await
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn mode_tables_round_trip() {
        for mode in AcMode::iter() {
            assert_eq!(hvac_to_wire(hvac_from_wire(mode)), Some(mode));
        }
        for speed in FanSpeed::iter() {
            assert_eq!(fan_to_wire(fan_from_wire(speed)), Some(speed));
        }
    }

    #[test]
    fn advertised_modes_all_reach_the_wire() {
        for mode in HVAC_MODES.into_iter().filter(|m| *m != HvacMode::Off) {
            assert!(hvac_to_wire(mode).is_some(), "{mode} has no wire value");
        }
        for mode in FAN_MODES {
            assert!(fan_to_wire(mode).is_some(), "{mode} has no wire value");
        }
    }

    #[test]
    fn unmapped_host_modes_have_no_wire_value() {
        assert_eq!(hvac_to_wire(HvacMode::Off), None);
        assert_eq!(hvac_to_wire(HvacMode::HeatCool), None);
        assert_eq!(fan_to_wire(FanMode::Diffuse), None);
        assert_eq!(fan_to_wire(FanMode::On), None);
    }
}
