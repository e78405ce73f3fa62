// A/C control helpers
//
// Thin validators in front of `set_device_state`. Temperatures are clamped,
// vocabulary values are checked against the API's fixed lists, and anything
// invalid is rejected before a request is built.

use serde_json::{Map, Value};
use tracing::error;

use crate::client::CubyClient;
use crate::error::Error;
use crate::models::{AcMode, FanSpeed, StateUpdate, SwingMode, parse_choice};

impl CubyClient {
    /// Turn the unit on or off.
    pub async fn try_set_ac_power(&self, device_id: &str, power: bool) -> Result<(), Error> {
        self.try_set_device_state(device_id, &StateUpdate::new().power(power))
            .await
    }

    /// Set the target temperature, clamped into 16–30 °C.
    pub async fn try_set_ac_temperature(
        &self,
        device_id: &str,
        temperature: f64,
    ) -> Result<(), Error> {
        if !temperature.is_finite() {
            return Err(Error::InvalidValue {
                field: "temperature",
                value: temperature.to_string(),
                allowed: "a finite number".into(),
            });
        }
        self.try_set_device_state(device_id, &StateUpdate::new().temperature(temperature))
            .await
    }

    /// Set the operating mode (`auto`, `cool`, `heat`, `dry`, `fan_only`).
    pub async fn try_set_ac_mode(&self, device_id: &str, mode: &str) -> Result<(), Error> {
        let mode: AcMode = parse_choice("mode", mode)?;
        self.try_set_device_state(device_id, &StateUpdate::new().mode(mode))
            .await
    }

    /// Set the fan speed (`auto`, `low`, `medium`, `high`).
    pub async fn try_set_ac_fan_mode(&self, device_id: &str, fan_mode: &str) -> Result<(), Error> {
        let fan: FanSpeed = parse_choice("fan_mode", fan_mode)?;
        self.try_set_device_state(device_id, &StateUpdate::new().fan_mode(fan))
            .await
    }

    /// Set the swing direction (`off`, `vertical`, `horizontal`, `both`).
    pub async fn try_set_ac_swing_mode(
        &self,
        device_id: &str,
        swing_mode: &str,
    ) -> Result<(), Error> {
        let swing: SwingMode = parse_choice("swing", swing_mode)?;
        self.try_set_device_state(device_id, &StateUpdate::new().swing(swing))
            .await
    }

    /// Set several parameters in one request.
    ///
    /// Keys other than `power`, `temperature`, `mode`, `fan_mode` and `swing`
    /// are dropped; see [`StateUpdate::from_map`].
    pub async fn try_set_ac_full_state(
        &self,
        device_id: &str,
        state: &Map<String, Value>,
    ) -> Result<(), Error> {
        let update = StateUpdate::from_map(state)?;
        self.try_set_device_state(device_id, &update).await
    }

    // ── Lenient forms ────────────────────────────────────────────────

    pub async fn set_ac_power(&self, device_id: &str, power: bool) -> bool {
        report(device_id, self.try_set_ac_power(device_id, power).await)
    }

    pub async fn set_ac_temperature(&self, device_id: &str, temperature: f64) -> bool {
        report(
            device_id,
            self.try_set_ac_temperature(device_id, temperature).await,
        )
    }

    pub async fn set_ac_mode(&self, device_id: &str, mode: &str) -> bool {
        report(device_id, self.try_set_ac_mode(device_id, mode).await)
    }

    pub async fn set_ac_fan_mode(&self, device_id: &str, fan_mode: &str) -> bool {
        report(device_id, self.try_set_ac_fan_mode(device_id, fan_mode).await)
    }

    pub async fn set_ac_swing_mode(&self, device_id: &str, swing_mode: &str) -> bool {
        report(
            device_id,
            self.try_set_ac_swing_mode(device_id, swing_mode).await,
        )
    }

    pub async fn set_ac_full_state(&self, device_id: &str, state: &Map<String, Value>) -> bool {
        report(device_id, self.try_set_ac_full_state(device_id, state).await)
    }
}

fn report(device_id: &str, result: Result<(), Error>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!(device_id, error = %e, "error controlling device");
            false
        }
    }
}
