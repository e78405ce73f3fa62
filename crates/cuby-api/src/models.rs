// Cuby API models
//
// Wire types for the v2 REST API. Read-side payloads are lenient: every field
// is optional and anything not modeled lands in `extra`, because the cloud
// adds fields across firmware versions. Write-side payloads (`StateUpdate`)
// are strict: values are validated and clamped before they are serialized.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, VariantNames};
use tracing::{debug, warn};

use crate::error::Error;

/// Lowest setpoint the units accept, in °C.
pub const MIN_TEMPERATURE: f64 = 16.0;
/// Highest setpoint the units accept, in °C.
pub const MAX_TEMPERATURE: f64 = 30.0;

/// Pull a setpoint into `[MIN_TEMPERATURE, MAX_TEMPERATURE]`.
pub fn clamp_temperature(temperature: f64) -> f64 {
    temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

// ── Vocabularies ─────────────────────────────────────────────────────

/// Operating mode as the Cuby API spells it. Power-off is a separate flag.
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
pub enum AcMode {
    Auto,
    Cool,
    Heat,
    Dry,
    FanOnly,
}

/// Fan speed.
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
pub enum FanSpeed {
    Auto,
    Low,
    Medium,
    High,
}

/// Louver swing direction.
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
pub enum SwingMode {
    Off,
    Vertical,
    Horizontal,
    Both,
}

/// Parse a vocabulary value, producing an `InvalidValue` that lists the
/// accepted spellings.
pub(crate) fn parse_choice<T>(field: &'static str, raw: &str) -> Result<T, Error>
where
    T: FromStr + VariantNames,
{
    raw.parse().map_err(|_| Error::InvalidValue {
        field,
        value: raw.to_owned(),
        allowed: T::VARIANTS.join(", "),
    })
}

// ── Device ───────────────────────────────────────────────────────────

/// Device entry from `GET /api/v2/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub firmware_version: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// Display name, falling back to `"Cuby AC {id}"` for unnamed units.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Cuby AC {}", self.id))
    }
}

/// Device details from `GET /api/v2/devices/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub firmware_version: Option<String>,
    /// Received signal strength in dBm. Fractional readings are rounded.
    #[serde(default, deserialize_with = "lenient_dbm")]
    pub wifi_signal: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    pub online: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceInfo {
    /// `true` when the payload carried nothing at all (the failure value of
    /// the lenient getter).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── State ────────────────────────────────────────────────────────────

/// Full state from `GET /api/v2/devices/{id}/state`.
///
/// Vocabulary fields stay as raw strings so one unrecognized value from the
/// cloud doesn't discard the rest of the poll; use the `parsed_*` accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default, deserialize_with = "lenient")]
    pub power: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fan_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub swing: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub target_temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_temperature: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceState {
    /// `true` when the payload carried nothing at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn parsed_mode(&self) -> Option<Result<AcMode, Error>> {
        self.mode.as_deref().map(|m| parse_choice("mode", m))
    }

    pub fn parsed_fan_mode(&self) -> Option<Result<FanSpeed, Error>> {
        self.fan_mode.as_deref().map(|m| parse_choice("fan_mode", m))
    }
}

/// A device from the list endpoint, enriched with its current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub device: Device,
    pub state: DeviceState,
}

// ── Updates ──────────────────────────────────────────────────────────

/// Partial state for `POST /api/v2/devices/{id}/state`.
///
/// Absent fields are omitted from the body. Construct with the builder
/// methods, which clamp the temperature, or with [`StateUpdate::from_map`]
/// for untyped input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<AcMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_mode: Option<FanSpeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swing: Option<SwingMode>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn power(mut self, on: bool) -> Self {
        self.power = Some(on);
        self
    }

    /// Set the target temperature, clamped into the accepted range.
    pub fn temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(clamp_temperature(celsius));
        self
    }

    pub fn mode(mut self, mode: AcMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn fan_mode(mut self, fan: FanSpeed) -> Self {
        self.fan_mode = Some(fan);
        self
    }

    pub fn swing(mut self, swing: SwingMode) -> Self {
        self.swing = Some(swing);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build an update from an untyped mapping.
    ///
    /// Keys other than `power`, `temperature`, `mode`, `fan_mode` and `swing`
    /// are dropped. Surviving values are
    /// validated (vocabulary fields) or clamped (temperature). An input with
    /// no recognized keys yields [`Error::EmptyUpdate`].
    pub fn from_map(state: &Map<String, Value>) -> Result<Self, Error> {
        let mut update = Self::new();

        for (key, value) in state {
            match key.as_str() {
                "power" => {
                    let on = value.as_bool().ok_or_else(|| invalid("power", value, "true, false"))?;
                    update = update.power(on);
                }
                "temperature" => {
                    let celsius = value
                        .as_f64()
                        .filter(|t| t.is_finite())
                        .ok_or_else(|| invalid("temperature", value, "a number"))?;
                    update = update.temperature(celsius);
                }
                "mode" => update = update.mode(parse_value("mode", value)?),
                "fan_mode" => update = update.fan_mode(parse_value("fan_mode", value)?),
                "swing" => update = update.swing(parse_value("swing", value)?),
                other => debug!(key = other, "dropping unrecognized state key"),
            }
        }

        if update.is_empty() {
            return Err(Error::EmptyUpdate);
        }
        Ok(update)
    }
}

fn invalid(field: &'static str, value: &Value, allowed: &str) -> Error {
    Error::InvalidValue {
        field,
        value: value.to_string(),
        allowed: allowed.to_owned(),
    }
}

fn parse_value<T>(field: &'static str, value: &Value) -> Result<T, Error>
where
    T: FromStr + VariantNames,
{
    match value.as_str() {
        Some(raw) => parse_choice(field, raw),
        None => Err(invalid(field, value, &T::VARIANTS.join(", "))),
    }
}

// ── Token ────────────────────────────────────────────────────────────

/// Body of `POST /api/v2/token/{username}`.
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub password: &'a str,
    /// Token lifetime in seconds. 0 asks for a non-expiring token.
    pub expiration: u64,
}

/// Response of the token endpoint. `status == "ok"` marks success.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Read one optional field, downgrading a value of the wrong JSON type to
/// `None` so the rest of the payload still decodes.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(%value, error = %e, "ignoring field with unexpected type");
            Ok(None)
        }
    }
}

/// Signal strength in whole dBm. Some firmware reports fractions.
fn lenient_dbm<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let reading: Option<f64> = lenient(deserializer)?;
    Ok(reading.and_then(|dbm| {
        let rounded = dbm.round();
        if rounded.is_finite() && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&rounded) {
            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let whole = rounded as i32;
            Some(whole)
        } else {
            warn!(dbm, "ignoring out-of-range signal strength");
            None
        }
    }))
}

/// Device ids are strings in current firmware but numeric on older units.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn clamps_temperature_into_range() {
        assert!((clamp_temperature(40.0) - 30.0).abs() < f64::EPSILON);
        assert!((clamp_temperature(5.0) - 16.0).abs() < f64::EPSILON);
        assert!((clamp_temperature(22.5) - 22.5).abs() < f64::EPSILON);
    }

    #[test]
    fn vocabularies_use_wire_spelling() {
        assert_eq!(AcMode::FanOnly.to_string(), "fan_only");
        assert_eq!("fan_only".parse::<AcMode>().unwrap(), AcMode::FanOnly);
        assert_eq!(FanSpeed::Medium.as_ref(), "medium");
        assert_eq!("both".parse::<SwingMode>().unwrap(), SwingMode::Both);
        assert!("off".parse::<AcMode>().is_err());
        assert!("Cool".parse::<AcMode>().is_err());
    }

    #[test]
    fn invalid_choice_lists_allowed_values() {
        let err = parse_choice::<FanSpeed>("fan_mode", "turbo").unwrap_err();
        match err {
            Error::InvalidValue {
                field,
                value,
                allowed,
            } => {
                assert_eq!(field, "fan_mode");
                assert_eq!(value, "turbo");
                assert_eq!(allowed, "auto, low, medium, high");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn from_map_drops_unknown_keys() {
        let input = json!({ "power": true, "bogus": 1 });
        let update = StateUpdate::from_map(input.as_object().unwrap()).unwrap();
        assert_eq!(serde_json::to_value(update).unwrap(), json!({ "power": true }));
    }

    #[test]
    fn from_map_clamps_and_validates() {
        let input = json!({ "temperature": 45, "mode": "heat", "swing": "both" });
        let update = StateUpdate::from_map(input.as_object().unwrap()).unwrap();
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({ "temperature": 30.0, "mode": "heat", "swing": "both" })
        );

        let bad = json!({ "mode": "turbo" });
        assert!(matches!(
            StateUpdate::from_map(bad.as_object().unwrap()),
            Err(Error::InvalidValue { field: "mode", .. })
        ));
    }

    #[test]
    fn from_map_rejects_empty_input() {
        let input = json!({ "bogus": 1 });
        assert!(matches!(
            StateUpdate::from_map(input.as_object().unwrap()),
            Err(Error::EmptyUpdate)
        ));
    }

    #[test]
    fn state_tolerates_unknown_values() {
        let state: DeviceState = serde_json::from_value(json!({
            "power": true,
            "mode": "turbo",
            "target_temperature": 24,
            "humidity": 40
        }))
        .unwrap();

        assert_eq!(state.target_temperature, Some(24.0));
        assert!(state.parsed_mode().unwrap().is_err());
        assert_eq!(state.extra.get("humidity"), Some(&json!(40)));
        assert!(!state.is_empty());
        assert!(DeviceState::default().is_empty());
    }

    #[test]
    fn info_rounds_fractional_signal() {
        let info: DeviceInfo =
            serde_json::from_value(json!({ "wifi_signal": -65.5, "online": true })).unwrap();
        assert_eq!(info.wifi_signal, Some(-66));
        assert_eq!(info.online, Some(true));
    }

    #[test]
    fn mistyped_fields_do_not_discard_the_payload() {
        let info: DeviceInfo =
            serde_json::from_value(json!({ "wifi_signal": "strong", "online": true })).unwrap();
        assert_eq!(info.wifi_signal, None);
        assert_eq!(info.online, Some(true));

        let state: DeviceState = serde_json::from_value(json!({
            "power": "yes",
            "mode": "cool",
            "target_temperature": "24",
            "current_temperature": null
        }))
        .unwrap();
        assert_eq!(state.power, None);
        assert_eq!(state.mode.as_deref(), Some("cool"));
        assert_eq!(state.target_temperature, None);
        assert_eq!(state.current_temperature, None);
    }

    #[test]
    fn device_accepts_numeric_id() {
        let device: Device = serde_json::from_value(json!({ "id": 42 })).unwrap();
        assert_eq!(device.id, "42");
        assert_eq!(device.display_name(), "Cuby AC 42");
    }
}
