// ── In-process entity host ──
//
// A minimal `EntityRegistry` that owns the registered entities and polls
// them. Used by the CLI and by tests; a real home-automation host brings
// its own registry.

use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::future::{join, join_all};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::entity::{ClimateEntity, EntityRegistry, Platform, PlatformEntities, SensorEntity};
use crate::error::CoreError;

/// A failed poll of one entity.
#[derive(Debug)]
pub struct PollFailure {
    pub unique_id: String,
    pub error: CoreError,
}

/// Point-in-time view of one entity, for display.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub unique_id: String,
    pub name: String,
    pub platform: Platform,
    pub available: bool,
    /// Primary state (HVAC mode for climate, native value for sensors).
    pub state: Option<String>,
    pub attributes: BTreeMap<String, Value>,
}

/// Owns every entity registered through it.
#[derive(Default)]
pub struct EntityCollection {
    climates: Vec<Box<dyn ClimateEntity>>,
    sensors: Vec<Box<dyn SensorEntity>>,
}

impl EntityRegistry for EntityCollection {
    fn add_entities(&mut self, entities: PlatformEntities) {
        debug!(platform = %entities.platform(), count = entities.len(), "adding entities");
        match entities {
            PlatformEntities::Climate(batch) => self.climates.extend(batch),
            PlatformEntities::Sensor(batch) => self.sensors.extend(batch),
        }
    }
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn climates(&self) -> &[Box<dyn ClimateEntity>] {
        &self.climates
    }

    pub fn sensors(&self) -> &[Box<dyn SensorEntity>] {
        &self.sensors
    }

    pub fn climate(&self, unique_id: &str) -> Option<&dyn ClimateEntity> {
        self.climates
            .iter()
            .find(|c| c.unique_id() == unique_id)
            .map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.climates.len() + self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poll every entity concurrently. Failures are collected, not
    /// propagated; failed entities report `available() == false`.
    pub async fn update_all(&mut self) -> Vec<PollFailure> {
        let climate_polls = join_all(self.climates.iter_mut().map(|c| c.async_update()));
        let sensor_polls = join_all(self.sensors.iter_mut().map(|s| s.async_update()));
        let (climate_results, sensor_results) = join(climate_polls, sensor_polls).await;

        let climate_ids = self.climates.iter().map(|c| c.unique_id().to_owned());
        let sensor_ids = self.sensors.iter().map(|s| s.unique_id().to_owned());

        climate_ids
            .zip(climate_results)
            .chain(sensor_ids.zip(sensor_results))
            .filter_map(|(unique_id, result)| {
                result.err().map(|error| {
                    warn!(%unique_id, %error, "entity update failed");
                    PollFailure { unique_id, error }
                })
            })
            .collect()
    }

    /// Poll on a fixed interval until `cancel` fires. `on_cycle` runs after
    /// every round with the collection and that round's failures.
    pub async fn poll_until_cancelled<F>(
        &mut self,
        every: Duration,
        cancel: &CancellationToken,
        mut on_cycle: F,
    ) where
        F: FnMut(&Self, &[PollFailure]) + Send,
    {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let failures = self.update_all().await;
                    on_cycle(self, &failures);
                }
            }
        }
        debug!("polling stopped");
    }

    /// Snapshot every entity, climates first.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        let climates = self.climates.iter().map(|c| climate_snapshot(c.as_ref()));
        let sensors = self.sensors.iter().map(|s| sensor_snapshot(s.as_ref()));
        climates.chain(sensors).collect()
    }
}

fn climate_snapshot(entity: &dyn ClimateEntity) -> EntitySnapshot {
    let mut attributes = BTreeMap::new();
    attributes.insert("current_temperature".into(), json!(entity.current_temperature()));
    attributes.insert("target_temperature".into(), json!(entity.target_temperature()));
    attributes.insert("fan_mode".into(), json!(entity.fan_mode()));
    attributes.insert("temperature_unit".into(), json!(entity.temperature_unit()));
    attributes.insert("min_temp".into(), json!(entity.min_temp()));
    attributes.insert("max_temp".into(), json!(entity.max_temp()));

    EntitySnapshot {
        unique_id: entity.unique_id().to_owned(),
        name: entity.name().to_owned(),
        platform: Platform::Climate,
        available: entity.available(),
        state: entity.hvac_mode().map(|m| m.to_string()),
        attributes,
    }
}

fn sensor_snapshot(entity: &dyn SensorEntity) -> EntitySnapshot {
    let mut attributes = BTreeMap::new();
    if let Some(unit) = entity.native_unit_of_measurement() {
        attributes.insert("unit_of_measurement".into(), json!(unit));
    }
    if let Some(class) = entity.device_class() {
        attributes.insert("device_class".into(), json!(class));
    }

    EntitySnapshot {
        unique_id: entity.unique_id().to_owned(),
        name: entity.name().to_owned(),
        platform: Platform::Sensor,
        available: entity.available(),
        state: entity.native_value().map(|v| v.to_string()),
        attributes,
    }
}

impl std::fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCollection")
            .field("climates", &self.climates.len())
            .field("sensors", &self.sensors.len())
            .finish()
    }
}
