// ── Integration setup ──
//
// Turns a config entry into live entities: one API client per entry,
// authenticated once, injected into every adapter, and handed to the host's
// registry per platform.

use std::sync::Arc;

use cuby_api::CubyClient;
use tracing::{info, warn};

use crate::DOMAIN;
use crate::climate::CubyClimate;
use crate::config::IntegrationConfig;
use crate::entity::{ClimateEntity, EntityRegistry, PlatformEntities, SensorEntity};
use crate::error::CoreError;
use crate::sensor::{CubyModeSensor, CubyOnlineSensor, CubyWifiSensor};

/// A configured account, as persisted by the host.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub domain: String,
    /// The account username; one entry per account.
    pub unique_id: String,
    pub title: String,
    pub config: IntegrationConfig,
}

impl ConfigEntry {
    pub fn new(config: IntegrationConfig) -> Self {
        Self {
            domain: DOMAIN.to_owned(),
            unique_id: config.username.clone(),
            title: config.username.clone(),
            config,
        }
    }
}

/// Handle to a set-up entry.
#[derive(Clone)]
pub struct CubyIntegration {
    client: Arc<CubyClient>,
    entry: ConfigEntry,
    device_count: usize,
}

impl CubyIntegration {
    pub fn client(&self) -> &Arc<CubyClient> {
        &self.client
    }

    pub fn entry(&self) -> &ConfigEntry {
        &self.entry
    }

    /// Units found during setup.
    pub fn device_count(&self) -> usize {
        self.device_count
    }
}

impl std::fmt::Debug for CubyIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubyIntegration")
            .field("entry", &self.entry.title)
            .field("base_url", &self.client.base_url().as_str())
            .field("device_count", &self.device_count)
            .finish_non_exhaustive()
    }
}

/// Set up an account from a bare config.
pub async fn setup_integration(
    config: IntegrationConfig,
    registry: &mut dyn EntityRegistry,
) -> Result<CubyIntegration, CoreError> {
    setup_entry(ConfigEntry::new(config), registry).await
}

/// Set up a persisted entry: authenticate, enumerate units, register
/// a climate entity and three sensors per unit.
///
/// Nothing is registered unless authentication and both enumerations
/// succeed.
pub async fn setup_entry(
    entry: ConfigEntry,
    registry: &mut dyn EntityRegistry,
) -> Result<CubyIntegration, CoreError> {
    let client = Arc::new(entry.config.build_client()?);

    client.login().await.map_err(|e| {
        warn!(username = %entry.unique_id, error = %e, "authentication failed during setup");
        CoreError::from(e)
    })?;

    let devices = client.try_get_devices().await?;
    let discovered = client.discover_devices().await?;

    let climates: Vec<Box<dyn ClimateEntity>> = devices
        .iter()
        .map(|device| Box::new(CubyClimate::new(Arc::clone(&client), device)) as Box<dyn ClimateEntity>)
        .collect();

    let mut sensors: Vec<Box<dyn SensorEntity>> = Vec::with_capacity(discovered.len() * 3);
    for found in &discovered {
        sensors.push(Box::new(CubyWifiSensor::new(Arc::clone(&client), &found.device)));
        sensors.push(Box::new(CubyOnlineSensor::new(Arc::clone(&client), &found.device)));
        sensors.push(Box::new(CubyModeSensor::new(Arc::clone(&client), &found.device)));
    }

    info!(
        entry = %entry.title,
        climates = climates.len(),
        sensors = sensors.len(),
        "cuby integration set up"
    );

    registry.add_entities(PlatformEntities::Climate(climates));
    registry.add_entities(PlatformEntities::Sensor(sensors));

    Ok(CubyIntegration {
        client,
        entry,
        device_count: devices.len(),
    })
}
