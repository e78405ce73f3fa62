// Device endpoints
//
// Listing, details, and state read/write. Each endpoint comes in two forms:
// `try_*` returns the discriminated `Result`, the plain name logs the failure
// and hands back an empty value (or `false`) instead.

use tracing::{debug, error, warn};

use crate::client::CubyClient;
use crate::error::Error;
use crate::models::{Device, DeviceInfo, DeviceState, DiscoveredDevice, StateUpdate};

impl CubyClient {
    /// List every device registered to the account.
    ///
    /// `GET /api/v2/devices`
    pub async fn try_get_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.endpoint(&["devices"])?;
        debug!("listing devices");
        self.get(url).await
    }

    /// Details for one device (signal strength, online flag, firmware).
    ///
    /// `GET /api/v2/devices/{id}`
    pub async fn try_get_device_info(&self, device_id: &str) -> Result<DeviceInfo, Error> {
        let url = self.endpoint(&["devices", device_id])?;
        self.get(url).await
    }

    /// Current state of one device.
    ///
    /// `GET /api/v2/devices/{id}/state`
    pub async fn try_get_device_state(&self, device_id: &str) -> Result<DeviceState, Error> {
        let url = self.endpoint(&["devices", device_id, "state"])?;
        self.get(url).await
    }

    /// Apply a partial state. Empty updates are rejected without a request.
    ///
    /// `POST /api/v2/devices/{id}/state`
    pub async fn try_set_device_state(
        &self,
        device_id: &str,
        update: &StateUpdate,
    ) -> Result<(), Error> {
        if update.is_empty() {
            return Err(Error::EmptyUpdate);
        }
        let url = self.endpoint(&["devices", device_id, "state"])?;
        debug!(device_id, ?update, "setting device state");
        self.post_no_response(url, update).await
    }

    /// List devices and fetch the state of each.
    ///
    /// A device whose state can't be fetched is logged and left out; only a
    /// failure of the list call itself is an error.
    pub async fn discover_devices(&self) -> Result<Vec<DiscoveredDevice>, Error> {
        let devices = self.try_get_devices().await?;
        let mut discovered = Vec::with_capacity(devices.len());

        for device in devices {
            match self.try_get_device_state(&device.id).await {
                Ok(state) => discovered.push(DiscoveredDevice { device, state }),
                Err(e) => {
                    warn!(device_id = %device.id, error = %e, "error discovering device");
                }
            }
        }

        debug!(count = discovered.len(), "device discovery complete");
        Ok(discovered)
    }

    // ── Lenient forms ────────────────────────────────────────────────

    /// [`try_get_devices`](Self::try_get_devices), empty on failure.
    pub async fn get_devices(&self) -> Vec<Device> {
        self.try_get_devices().await.unwrap_or_else(|e| {
            error!(error = %e, "error getting devices");
            Vec::new()
        })
    }

    /// [`try_get_device_info`](Self::try_get_device_info), empty on failure.
    pub async fn get_device_info(&self, device_id: &str) -> DeviceInfo {
        self.try_get_device_info(device_id)
            .await
            .unwrap_or_else(|e| {
                error!(device_id, error = %e, "error getting device info");
                DeviceInfo::default()
            })
    }

    /// [`try_get_device_state`](Self::try_get_device_state), empty on failure.
    pub async fn get_device_state(&self, device_id: &str) -> DeviceState {
        self.try_get_device_state(device_id)
            .await
            .unwrap_or_else(|e| {
                error!(device_id, error = %e, "error getting device state");
                DeviceState::default()
            })
    }

    /// [`try_set_device_state`](Self::try_set_device_state), `false` on failure.
    pub async fn set_device_state(&self, device_id: &str, update: &StateUpdate) -> bool {
        match self.try_set_device_state(device_id, update).await {
            Ok(()) => true,
            Err(e) => {
                error!(device_id, error = %e, "error setting device state");
                false
            }
        }
    }
}
