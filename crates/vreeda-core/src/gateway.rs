// ── Device gateway ──
//
// The seam between local device state and the remote device API.
// Controllers only see `DeviceGateway`; tests swap in a fake.

use std::future::Future;

use thiserror::Error;
use tracing::debug;
use vreeda_api::{AckPayload, DeviceApiClient, DeviceRequestStateModel};

use crate::config::ApiConfig;
use crate::convert::device_from_response;
use crate::error::CoreError;
use crate::model::{Device, PendingUpdate};

/// Underlying device API failure carried by [`GatewayError`].
pub use vreeda_api::Error as ApiError;

/// A state change the device API did not accept.
#[derive(Debug, Error)]
#[error("State change for device {device_id} failed: {source}")]
pub struct GatewayError {
    pub device_id: String,
    #[source]
    pub source: vreeda_api::Error,
}

impl GatewayError {
    pub fn new(device_id: impl Into<String>, source: vreeda_api::Error) -> Self {
        Self {
            device_id: device_id.into(),
            source,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }

    pub fn is_auth_expired(&self) -> bool {
        self.source.is_auth_expired()
    }
}

/// Sends one pending update for one device.
///
/// Implementations must issue exactly one outbound request per call and
/// must not retry.
pub trait DeviceGateway: Send + Sync {
    fn apply_device_state(
        &self,
        device_id: &str,
        update: &PendingUpdate,
    ) -> impl Future<Output = Result<AckPayload, GatewayError>> + Send;
}

/// Production gateway backed by the device API.
#[derive(Debug, Clone)]
pub struct RemoteDeviceGateway {
    client: DeviceApiClient,
}

impl RemoteDeviceGateway {
    pub fn new(client: DeviceApiClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, CoreError> {
        Ok(Self::new(config.build_client()?))
    }

    pub fn client(&self) -> &DeviceApiClient {
        &self.client
    }

    /// All devices visible to the configured credentials, ordered by id.
    pub async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let map = self.client.list_devices().await?;
        let mut devices: Vec<Device> = map
            .iter()
            .map(|(id, model)| device_from_response(id, model))
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Look a device up by exact id, or by case-insensitive display name.
    pub async fn find_device(&self, identifier: &str) -> Result<Device, CoreError> {
        let devices = self.list_devices().await?;
        lookup_device(&devices, identifier).cloned()
    }
}

/// Match `identifier` against a listing: exact id first, then
/// case-insensitive display name.
pub fn lookup_device<'a>(
    devices: &'a [Device],
    identifier: &str,
) -> Result<&'a Device, CoreError> {
    let needle = identifier.trim();
    devices
        .iter()
        .find(|d| d.id == needle)
        .or_else(|| {
            devices
                .iter()
                .find(|d| d.display_name().eq_ignore_ascii_case(needle))
        })
        .ok_or_else(|| CoreError::DeviceNotFound {
            identifier: identifier.to_owned(),
        })
}

impl DeviceGateway for RemoteDeviceGateway {
    async fn apply_device_state(
        &self,
        device_id: &str,
        update: &PendingUpdate,
    ) -> Result<AckPayload, GatewayError> {
        let states = DeviceRequestStateModel::from(update);
        self.client
            .patch_device(device_id, &states)
            .await
            .map_err(|e| GatewayError::new(device_id, e))
    }
}
