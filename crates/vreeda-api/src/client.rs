// Device API HTTP client
//
// Wraps `reqwest::Client` with base-URL handling, bearer auth and
// response decoding. One call maps to exactly one outbound request;
// nothing here retries.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::ApiCredentials;
use crate::error::Error;
use crate::models::{
    AckPayload, DeviceMap, DeviceRequestModel, DeviceRequestStateModel, PatchDeviceBody,
};
use crate::transport::TransportConfig;

const PATCH_DEVICE_PATH: &str = "patch-device";
const LIST_DEVICES_PATH: &str = "list-devices";

/// Error body shape the device API uses on failure.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Async client for the Vreeda device API.
///
/// The base URL is the directory holding the device endpoints, e.g.
/// `https://app.example.com/api/vreeda/`.
#[derive(Debug, Clone)]
pub struct DeviceApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DeviceApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from credentials and a transport config.
    pub fn new(
        base_url: &str,
        credentials: &ApiCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(credentials.headers()?)?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
        })
    }

    /// Ensure the base URL ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch every device visible to the current credentials.
    pub async fn list_devices(&self) -> Result<DeviceMap, Error> {
        let url = self.url(LIST_DEVICES_PATH)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    /// Request a partial state change on one device.
    ///
    /// `device_id` must be non-empty and `states` must carry at least
    /// one field; otherwise nothing is sent.
    pub async fn patch_device(
        &self,
        device_id: &str,
        states: &DeviceRequestStateModel,
    ) -> Result<AckPayload, Error> {
        if device_id.trim().is_empty() {
            return Err(Error::InvalidRequest("device id must not be empty"));
        }
        if states.is_empty() {
            return Err(Error::InvalidRequest(
                "state change must contain at least one field",
            ));
        }

        let url = self.url(PATCH_DEVICE_PATH)?;
        debug!(device_id, "PATCH {url}");

        let body = PatchDeviceBody {
            device_id: device_id.to_owned(),
            request: DeviceRequestModel {
                states: states.clone(),
            },
        };

        let resp = self.http.patch(url).json(&body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        // An empty acknowledgement decodes as JSON `null`.
        let raw = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(raw).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                }
            });

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication { message };
        }

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}
