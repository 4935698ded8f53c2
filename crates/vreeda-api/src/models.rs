// Wire types for the Vreeda device API.
//
// Response fields wrap every scalar in a `{ "value": ... }` object;
// request fields are bare scalars. Everything is optional on the wire.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opaque acknowledgement returned by a successful PATCH.
pub type AckPayload = serde_json::Value;

/// Device listing: device id -> device.
pub type DeviceMap = HashMap<String, DeviceResponseModel>;

/// A `{ "value": T }` wrapper used by every reported state field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateValue<T> {
    #[serde(default)]
    pub value: Option<T>,
}

impl<T> StateValue<T> {
    pub fn new(value: T) -> Self {
        Self { value: Some(value) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTagsModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_device_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectedModel {
    #[serde(default)]
    pub value: Option<bool>,
}

/// Reported state of a device. `h`, `s`, `v` are hue, saturation and
/// brightness in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatesModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<StateValue<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<StateValue<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<StateValue<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<StateValue<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<StateValue<String>>,
}

/// A device as returned by the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceResponseModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<DeviceTagsModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<ConnectedModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<DeviceStatesModel>,
}

/// Requested partial state. Absent fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRequestStateModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

impl DeviceRequestStateModel {
    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self.on.is_none()
            && self.h.is_none()
            && self.s.is_none()
            && self.v.is_none()
            && self.program.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRequestModel {
    pub states: DeviceRequestStateModel,
}

/// Body of the PATCH device-state request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDeviceBody {
    pub device_id: String,
    pub request: DeviceRequestModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_body_uses_camel_case_and_skips_absent_fields() {
        let body = PatchDeviceBody {
            device_id: "dev-1".into(),
            request: DeviceRequestModel {
                states: DeviceRequestStateModel {
                    on: Some(true),
                    ..Default::default()
                },
            },
        };

        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "deviceId": "dev-1", "request": { "states": { "on": true } } })
        );
    }

    #[test]
    fn response_model_tolerates_missing_fields() {
        let raw = serde_json::json!({
            "tags": { "customDeviceName": "Desk" },
            "connected": { "value": true },
            "states": { "on": { "value": false }, "h": { "value": 0.5 }, "program": {} }
        });

        let model: DeviceResponseModel = serde_json::from_value(raw).expect("deserialize");
        let states = model.states.expect("states");
        assert_eq!(states.on, Some(StateValue::new(false)));
        assert_eq!(states.h.and_then(|h| h.value), Some(0.5));
        assert!(states.s.is_none());
        assert_eq!(states.program.and_then(|p| p.value), None);
        assert_eq!(
            model.tags.and_then(|t| t.custom_device_name).as_deref(),
            Some("Desk")
        );
    }

    #[test]
    fn empty_request_state_is_detected() {
        assert!(DeviceRequestStateModel::default().is_empty());
        let with_program = DeviceRequestStateModel {
            program: Some("color".into()),
            ..Default::default()
        };
        assert!(!with_program.is_empty());
    }
}
