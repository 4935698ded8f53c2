// ── Wire <-> domain conversion ──
//
// Translates `vreeda_api` wire models into the canonical domain types
// and pending updates back into request payloads.

use vreeda_api::{DeviceRequestStateModel, DeviceResponseModel, DeviceStatesModel};

use crate::model::{COLOR_PROGRAM, Device, DeviceState, DeviceTags, PendingUpdate};

impl From<&DeviceStatesModel> for DeviceState {
    fn from(states: &DeviceStatesModel) -> Self {
        Self {
            on: states.on.as_ref().and_then(|v| v.value),
            hue: states.h.as_ref().and_then(|v| v.value),
            saturation: states.s.as_ref().and_then(|v| v.value),
            brightness: states.v.as_ref().and_then(|v| v.value),
            program: states.program.as_ref().and_then(|v| v.value.clone()),
        }
    }
}

/// Build a domain device from its id and wire representation.
pub fn device_from_response(id: &str, model: &DeviceResponseModel) -> Device {
    Device {
        id: id.to_owned(),
        tags: DeviceTags {
            custom_device_name: model
                .tags
                .as_ref()
                .and_then(|t| t.custom_device_name.clone()),
        },
        connected: model
            .connected
            .as_ref()
            .and_then(|c| c.value)
            .unwrap_or(false),
        states: model
            .states
            .as_ref()
            .map(DeviceState::from)
            .unwrap_or_default(),
    }
}

impl From<&PendingUpdate> for DeviceRequestStateModel {
    fn from(update: &PendingUpdate) -> Self {
        match *update {
            PendingUpdate::Power { on } => Self {
                on: Some(on),
                ..Self::default()
            },
            PendingUpdate::Color(color) => Self {
                h: Some(color.hue),
                s: Some(color.saturation),
                v: Some(color.brightness),
                program: Some(COLOR_PROGRAM.to_owned()),
                ..Self::default()
            },
        }
    }
}
