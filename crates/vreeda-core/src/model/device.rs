// ── Device domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Mode tag the device API needs to interpret hue/saturation/brightness.
pub const COLOR_PROGRAM: &str = "color";

/// Last known (or last requested) state of one device.
///
/// Every field is optional: `None` means unknown or unchanged.
/// Color channels are fractions in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub on: Option<bool>,
    pub hue: Option<f64>,
    pub saturation: Option<f64>,
    pub brightness: Option<f64>,
    pub program: Option<String>,
}

impl DeviceState {
    pub fn channel(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Hue => self.hue,
            Channel::Saturation => self.saturation,
            Channel::Brightness => self.brightness,
        }
    }

    pub fn set_channel(&mut self, channel: Channel, value: f64) {
        let slot = match channel {
            Channel::Hue => &mut self.hue,
            Channel::Saturation => &mut self.saturation,
            Channel::Brightness => &mut self.brightness,
        };
        *slot = Some(value);
    }

    /// The full color triple, with unknown channels reading as `0`.
    pub fn color(&self) -> ColorTriple {
        ColorTriple {
            hue: self.hue.unwrap_or(0.0),
            saturation: self.saturation.unwrap_or(0.0),
            brightness: self.brightness.unwrap_or(0.0),
        }
    }

    /// Write a color triple and the color program tag.
    pub(crate) fn set_color(&mut self, color: ColorTriple) {
        self.hue = Some(color.hue);
        self.saturation = Some(color.saturation);
        self.brightness = Some(color.brightness);
        self.program = Some(COLOR_PROGRAM.to_owned());
    }
}

/// One color channel of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Channel {
    #[strum(to_string = "hue", serialize = "h")]
    Hue,
    #[strum(to_string = "saturation", serialize = "s")]
    Saturation,
    #[strum(to_string = "brightness", serialize = "v")]
    Brightness,
}

/// A complete hue/saturation/brightness triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorTriple {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
}

/// The fields a single interaction asks the device to change.
///
/// Color changes can only be expressed as a full triple, and always
/// carry the color program tag when converted to the wire format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingUpdate {
    Power { on: bool },
    Color(ColorTriple),
}

/// Named composite color changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Preset {
    /// Saturated cyan-green at full brightness.
    Alert,
    /// Fully desaturated; hue and brightness are kept.
    Neutral,
}

impl Preset {
    /// Channel values this preset defines. `None` keeps the last known value.
    pub fn values(self) -> (Option<f64>, Option<f64>, Option<f64>) {
        match self {
            Self::Alert => (Some(0.44), Some(1.0), Some(1.0)),
            Self::Neutral => (None, Some(0.0), None),
        }
    }

    /// Apply this preset on top of `base`.
    pub fn apply_to(self, base: ColorTriple) -> ColorTriple {
        let (hue, saturation, brightness) = self.values();
        ColorTriple {
            hue: hue.unwrap_or(base.hue),
            saturation: saturation.unwrap_or(base.saturation),
            brightness: brightness.unwrap_or(base.brightness),
        }
    }
}

/// Free-form labels attached to a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTags {
    pub custom_device_name: Option<String>,
}

/// A device as mirrored from the device API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub tags: DeviceTags,
    pub connected: bool,
    pub states: DeviceState,
}

impl Device {
    pub fn display_name(&self) -> &str {
        self.tags
            .custom_device_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Unnamed Device")
    }

    pub fn status_label(&self) -> &'static str {
        if self.connected { "Online" } else { "Offline" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parses_names_and_short_letters() {
        assert_eq!("hue".parse::<Channel>().ok(), Some(Channel::Hue));
        assert_eq!("S".parse::<Channel>().ok(), Some(Channel::Saturation));
        assert_eq!("v".parse::<Channel>().ok(), Some(Channel::Brightness));
        assert!("red".parse::<Channel>().is_err());
        assert_eq!(Channel::Brightness.to_string(), "brightness");
    }

    #[test]
    fn preset_parses_case_insensitively() {
        assert_eq!("ALERT".parse::<Preset>().ok(), Some(Preset::Alert));
        assert_eq!("neutral".parse::<Preset>().ok(), Some(Preset::Neutral));
        assert_eq!(Preset::Alert.to_string(), "alert");
    }

    #[test]
    fn neutral_preset_keeps_hue_and_brightness() {
        let base = ColorTriple {
            hue: 0.3,
            saturation: 0.8,
            brightness: 0.6,
        };
        let next = Preset::Neutral.apply_to(base);
        assert_eq!(
            next,
            ColorTriple {
                hue: 0.3,
                saturation: 0.0,
                brightness: 0.6
            }
        );
    }

    #[test]
    fn unknown_channels_read_as_zero() {
        let state = DeviceState {
            hue: Some(0.5),
            ..Default::default()
        };
        assert_eq!(
            state.color(),
            ColorTriple {
                hue: 0.5,
                saturation: 0.0,
                brightness: 0.0
            }
        );
    }

    #[test]
    fn display_name_falls_back_when_blank() {
        let mut device = Device {
            id: "d1".into(),
            tags: DeviceTags::default(),
            connected: false,
            states: DeviceState::default(),
        };
        assert_eq!(device.display_name(), "Unnamed Device");
        device.tags.custom_device_name = Some("Hall".into());
        assert_eq!(device.display_name(), "Hall");
        assert_eq!(device.status_label(), "Offline");
    }
}
