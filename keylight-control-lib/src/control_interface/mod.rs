use clap::ValueEnum;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::util::discovery::Device;

/// One controllable light inside an accessory. Most Key Light devices own
/// exactly one. Field names follow the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    /// 0 = off, 1 = on.
    pub on: i32,
    /// Percentage-like scale, device defined. Not validated here.
    pub brightness: i32,
    /// Mired-like scale, device defined. Not validated here.
    pub temperature: i32,
}

/// The set of configurable lights within one accessory.
///
/// `number_of_lights` matching `lights.len()` is an invariant enforced by
/// the device firmware on every value it returns or accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightGroup {
    #[serde(rename = "numberOfLights")]
    pub number_of_lights: i32,
    pub lights: Vec<Light>,
}

/// Read-only metadata for an accessory.
///
/// Other Elgato products may expose `_elg._tcp` services too, so this is
/// the place to look when an unexpected device shows up in discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryInfo {
    pub product_name: String,
    pub hardware_board_type: i32,
    pub firmware_build_number: i32,
    pub firmware_version: String,
    pub serial_number: String,
    pub display_name: String,
    pub features: Vec<String>,
}

/// Power-on and transition behaviour configured on the accessory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    pub power_on_behavior: i32,
    pub power_on_brightness: i32,
    pub power_on_temperature: i32,
    pub switch_on_duration_ms: i32,
    pub switch_off_duration_ms: i32,
    pub color_change_duration_ms: i32,
}

/// Desired power transition for a switch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PowerAction {
    On,
    Off,
    Toggle,
}

/// The changes a switch operation applies to every light in a group.
///
/// Negative brightness/temperature values leave the fetched value
/// unchanged. Zero is a real value, not "unset".
#[derive(Debug, Clone, Copy)]
pub struct LightAdjustment {
    pub action: PowerAction,
    pub brightness: i32,
    pub temperature: i32,
}

impl LightAdjustment {
    /// An adjustment that only changes the power state.
    pub fn power_only(action: PowerAction) -> Self {
        LightAdjustment {
            action,
            brightness: -1,
            temperature: -1,
        }
    }
}

impl LightGroup {
    /// Returns an independent copy with `adjustment` applied to every
    /// light. The fetched value is left untouched so a failed write cannot
    /// be mistaken for having been applied.
    pub fn adjusted(&self, adjustment: &LightAdjustment) -> LightGroup {
        let mut next = self.clone();
        for light in &mut next.lights {
            light.on = match adjustment.action {
                PowerAction::On => 1,
                PowerAction::Off => 0,
                PowerAction::Toggle => {
                    if light.on == 0 {
                        1
                    } else {
                        0
                    }
                }
            };
            if adjustment.brightness >= 0 {
                light.brightness = adjustment.brightness;
            }
            if adjustment.temperature >= 0 {
                light.temperature = adjustment.temperature;
            }
        }
        next
    }
}

/// HTTP control channel to one resolved accessory.
///
/// Every call is a single request/response exchange; transient failures
/// surface to the caller instead of being retried here.
#[derive(Debug, Clone)]
pub struct ControlInterface {
    device: Device,
    client: Client,
}

impl ControlInterface {
    pub fn new(device: &Device) -> Self {
        ControlInterface {
            device: device.clone(),
            client: Client::new(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}:{}/{}", self.device.address, self.device.port, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::http(&self.device, e))?;
        self.decode(response).await
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::http(&self.device, e))?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, Error> {
        if !response.status().is_success() {
            return Err(Error::unexpected_status(&self.device, response.status()));
        }
        response.json().await.map_err(|e| Error::http(&self.device, e))
    }

    /// Fetches all individual lights owned by the accessory. This in
    /// conjunction with [`Self::update_light_group`] is how lights are
    /// controlled.
    pub async fn fetch_light_group(&self) -> Result<LightGroup, Error> {
        self.get_json("elgato/lights").await
    }

    /// Writes a full replacement light group and returns the device's
    /// authoritative post-write state.
    pub async fn update_light_group(&self, group: &LightGroup) -> Result<LightGroup, Error> {
        debug!("updating light group on {}", self.device.label());
        self.put_json("elgato/lights", group).await
    }

    /// Fetches accessory metadata.
    pub async fn fetch_accessory_info(&self) -> Result<AccessoryInfo, Error> {
        self.get_json("elgato/accessory-info").await
    }

    /// Fetches general device settings.
    pub async fn fetch_settings(&self) -> Result<DeviceSettings, Error> {
        self.get_json("elgato/lights/settings").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(lights: Vec<Light>) -> LightGroup {
        LightGroup {
            number_of_lights: lights.len() as i32,
            lights,
        }
    }

    #[test]
    fn test_adjustment_sets_power_and_leaves_sentinel_fields() {
        let fetched = group(vec![Light {
            on: 0,
            brightness: 20,
            temperature: 200,
        }]);

        let next = fetched.adjusted(&LightAdjustment::power_only(PowerAction::On));
        assert_eq!(next.lights[0].on, 1);
        assert_eq!(next.lights[0].brightness, 20);
        assert_eq!(next.lights[0].temperature, 200);

        // The fetched value stays untouched.
        assert_eq!(fetched.lights[0].on, 0);
    }

    #[test]
    fn test_adjustment_zero_is_a_real_value() {
        let fetched = group(vec![Light {
            on: 1,
            brightness: 20,
            temperature: 200,
        }]);

        let next = fetched.adjusted(&LightAdjustment {
            action: PowerAction::On,
            brightness: 0,
            temperature: 0,
        });
        assert_eq!(next.lights[0].brightness, 0);
        assert_eq!(next.lights[0].temperature, 0);
    }

    #[test]
    fn test_toggle_flips_each_light_independently() {
        let fetched = group(vec![
            Light {
                on: 0,
                brightness: 20,
                temperature: 200,
            },
            Light {
                on: 1,
                brightness: 50,
                temperature: 300,
            },
        ]);

        let next = fetched.adjusted(&LightAdjustment::power_only(PowerAction::Toggle));
        assert_eq!(next.lights[0].on, 1);
        assert_eq!(next.lights[1].on, 0);
    }

    #[test]
    fn test_light_group_wire_shape() {
        let json = serde_json::to_value(group(vec![Light {
            on: 1,
            brightness: 50,
            temperature: 250,
        }]))
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "numberOfLights": 1,
                "lights": [{"on": 1, "brightness": 50, "temperature": 250}],
            })
        );
    }

    #[test]
    fn test_accessory_info_wire_shape() {
        let info: AccessoryInfo = serde_json::from_str(
            r#"{
                "productName": "Elgato Key Light",
                "hardwareBoardType": 53,
                "firmwareBuildNumber": 192,
                "firmwareVersion": "1.0.3",
                "serialNumber": "CW0000000000",
                "displayName": "Desk Light",
                "features": ["lights"]
            }"#,
        )
        .unwrap();

        assert_eq!(info.product_name, "Elgato Key Light");
        assert_eq!(info.features, vec!["lights".to_string()]);
    }

    #[test]
    fn test_device_settings_wire_shape() {
        let settings: DeviceSettings = serde_json::from_str(
            r#"{
                "powerOnBehavior": 1,
                "powerOnBrightness": 20,
                "powerOnTemperature": 230,
                "switchOnDurationMs": 100,
                "switchOffDurationMs": 300,
                "colorChangeDurationMs": 100
            }"#,
        )
        .unwrap();

        assert_eq!(settings.power_on_behavior, 1);
        assert_eq!(settings.switch_off_duration_ms, 300);
    }
}
