// Copyright 2025 Tim Roberts
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

use super::ParseError;

/// Path of the device-info endpoint, relative to the device location.
pub const DEVICE_INFO_PATH: &str = "query/device-info";

/// Parsed `<device-info>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Name the user gave the device (e.g. "Living Room").
    pub friendly_device_name: String,
    /// Identifier the device reports for itself.
    pub device_id: String,
    pub udn: Option<String>,
    pub serial_number: Option<String>,
    pub vendor_name: Option<String>,
    pub model_name: Option<String>,
    pub model_number: Option<String>,
    pub user_device_name: Option<String>,
    pub software_version: Option<String>,
    pub power_mode: Option<String>,
    pub network_name: Option<String>,
}

/// Wire shape of the document. Every element is optional here so that a
/// missing required element is reported by name rather than as a generic
/// deserializer error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawDeviceInfo {
    friendly_device_name: Option<String>,
    device_id: Option<String>,
    udn: Option<String>,
    serial_number: Option<String>,
    vendor_name: Option<String>,
    model_name: Option<String>,
    model_number: Option<String>,
    user_device_name: Option<String>,
    software_version: Option<String>,
    power_mode: Option<String>,
    network_name: Option<String>,
}

impl DeviceInfo {
    /// Parse a device-info XML document.
    ///
    /// Unknown elements are ignored. Values are trimmed, and blank elements
    /// count as absent. The friendly name is trimmed like every other value,
    /// so the remembered name is trimmed before it is compared against it.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        let raw: RawDeviceInfo = quick_xml::de::from_str(xml)
            .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;

        Ok(Self {
            friendly_device_name: non_blank(raw.friendly_device_name)
                .ok_or(ParseError::MissingField("friendly-device-name"))?,
            device_id: non_blank(raw.device_id).ok_or(ParseError::MissingField("device-id"))?,
            udn: non_blank(raw.udn),
            serial_number: non_blank(raw.serial_number),
            vendor_name: non_blank(raw.vendor_name),
            model_name: non_blank(raw.model_name),
            model_number: non_blank(raw.model_number),
            user_device_name: non_blank(raw.user_device_name),
            software_version: non_blank(raw.software_version),
            power_mode: non_blank(raw.power_mode),
            network_name: non_blank(raw.network_name),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
