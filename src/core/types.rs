//! Domain types for WiFi provisioning

use serde::{Deserialize, Serialize};

/// Point-in-time WiFi link status as reported by the network backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Whether the WiFi device is activated
    pub connected: bool,
    /// SSID of the active access point (if connected)
    pub ssid: Option<String>,
    /// Frequency of the active access point in MHz (if connected)
    pub frequency: Option<u32>,
    /// Signal strength of the active access point in percent (if connected)
    pub strength: Option<u8>,
}

impl ConnectionStatus {
    /// Status for a device without an active connection
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ssid: None,
            frequency: None,
            strength: None,
        }
    }

    /// Status for a device connected to the given access point
    pub fn connected(ssid: impl Into<String>, frequency: u32, strength: u8) -> Self {
        Self {
            connected: true,
            ssid: Some(ssid.into()),
            frequency: Some(frequency),
            strength: Some(strength),
        }
    }
}

/// Payload of the access-point characteristic read
///
/// Serialized as UTF-8 JSON; field order matters for the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessPointInfo {
    pub ssid: String,
    pub frequency: u32,
    pub strength: u8,
}

impl AccessPointInfo {
    /// Build the payload from a connected status, `None` while disconnected
    pub fn from_status(status: &ConnectionStatus) -> Option<Self> {
        if !status.connected {
            return None;
        }

        Some(Self {
            ssid: status.ssid.clone().unwrap_or_default(),
            frequency: status.frequency.unwrap_or_default(),
            strength: status.strength.unwrap_or_default(),
        })
    }
}

/// Security settings of a connection request, decrypted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiSecurity {
    /// WPA with a pre-shared key (passphrase form)
    WpaPsk { psk: String },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_access_point_info_disconnected() {
        assert_eq!(
            AccessPointInfo::from_status(&ConnectionStatus::disconnected()),
            None
        );
    }

    #[test]
    fn test_access_point_info_payload_shape() {
        let status = ConnectionStatus::connected("home-net", 2437, 70);
        let info = AccessPointInfo::from_status(&status).unwrap();
        let json = serde_json::to_string(&info).unwrap();

        assert_eq!(json, r#"{"ssid":"home-net","frequency":2437,"strength":70}"#);
    }
}
