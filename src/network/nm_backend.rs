//! NetworkManager backend
//!
//! Wraps the platform NetworkManager D-Bus service. The WiFi device is
//! looked up per operation by scanning the device list, never cached, so a
//! replaced adapter is tolerated at the cost of one extra round trip.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zbus::Connection;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};

use crate::core::error::{NetworkError, NetworkResult};
use crate::core::types::{ConnectionStatus, WifiSecurity};
use crate::network::backend::NetworkBackend;
use crate::network::proxies::{
    AccessPointProxy, ActiveConnectionProxy, DeviceProxy, NetworkManagerProxy, SettingsConnectionProxy,
    SettingsProxy, WirelessDeviceProxy,
};
use crate::network::watch::ConnectionWatch;

/// NMDeviceType value for WiFi devices
const DEVICE_TYPE_WIFI: u32 = 2;

/// NMDeviceState value for a fully activated device
const DEVICE_STATE_ACTIVATED: u32 = 100;

/// UUID of the connection profile owned by this service
const PROV_CONNECTION_UUID: &str = "e806a36c-7249-45c1-8872-ad19095807bd";

/// Human-readable id of the provisioned profile
const PROV_CONNECTION_ID: &str = "wifi-prov";

/// Snapshot of the WiFi device at lookup time
#[derive(Debug, Clone)]
struct WifiDevice {
    path: OwnedObjectPath,
    activated: bool,
    active_connection: OwnedObjectPath,
}

/// Network backend talking to NetworkManager over the system bus
#[derive(Clone)]
pub struct NetworkManagerBackend {
    connection: Connection,
}

impl NetworkManagerBackend {
    /// Create a backend on the shared bus connection
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    async fn manager(&self) -> NetworkResult<NetworkManagerProxy<'_>> {
        Ok(NetworkManagerProxy::new(&self.connection).await?)
    }

    /// Find the first WiFi device by scanning the device list
    async fn wifi_device(&self) -> NetworkResult<WifiDevice> {
        let manager = self.manager().await?;
        for path in manager.get_devices().await? {
            let device = DeviceProxy::new(&self.connection, path.clone()).await?;
            if device.device_type().await? != DEVICE_TYPE_WIFI {
                continue;
            }

            let state = device.state().await?;
            let active_connection = device.active_connection().await?;
            return Ok(WifiDevice {
                path,
                activated: state == DEVICE_STATE_ACTIVATED,
                active_connection,
            });
        }

        Err(NetworkError::NoWifiDevice)
    }

    /// Persist the provisioning profile and return its path
    async fn add_connection(
        &self,
        ssid: &str,
        security: Option<&WifiSecurity>,
    ) -> NetworkResult<OwnedObjectPath> {
        let mut profile: HashMap<&str, HashMap<&str, Value<'_>>> = HashMap::new();

        profile.insert(
            "connection",
            HashMap::from([
                ("uuid", Value::from(PROV_CONNECTION_UUID)),
                ("type", Value::from("802-11-wireless")),
                ("id", Value::from(PROV_CONNECTION_ID)),
            ]),
        );
        profile.insert(
            "802-11-wireless",
            HashMap::from([("ssid", Value::from(ssid.as_bytes().to_vec()))]),
        );

        if let Some(WifiSecurity::WpaPsk { psk }) = security {
            profile.insert(
                "802-11-wireless-security",
                HashMap::from([
                    ("key-mgmt", Value::from("wpa-psk")),
                    ("psk", Value::from(psk.as_str())),
                ]),
            );
        }

        let settings = SettingsProxy::new(&self.connection).await?;
        Ok(settings.add_connection(profile).await?)
    }

    /// Remove the provisioning profile from persistent storage
    async fn remove_connection(&self, uuid: &str) -> NetworkResult<()> {
        let settings = SettingsProxy::new(&self.connection).await?;
        let path = settings.get_connection_by_uuid(uuid).await?;
        let profile = SettingsConnectionProxy::new(&self.connection, path).await?;
        profile.delete().await?;
        Ok(())
    }
}

impl NetworkBackend for NetworkManagerBackend {
    async fn is_networking_enabled(&self) -> NetworkResult<bool> {
        Ok(self.manager().await?.networking_enabled().await?)
    }

    async fn set_networking_enabled(&self, enabled: bool) -> NetworkResult<()> {
        Ok(self.manager().await?.set_networking_enabled(enabled).await?)
    }

    async fn is_wireless_enabled(&self) -> NetworkResult<bool> {
        Ok(self.manager().await?.wireless_enabled().await?)
    }

    async fn set_wireless_enabled(&self, enabled: bool) -> NetworkResult<()> {
        Ok(self.manager().await?.set_wireless_enabled(enabled).await?)
    }

    async fn mac_address(&self) -> NetworkResult<String> {
        let device = self.wifi_device().await?;
        let wireless = WirelessDeviceProxy::new(&self.connection, device.path).await?;
        Ok(wireless.hw_address().await?)
    }

    async fn connection_status(&self) -> NetworkResult<ConnectionStatus> {
        let device = self.wifi_device().await?;
        if !device.activated {
            return Ok(ConnectionStatus::disconnected());
        }

        let wireless = WirelessDeviceProxy::new(&self.connection, device.path).await?;
        let ap_path = wireless.active_access_point().await?;
        if ap_path.as_str() == "/" {
            // Activated but no associated access point yet
            return Ok(ConnectionStatus {
                connected: true,
                ssid: None,
                frequency: None,
                strength: None,
            });
        }

        let ap = AccessPointProxy::new(&self.connection, ap_path).await?;
        let ssid = String::from_utf8_lossy(&ap.ssid().await?).into_owned();
        Ok(ConnectionStatus::connected(
            ssid,
            ap.frequency().await?,
            ap.strength().await?,
        ))
    }

    async fn watch_connection_status(&self) -> NetworkResult<ConnectionWatch> {
        let device = self.wifi_device().await?;
        let connected = Arc::new(AtomicBool::new(device.activated));
        let (tx, rx) = mpsc::unbounded_channel();

        let connection = self.connection.clone();
        let flag = connected.clone();
        let device_path = device.path;

        let source = tokio::spawn(async move {
            let proxy = match DeviceProxy::new(&connection, device_path).await {
                Ok(proxy) => proxy,
                Err(e) => {
                    warn!("connection watch setup failed: {e}");
                    return;
                }
            };

            let mut states = proxy.receive_state_changed().await;
            while let Some(change) = states.next().await {
                let state = match change.get().await {
                    Ok(state) => state,
                    Err(e) => {
                        debug!("state property read failed: {e}");
                        continue;
                    }
                };

                let activated = state == DEVICE_STATE_ACTIVATED;
                if flag.swap(activated, Ordering::SeqCst) != activated {
                    debug!(activated, "wifi link state transition");
                    if tx.send(activated).is_err() {
                        break;
                    }
                }
            }
        });

        Ok(ConnectionWatch::new(connected, rx, Some(source)))
    }

    async fn connect(&self, ssid: &str, security: Option<&WifiSecurity>) -> NetworkResult<()> {
        let profile = self.add_connection(ssid, security).await?;
        let device = self.wifi_device().await?;

        let manager = self.manager().await?;
        manager
            .activate_connection(&profile, &device.path, &ObjectPath::try_from("/")?)
            .await?;
        Ok(())
    }

    async fn disconnect(&self) -> NetworkResult<()> {
        let device = self.wifi_device().await?;
        if device.active_connection.as_str() == "/" {
            return Ok(());
        }

        let active =
            ActiveConnectionProxy::new(&self.connection, device.active_connection.clone()).await?;
        let uuid = active.uuid().await?;

        let manager = self.manager().await?;
        manager
            .deactivate_connection(&device.active_connection)
            .await?;

        // Only remove profiles this service created
        if uuid == PROV_CONNECTION_UUID {
            self.remove_connection(PROV_CONNECTION_UUID).await?;
        }

        Ok(())
    }
}
