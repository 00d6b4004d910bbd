//! D-Bus proxy traits for the NetworkManager interfaces consumed here
//!
//! The `zbus::proxy` macro generates the proxy implementations. Object
//! layout:
//!
//! - `/org/freedesktop/NetworkManager` - main NM object
//! - `/org/freedesktop/NetworkManager/Devices/*` - device objects
//! - `/org/freedesktop/NetworkManager/AccessPoint/*` - access points
//! - `/org/freedesktop/NetworkManager/Settings` - connection settings

use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};

/// Proxy for the main NetworkManager interface
#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
pub trait NetworkManager {
    /// Paths of all known network devices
    fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    /// Activate a connection profile on a device
    fn activate_connection(
        &self,
        connection: &ObjectPath<'_>,
        device: &ObjectPath<'_>,
        specific_object: &ObjectPath<'_>,
    ) -> zbus::Result<OwnedObjectPath>;

    /// Deactivate an active connection
    fn deactivate_connection(&self, active_connection: &ObjectPath<'_>) -> zbus::Result<()>;

    /// Whether networking is enabled
    #[zbus(property)]
    fn networking_enabled(&self) -> zbus::Result<bool>;

    /// Enable or disable networking
    #[zbus(property)]
    fn set_networking_enabled(&self, enabled: bool) -> zbus::Result<()>;

    /// Whether the wireless radio is enabled
    #[zbus(property)]
    fn wireless_enabled(&self) -> zbus::Result<bool>;

    /// Enable or disable the wireless radio
    #[zbus(property)]
    fn set_wireless_enabled(&self, enabled: bool) -> zbus::Result<()>;
}

/// Proxy for the generic device interface
#[proxy(
    interface = "org.freedesktop.NetworkManager.Device",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait Device {
    /// Device type as a numeric code (2 = WiFi)
    #[zbus(property)]
    fn device_type(&self) -> zbus::Result<u32>;

    /// The kernel interface name (e.g. "wlan0")
    #[zbus(property)]
    fn ip_interface(&self) -> zbus::Result<String>;

    /// Current device state (100 = activated)
    #[zbus(property)]
    fn state(&self) -> zbus::Result<u32>;

    /// Path of the active connection ("/" if none)
    #[zbus(property)]
    fn active_connection(&self) -> zbus::Result<OwnedObjectPath>;
}

/// Proxy for the wireless device interface
#[proxy(
    interface = "org.freedesktop.NetworkManager.Device.Wireless",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait WirelessDevice {
    /// Hardware address of the wireless interface
    #[zbus(property)]
    fn hw_address(&self) -> zbus::Result<String>;

    /// Path of the currently associated access point ("/" if none)
    #[zbus(property)]
    fn active_access_point(&self) -> zbus::Result<OwnedObjectPath>;
}

/// Proxy for access point objects
#[proxy(
    interface = "org.freedesktop.NetworkManager.AccessPoint",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait AccessPoint {
    /// Raw SSID bytes
    #[zbus(property)]
    fn ssid(&self) -> zbus::Result<Vec<u8>>;

    /// Radio frequency in MHz
    #[zbus(property)]
    fn frequency(&self) -> zbus::Result<u32>;

    /// Signal strength in percent
    #[zbus(property)]
    fn strength(&self) -> zbus::Result<u8>;
}

/// Proxy for the connection settings service
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager/Settings"
)]
pub trait Settings {
    /// Persist a new connection profile, returning its path
    fn add_connection(
        &self,
        connection: HashMap<&str, HashMap<&str, Value<'_>>>,
    ) -> zbus::Result<OwnedObjectPath>;

    /// Look up a stored profile by its UUID
    fn get_connection_by_uuid(&self, uuid: &str) -> zbus::Result<OwnedObjectPath>;
}

/// Proxy for a stored connection profile
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings.Connection",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait SettingsConnection {
    /// Remove the profile from persistent storage
    fn delete(&self) -> zbus::Result<()>;
}

/// Proxy for active connection objects
#[proxy(
    interface = "org.freedesktop.NetworkManager.Connection.Active",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait ActiveConnection {
    /// UUID of the profile this connection was activated from
    #[zbus(property)]
    fn uuid(&self) -> zbus::Result<String>;
}
