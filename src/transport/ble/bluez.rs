//! BlueZ constants and proxy traits
//!
//! Only the registration side uses generated proxies; the application
//! objects themselves are answered by the hand-built dispatcher, since
//! BlueZ calls back into them with plain bus RPC.

use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};

use crate::core::error::{BleError, BleResult};

/// Well-known bus name of the Bluetooth daemon
pub const BLUEZ_SERVICE: &str = "org.bluez";

/// Standard properties interface
pub const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";

/// Standard object manager interface
pub const OBJECT_MANAGER_IFACE: &str = "org.freedesktop.DBus.ObjectManager";

/// GATT service interface implemented by the service root object
pub const GATT_SERVICE_IFACE: &str = "org.bluez.GattService1";

/// GATT characteristic interface implemented by the child objects
pub const GATT_CHARACTERISTIC_IFACE: &str = "org.bluez.GattCharacteristic1";

/// Advertisement interface implemented by the advertisement object
pub const LE_ADVERTISEMENT_IFACE: &str = "org.bluez.LEAdvertisement1";

/// Generic operation-failed error name returned for behavior failures
pub const ERROR_FAILED: &str = "org.bluez.Error.Failed";

/// Adapter interface, used only to power the radio on
#[proxy(interface = "org.bluez.Adapter1", default_service = "org.bluez")]
pub trait Adapter {
    /// Whether the radio is powered
    #[zbus(property)]
    fn powered(&self) -> zbus::Result<bool>;

    /// Power the radio on or off
    #[zbus(property)]
    fn set_powered(&self, powered: bool) -> zbus::Result<()>;
}

/// GATT application registration on the adapter object
#[proxy(interface = "org.bluez.GattManager1", default_service = "org.bluez")]
pub trait GattManager {
    /// Register the application rooted at `application`
    fn register_application(
        &self,
        application: &ObjectPath<'_>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;
}

/// Advertisement registration on the adapter object
#[proxy(
    interface = "org.bluez.LEAdvertisingManager1",
    default_service = "org.bluez"
)]
pub trait LeAdvertisingManager {
    /// Register the advertisement object at `advertisement`
    fn register_advertisement(
        &self,
        advertisement: &ObjectPath<'_>,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;
}

/// Find the first Bluetooth adapter object
///
/// Scans a fresh object-tree snapshot on every call instead of caching, so
/// a replaced adapter is picked up by the next lookup.
pub async fn find_adapter(connection: &zbus::Connection) -> BleResult<OwnedObjectPath> {
    let object_manager = zbus::fdo::ObjectManagerProxy::builder(connection)
        .destination(BLUEZ_SERVICE)?
        .path("/")?
        .build()
        .await?;

    let objects = object_manager.get_managed_objects().await?;
    objects
        .into_iter()
        .find(|(_, interfaces)| interfaces.contains_key("org.bluez.Adapter1"))
        .map(|(path, _)| path)
        .ok_or(BleError::AdapterNotFound)
}
