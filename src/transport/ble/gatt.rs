//! Static GATT object model
//!
//! Pure data describing the provisioning service, its characteristics and
//! the advertisement, in the object-tree shape BlueZ expects back from a
//! registered application. No I/O happens here; the dispatcher queries this
//! model to answer `GetManagedObjects` and property calls.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};

use crate::core::error::{BleError, BleResult};
use crate::transport::ble::bluez::{GATT_CHARACTERISTIC_IFACE, GATT_SERVICE_IFACE, PROPERTIES_IFACE};
use crate::transport::ble::uuids;

/// Stable keys identifying the declared characteristics
///
/// The key doubles as the child object path suffix below the service root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKey {
    /// Connection status, one byte, read + notify
    Connected,
    /// WiFi hardware address, read only
    Mac,
    /// Active access point info as JSON, read only
    Ap,
    /// Encrypted command sink, write only
    Command,
}

impl CharacteristicKey {
    /// All keys in declaration order
    pub const ALL: [CharacteristicKey; 4] = [Self::Connected, Self::Mac, Self::Ap, Self::Command];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Mac => "mac",
            Self::Ap => "ap",
            Self::Command => "command",
        }
    }

    /// Resolve an object path suffix back to a key
    pub fn from_path_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == suffix)
    }
}

impl fmt::Display for CharacteristicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared capability flags of a characteristic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacteristicFlags {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl CharacteristicFlags {
    pub const READ: Self = Self {
        read: true,
        write: false,
        notify: false,
    };

    pub const WRITE: Self = Self {
        read: false,
        write: true,
        notify: false,
    };

    pub const READ_NOTIFY: Self = Self {
        read: true,
        write: false,
        notify: true,
    };

    /// Flag strings in the form BlueZ expects in the `Flags` property
    pub fn to_strings(self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.read {
            flags.push("read".to_string());
        }
        if self.write {
            flags.push("write".to_string());
        }
        if self.notify {
            flags.push("notify".to_string());
        }
        flags
    }
}

/// One declared characteristic of the provisioning service
#[derive(Debug, Clone)]
pub struct GattCharacteristic {
    pub key: CharacteristicKey,
    pub uuid: Uuid,
    pub flags: CharacteristicFlags,
}

/// The provisioning GATT service, immutable for the process lifetime
#[derive(Debug, Clone)]
pub struct GattService {
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<GattCharacteristic>,
}

impl GattService {
    /// The provisioning service with its four fixed characteristics
    pub fn provisioning() -> Self {
        Self {
            uuid: uuids::SERVICE_UUID,
            primary: true,
            characteristics: vec![
                GattCharacteristic {
                    key: CharacteristicKey::Connected,
                    uuid: uuids::CONNECTED_CHARACTERISTIC_UUID,
                    flags: CharacteristicFlags::READ_NOTIFY,
                },
                GattCharacteristic {
                    key: CharacteristicKey::Mac,
                    uuid: uuids::MAC_CHARACTERISTIC_UUID,
                    flags: CharacteristicFlags::READ,
                },
                GattCharacteristic {
                    key: CharacteristicKey::Ap,
                    uuid: uuids::AP_CHARACTERISTIC_UUID,
                    flags: CharacteristicFlags::READ,
                },
                GattCharacteristic {
                    key: CharacteristicKey::Command,
                    uuid: uuids::COMMAND_CHARACTERISTIC_UUID,
                    flags: CharacteristicFlags::WRITE,
                },
            ],
        }
    }

    /// Check that every declared flag has a matching behavior
    ///
    /// `capabilities` reports what the behavior set actually implements per
    /// key. A declared flag without an implementation would surface as a
    /// timed-out daemon call at runtime, so it is rejected at construction.
    pub fn validate<F>(&self, capabilities: F) -> BleResult<()>
    where
        F: Fn(CharacteristicKey) -> CharacteristicFlags,
    {
        for characteristic in &self.characteristics {
            let implemented = capabilities(characteristic.key);
            let declared = characteristic.flags;
            if declared.read && !implemented.read {
                return Err(BleError::MissingBehavior {
                    key: characteristic.key,
                    flag: "read",
                });
            }
            if declared.write && !implemented.write {
                return Err(BleError::MissingBehavior {
                    key: characteristic.key,
                    flag: "write",
                });
            }
            if declared.notify && !implemented.notify {
                return Err(BleError::MissingBehavior {
                    key: characteristic.key,
                    flag: "notify",
                });
            }
        }
        Ok(())
    }

    /// Child object path of a characteristic below the service root
    pub fn characteristic_path(
        service_path: &ObjectPath<'_>,
        key: CharacteristicKey,
    ) -> BleResult<OwnedObjectPath> {
        let path = ObjectPath::try_from(format!("{service_path}/{key}"))?;
        Ok(path.into())
    }

    /// The full object tree for a `GetManagedObjects` reply
    ///
    /// Exactly one entry per object: the service itself plus one child per
    /// declared characteristic. Repeated calls return the same tree.
    pub fn managed_objects(
        &self,
        service_path: &ObjectPath<'_>,
    ) -> BleResult<HashMap<OwnedObjectPath, HashMap<String, HashMap<String, Value<'static>>>>> {
        let mut objects = HashMap::new();

        let service_props = HashMap::from([
            ("UUID".to_string(), Value::from(self.uuid.to_string())),
            ("Primary".to_string(), Value::from(self.primary)),
        ]);
        objects.insert(
            OwnedObjectPath::from(service_path.to_owned()),
            HashMap::from([
                (PROPERTIES_IFACE.to_string(), HashMap::new()),
                (GATT_SERVICE_IFACE.to_string(), service_props),
            ]),
        );

        for characteristic in &self.characteristics {
            let path = Self::characteristic_path(service_path, characteristic.key)?;
            let props = HashMap::from([
                (
                    "UUID".to_string(),
                    Value::from(characteristic.uuid.to_string()),
                ),
                (
                    "Service".to_string(),
                    Value::from(service_path.to_owned()),
                ),
                (
                    "Flags".to_string(),
                    Value::from(characteristic.flags.to_strings()),
                ),
            ]);
            objects.insert(
                path,
                HashMap::from([
                    (PROPERTIES_IFACE.to_string(), HashMap::new()),
                    (GATT_CHARACTERISTIC_IFACE.to_string(), props),
                ]),
            );
        }

        Ok(objects)
    }
}

/// The standalone LE advertisement object
#[derive(Debug, Clone)]
pub struct Advertisement {
    pub local_name: String,
    pub service_uuid: Uuid,
}

impl Advertisement {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            service_uuid: uuids::SERVICE_UUID,
        }
    }

    /// The property set returned for `GetAll` on the advertisement path
    pub fn properties(&self) -> HashMap<String, Value<'static>> {
        HashMap::from([
            ("Type".to_string(), Value::from("peripheral")),
            (
                "ServiceUUIDs".to_string(),
                Value::from(vec![self.service_uuid.to_string()]),
            ),
            (
                "LocalName".to_string(),
                Value::from(self.local_name.clone()),
            ),
            ("IncludeTxPower".to_string(), Value::from(true)),
        ])
    }
}
