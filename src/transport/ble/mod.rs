//! BLE GATT peripheral transport
//!
//! Hand-built emulation of the object tree BlueZ expects from a registered
//! GATT application: the static model lives in [`gatt`], inbound bus calls
//! are answered by [`dispatcher`], behaviors live in [`characteristics`]
//! and [`peripheral`] performs the one-shot installation.

pub mod bluez;
pub mod characteristics;
pub mod dispatcher;
pub mod gatt;
pub mod peripheral;
pub mod uuids;

pub use peripheral::ProvisioningPeripheral;
