//! WiFi Provisioning Service
//!
//! Exposes a WiFi-credential provisioning endpoint over BLE by emulating a
//! GATT peripheral directly on the system bus: the object tree BlueZ
//! expects is answered by a hand-built message dispatcher, and validated
//! commands (AES-256-CBC encrypted, challenge-protected) are relayed to
//! NetworkManager.

pub mod config;
pub mod core;
pub mod network;
pub mod transport;

pub use core::{
    crypto::Cipher,
    error::{BehaviorError, BleError, CryptoError, NetworkError, ProtocolError},
    types::{AccessPointInfo, ConnectionStatus, WifiSecurity},
};
pub use network::{NetworkBackend, NetworkManagerBackend};
pub use transport::ble::ProvisioningPeripheral;
