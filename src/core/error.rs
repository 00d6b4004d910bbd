//! Error types for the WiFi provisioning service

use thiserror::Error;

use crate::transport::ble::gatt::CharacteristicKey;

/// Result type for network backend operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Result type for command protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Result type for BLE transport operations
pub type BleResult<T> = Result<T, BleError>;

/// Errors related to the network management backend
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("invalid object path: {0}")]
    Path(#[from] zbus::zvariant::Error),

    #[error("no wifi device found")]
    NoWifiDevice,

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while decrypting a command field
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid initialization vector length")]
    InvalidIvLength,

    #[error("decryption failed")]
    Decrypt,
}

/// Errors raised by the command protocol pipeline
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown security type={0}")]
    UnknownSecurityType(String),

    #[error("invalid challenge")]
    InvalidChallenge,

    #[error("decrypted field is not valid UTF-8")]
    InvalidUtf8,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Errors raised while executing a characteristic behavior
///
/// The dispatcher converts every variant into a generic
/// `org.bluez.Error.Failed` reply; the detail is only logged locally.
#[derive(Error, Debug)]
pub enum BehaviorError {
    #[error("characteristic '{key}' does not support {operation}")]
    Unsupported {
        key: CharacteristicKey,
        operation: &'static str,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors related to the BLE peripheral installation and transport
#[derive(Error, Debug)]
pub enum BleError {
    #[error("already installed")]
    AlreadyInstalled,

    #[error("default adapter not found")]
    AdapterNotFound,

    #[error("invalid object path: {0}")]
    Path(#[from] zbus::zvariant::Error),

    #[error("characteristic '{key}' declares '{flag}' without a matching behavior")]
    MissingBehavior {
        key: CharacteristicKey,
        flag: &'static str,
    },

    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("D-Bus error: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    #[error(transparent)]
    Network(#[from] NetworkError),
}
