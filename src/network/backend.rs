//! Network backend trait definition

use trait_variant::make;

use crate::core::error::NetworkResult;
use crate::core::types::{ConnectionStatus, WifiSecurity};
use crate::network::watch::ConnectionWatch;

/// Abstraction over the platform's network management service
///
/// This trait enables testing by allowing mock implementations while
/// providing a standard interface for radio state, WiFi device queries and
/// the connection lifecycle.
#[make(Send)]
pub trait NetworkBackend: Sync + 'static {
    /// Whether networking is enabled at all
    async fn is_networking_enabled(&self) -> NetworkResult<bool>;

    /// Enable or disable networking
    async fn set_networking_enabled(&self, enabled: bool) -> NetworkResult<()>;

    /// Whether the wireless radio is enabled
    async fn is_wireless_enabled(&self) -> NetworkResult<bool>;

    /// Enable or disable the wireless radio
    async fn set_wireless_enabled(&self, enabled: bool) -> NetworkResult<()>;

    /// Hardware address of the WiFi interface, string form ("aa:bb:...")
    async fn mac_address(&self) -> NetworkResult<String>;

    /// Point-in-time link status of the WiFi device
    async fn connection_status(&self) -> NetworkResult<ConnectionStatus>;

    /// Subscribe to link-state transitions of the WiFi device
    ///
    /// The returned watch delivers one event per transition, in order, and
    /// tracks the current connected flag until closed.
    async fn watch_connection_status(&self) -> NetworkResult<ConnectionWatch>;

    /// Create and activate a connection profile for the given SSID
    async fn connect(&self, ssid: &str, security: Option<&WifiSecurity>) -> NetworkResult<()>;

    /// Deactivate the current connection and remove the provisioned profile
    async fn disconnect(&self) -> NetworkResult<()>;
}
