//! Network management backends
//!
//! [`NetworkBackend`] is the seam between the BLE transport and the
//! platform: production uses [`NetworkManagerBackend`], tests use the
//! in-memory mock.

pub mod backend;
pub mod nm_backend;
pub mod proxies;
pub mod watch;

#[cfg(test)]
pub mod mock_backend;

pub use backend::NetworkBackend;
pub use nm_backend::NetworkManagerBackend;
pub use watch::ConnectionWatch;

#[cfg(test)]
pub use mock_backend::MockNetworkBackend;
