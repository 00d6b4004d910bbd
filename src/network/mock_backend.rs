//! Scripted in-memory network backend for tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::core::error::{NetworkError, NetworkResult};
use crate::core::types::{ConnectionStatus, WifiSecurity};
use crate::network::backend::NetworkBackend;
use crate::network::watch::ConnectionWatch;

#[derive(Default)]
struct MockState {
    networking_enabled: bool,
    wireless_enabled: bool,
    mac: String,
    status: ConnectionStatus,
    connect_calls: Vec<(String, Option<WifiSecurity>)>,
    disconnect_calls: usize,
    fail_connect: bool,
    watch_flags: Vec<Arc<AtomicBool>>,
    watch_senders: Vec<mpsc::UnboundedSender<bool>>,
}

/// Mock backend recording calls and replaying a scripted link state
#[derive(Clone)]
pub struct MockNetworkBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockNetworkBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                networking_enabled: true,
                wireless_enabled: true,
                mac: "aa:bb:cc:dd:ee:ff".to_string(),
                ..Default::default()
            })),
        }
    }

    /// Script the status returned by `connection_status`
    pub async fn set_status(&self, status: ConnectionStatus) {
        self.state.lock().await.status = status;
    }

    /// Make subsequent `connect` calls fail
    pub async fn set_connect_failure(&self, fail: bool) {
        self.state.lock().await.fail_connect = fail;
    }

    /// Arguments of every `connect` call so far
    pub async fn connect_calls(&self) -> Vec<(String, Option<WifiSecurity>)> {
        self.state.lock().await.connect_calls.clone()
    }

    /// Number of `disconnect` calls so far
    pub async fn disconnect_calls(&self) -> usize {
        self.state.lock().await.disconnect_calls
    }

    /// Simulate a link-state transition, fanned out to all live watches
    pub async fn push_status_change(&self, connected: bool) {
        let mut state = self.state.lock().await;
        state.status.connected = connected;
        for flag in &state.watch_flags {
            flag.store(connected, Ordering::SeqCst);
        }
        state.watch_senders.retain(|tx| tx.send(connected).is_ok());
    }
}

impl Default for MockNetworkBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBackend for MockNetworkBackend {
    async fn is_networking_enabled(&self) -> NetworkResult<bool> {
        Ok(self.state.lock().await.networking_enabled)
    }

    async fn set_networking_enabled(&self, enabled: bool) -> NetworkResult<()> {
        self.state.lock().await.networking_enabled = enabled;
        Ok(())
    }

    async fn is_wireless_enabled(&self) -> NetworkResult<bool> {
        Ok(self.state.lock().await.wireless_enabled)
    }

    async fn set_wireless_enabled(&self, enabled: bool) -> NetworkResult<()> {
        self.state.lock().await.wireless_enabled = enabled;
        Ok(())
    }

    async fn mac_address(&self) -> NetworkResult<String> {
        Ok(self.state.lock().await.mac.clone())
    }

    async fn connection_status(&self) -> NetworkResult<ConnectionStatus> {
        Ok(self.state.lock().await.status.clone())
    }

    async fn watch_connection_status(&self) -> NetworkResult<ConnectionWatch> {
        let mut state = self.state.lock().await;
        let flag = Arc::new(AtomicBool::new(state.status.connected));
        let (tx, rx) = mpsc::unbounded_channel();
        state.watch_flags.push(flag.clone());
        state.watch_senders.push(tx);
        Ok(ConnectionWatch::new(flag, rx, None))
    }

    async fn connect(&self, ssid: &str, security: Option<&WifiSecurity>) -> NetworkResult<()> {
        let mut state = self.state.lock().await;
        state
            .connect_calls
            .push((ssid.to_string(), security.cloned()));
        if state.fail_connect {
            return Err(NetworkError::Unavailable("scripted failure".to_string()));
        }
        state.status = ConnectionStatus::connected(ssid.to_string(), 2412, 80);
        Ok(())
    }

    async fn disconnect(&self) -> NetworkResult<()> {
        let mut state = self.state.lock().await;
        state.disconnect_calls += 1;
        state.status = ConnectionStatus::disconnected();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_mock_records_connect_calls() {
        let backend = MockNetworkBackend::new();
        backend.connect("net-a", None).await.unwrap();
        backend
            .connect(
                "net-b",
                Some(&WifiSecurity::WpaPsk {
                    psk: "hunter22".to_string(),
                }),
            )
            .await
            .unwrap();

        let calls = backend.connect_calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ("net-a".to_string(), None));
        assert!(backend.connection_status().await.unwrap().connected);
    }

    #[tokio::test]
    async fn test_mock_watch_sees_pushed_transitions() {
        let backend = MockNetworkBackend::new();
        let mut watch = backend.watch_connection_status().await.unwrap();
        assert!(!watch.connected());

        let mut events = watch.take_events().unwrap();
        backend.push_status_change(true).await;

        assert_eq!(events.recv().await, Some(true));
        assert!(watch.connected());
    }

    #[tokio::test]
    async fn test_mock_scripted_connect_failure() {
        let backend = MockNetworkBackend::new();
        backend.set_connect_failure(true).await;
        assert!(backend.connect("net", None).await.is_err());
        assert_eq!(backend.connect_calls().await.len(), 1);
        assert_eq!(backend.disconnect_calls().await, 0);
    }
}
