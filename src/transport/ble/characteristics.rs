//! Characteristic behavior set
//!
//! Implements the four declared characteristics against the network
//! backend. The handler never touches the bus itself; notifications are
//! pushed as raw payloads into a sink owned by the dispatcher, which turns
//! them into property-changed signals.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::command::CommandProcessor;
use crate::core::crypto::Cipher;
use crate::core::error::BehaviorError;
use crate::core::types::AccessPointInfo;
use crate::network::{ConnectionWatch, NetworkBackend};
use crate::transport::ble::gatt::{CharacteristicFlags, CharacteristicKey};

/// The single live notify subscription and its forwarder task
struct ActiveWatch {
    watch: ConnectionWatch,
    forwarder: JoinHandle<()>,
}

/// Behavior functions behind the declared characteristics
pub struct CharacteristicHandler<B: NetworkBackend> {
    backend: Arc<B>,
    commands: CommandProcessor<B>,
    watch: Mutex<Option<ActiveWatch>>,
}

impl<B: NetworkBackend> CharacteristicHandler<B> {
    pub fn new(backend: Arc<B>, cipher: Cipher) -> Self {
        Self {
            commands: CommandProcessor::new(backend.clone(), cipher),
            backend,
            watch: Mutex::new(None),
        }
    }

    /// Operations this handler actually implements per characteristic
    pub fn capabilities(&self, key: CharacteristicKey) -> CharacteristicFlags {
        match key {
            CharacteristicKey::Connected => CharacteristicFlags::READ_NOTIFY,
            CharacteristicKey::Mac | CharacteristicKey::Ap => CharacteristicFlags::READ,
            CharacteristicKey::Command => CharacteristicFlags::WRITE,
        }
    }

    /// Read payload of a characteristic
    pub async fn read(&self, key: CharacteristicKey) -> Result<Vec<u8>, BehaviorError> {
        match key {
            CharacteristicKey::Connected => {
                // Prefer the live watch over a fresh backend round trip
                let connected = match self.watch.lock().await.as_ref() {
                    Some(active) => active.watch.connected(),
                    None => self.backend.connection_status().await?.connected,
                };
                Ok(vec![u8::from(connected)])
            }
            CharacteristicKey::Mac => {
                Ok(self.backend.mac_address().await?.into_bytes())
            }
            CharacteristicKey::Ap => {
                let status = self.backend.connection_status().await?;
                match AccessPointInfo::from_status(&status) {
                    Some(info) => Ok(serde_json::to_vec(&info)?),
                    None => Ok(Vec::new()),
                }
            }
            CharacteristicKey::Command => Err(BehaviorError::Unsupported {
                key,
                operation: "read",
            }),
        }
    }

    /// Write payload to a characteristic
    pub async fn write(&self, key: CharacteristicKey, payload: &[u8]) -> Result<(), BehaviorError> {
        match key {
            CharacteristicKey::Command => {
                self.commands.execute(payload).await?;
                Ok(())
            }
            _ => Err(BehaviorError::Unsupported {
                key,
                operation: "write",
            }),
        }
    }

    /// Begin forwarding link-state transitions into `sink`
    ///
    /// Idempotent: a second start while a subscription is live is a no-op,
    /// keeping exactly one active watch and one notification per transition.
    pub async fn start_notify(
        &self,
        key: CharacteristicKey,
        sink: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Result<(), BehaviorError> {
        if key != CharacteristicKey::Connected {
            return Err(BehaviorError::Unsupported {
                key,
                operation: "notify",
            });
        }

        let mut slot = self.watch.lock().await;
        if slot.is_some() {
            debug!("notify already active");
            return Ok(());
        }

        let mut watch = self.backend.watch_connection_status().await?;
        let Some(mut events) = watch.take_events() else {
            warn!("watch delivered no event channel");
            return Ok(());
        };

        let forwarder = tokio::spawn(async move {
            while let Some(connected) = events.recv().await {
                if sink.send(vec![u8::from(connected)]).is_err() {
                    break;
                }
            }
        });

        *slot = Some(ActiveWatch { watch, forwarder });
        Ok(())
    }

    /// Tear down the notify subscription; a no-op when none is active
    pub async fn stop_notify(&self, key: CharacteristicKey) -> Result<(), BehaviorError> {
        if key != CharacteristicKey::Connected {
            return Err(BehaviorError::Unsupported {
                key,
                operation: "notify",
            });
        }

        if let Some(mut active) = self.watch.lock().await.take() {
            active.forwarder.abort();
            active.watch.close();
        }
        Ok(())
    }
}
