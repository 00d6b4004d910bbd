//! Peripheral installer
//!
//! One-shot setup of the provisioning peripheral: guard against double
//! installation, build and validate the object model, wire the dispatcher
//! into the raw message stream, power the adapter, then register the
//! application and the advertisement with BlueZ. The application must be
//! registered before advertising starts so an inbound connection always
//! finds a fully populated object tree.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};
use zbus::zvariant::{ObjectPath, OwnedObjectPath};
use zbus::{Connection, MessageStream};

use crate::core::crypto::Cipher;
use crate::core::error::{BleError, BleResult};
use crate::network::NetworkBackend;
use crate::transport::ble::bluez::{
    AdapterProxy, GattManagerProxy, LeAdvertisingManagerProxy, find_adapter,
};
use crate::transport::ble::characteristics::CharacteristicHandler;
use crate::transport::ble::dispatcher::MessageDispatcher;
use crate::transport::ble::gatt::{Advertisement, GattService};

/// The provisioning GATT peripheral, installable at most once
pub struct ProvisioningPeripheral<B: NetworkBackend> {
    connection: Connection,
    backend: Arc<B>,
    cipher: Cipher,
    root_path: OwnedObjectPath,
    local_name: String,
    installed: AtomicBool,
}

impl<B: NetworkBackend> ProvisioningPeripheral<B> {
    /// Create an uninstalled peripheral below `root_path`
    pub fn new(
        connection: Connection,
        backend: Arc<B>,
        cipher: Cipher,
        root_path: OwnedObjectPath,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            backend,
            cipher,
            root_path,
            local_name: local_name.into(),
            installed: AtomicBool::new(false),
        }
    }

    /// Whether the Bluetooth adapter is powered
    pub async fn is_powered(&self) -> BleResult<bool> {
        let adapter = find_adapter(&self.connection).await?;
        let proxy = AdapterProxy::new(&self.connection, adapter).await?;
        Ok(proxy.powered().await?)
    }

    /// Power the Bluetooth adapter on or off
    pub async fn set_powered(&self, powered: bool) -> BleResult<()> {
        let adapter = find_adapter(&self.connection).await?;
        let proxy = AdapterProxy::new(&self.connection, adapter).await?;
        Ok(proxy.set_powered(powered).await?)
    }

    /// Install the peripheral: dispatcher, adapter power, registrations
    ///
    /// Fails fast on a second call, even after a failed first attempt; a
    /// partially registered application is not recoverable in-process.
    pub async fn install(&self) -> BleResult<()> {
        if !latch(&self.installed) {
            return Err(BleError::AlreadyInstalled);
        }

        let adv_path = Self::child_path(&self.root_path, "adv")?;
        let service_path = Self::child_path(&self.root_path, "prov")?;

        let service = GattService::provisioning();
        let handler = CharacteristicHandler::new(self.backend.clone(), self.cipher.clone());
        service.validate(|key| handler.capabilities(key))?;

        // Intercept inbound calls before BlueZ can see the registrations
        let stream = MessageStream::from(&self.connection);
        let dispatcher = Arc::new(MessageDispatcher::new(
            self.connection.clone(),
            adv_path.clone(),
            service_path.clone(),
            Advertisement::new(self.local_name.clone()),
            service,
            handler,
        ));
        tokio::spawn(dispatcher.run(stream));

        let adapter = find_adapter(&self.connection).await?;
        debug!(adapter = %adapter, "using bluetooth adapter");

        let adapter_proxy = AdapterProxy::new(&self.connection, adapter.clone()).await?;
        if !adapter_proxy.powered().await? {
            info!("powering bluetooth adapter on");
            adapter_proxy.set_powered(true).await?;
        }

        let gatt_manager = GattManagerProxy::new(&self.connection, adapter.clone()).await?;
        gatt_manager
            .register_application(&service_path, HashMap::new())
            .await?;
        info!(path = %service_path, "gatt application registered");

        let advertising = LeAdvertisingManagerProxy::new(&self.connection, adapter).await?;
        advertising
            .register_advertisement(&adv_path, HashMap::new())
            .await?;
        info!(path = %adv_path, name = %self.local_name, "advertisement registered");

        Ok(())
    }

    fn child_path(root: &ObjectPath<'_>, suffix: &str) -> BleResult<OwnedObjectPath> {
        let path = ObjectPath::try_from(format!("{root}/{suffix}"))?;
        Ok(path.into())
    }
}

/// Latch the install flag; false if it was already set
fn latch(installed: &AtomicBool) -> bool {
    installed
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_child_paths() {
        let root = ObjectPath::try_from("/org/wifiprov").unwrap();
        assert_eq!(
            ProvisioningPeripheral::<crate::network::MockNetworkBackend>::child_path(&root, "adv")
                .unwrap()
                .as_str(),
            "/org/wifiprov/adv"
        );
        assert_eq!(
            ProvisioningPeripheral::<crate::network::MockNetworkBackend>::child_path(&root, "prov")
                .unwrap()
                .as_str(),
            "/org/wifiprov/prov"
        );
    }

    #[test]
    fn test_install_latches_once() {
        let installed = AtomicBool::new(false);

        assert!(latch(&installed));
        // stays latched even if the first install attempt failed later on
        assert!(!latch(&installed));
        assert!(!latch(&installed));
    }
}
