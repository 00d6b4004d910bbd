//! Hand-built bus method dispatcher
//!
//! BlueZ calls back into a registered GATT application using plain bus
//! RPC. Instead of exporting objects through a generic interface framework,
//! every inbound method call is intercepted from the raw message stream and
//! routed by (path, interface, member) to the object model or the behavior
//! set, so the reply signatures match exactly what the daemon expects.
//!
//! Unrecognized calls are ignored, not answered: the shared connection also
//! carries traffic for the proxies and the daemon times out anything that
//! was truly meant for us but malformed.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use zbus::message::Type;
use zbus::zvariant::{DynamicType, ObjectPath, OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, Message, MessageStream};

use crate::network::NetworkBackend;
use crate::transport::ble::bluez::{
    BLUEZ_SERVICE, ERROR_FAILED, GATT_CHARACTERISTIC_IFACE, LE_ADVERTISEMENT_IFACE,
    OBJECT_MANAGER_IFACE, PROPERTIES_IFACE,
};
use crate::transport::ble::characteristics::CharacteristicHandler;
use crate::transport::ble::gatt::{Advertisement, CharacteristicKey, GattService};

/// Routes inbound method calls to the object model and behavior set
pub struct MessageDispatcher<B: NetworkBackend> {
    connection: Connection,
    adv_path: OwnedObjectPath,
    service_path: OwnedObjectPath,
    advertisement: Advertisement,
    service: GattService,
    handler: CharacteristicHandler<B>,
}

impl<B: NetworkBackend> MessageDispatcher<B> {
    pub fn new(
        connection: Connection,
        adv_path: OwnedObjectPath,
        service_path: OwnedObjectPath,
        advertisement: Advertisement,
        service: GattService,
        handler: CharacteristicHandler<B>,
    ) -> Self {
        Self {
            connection,
            adv_path,
            service_path,
            advertisement,
            service,
            handler,
        }
    }

    /// Consume the message stream until the connection closes
    ///
    /// Each method call is handled in its own task: a slow backend call
    /// blocks only its own reply, never the stream.
    pub async fn run(self: Arc<Self>, mut stream: MessageStream) {
        while let Some(msg) = stream.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    debug!("message stream error: {e}");
                    continue;
                }
            };

            if msg.header().message_type() != Type::MethodCall {
                continue;
            }

            let dispatcher = self.clone();
            tokio::spawn(async move {
                dispatcher.dispatch(msg).await;
            });
        }
        debug!("message stream ended");
    }

    /// Route one method call; unrecognized combinations are left unanswered
    async fn dispatch(&self, msg: Message) {
        let header = msg.header();
        let (Some(path), Some(interface), Some(member)) =
            (header.path(), header.interface(), header.member())
        else {
            return;
        };

        if path.as_str() == self.adv_path.as_str() {
            if interface.as_str() == PROPERTIES_IFACE && member.as_str() == "GetAll" {
                match msg.body().deserialize::<String>() {
                    Ok(iface) if iface == LE_ADVERTISEMENT_IFACE => {
                        trace!("advertisement GetAll");
                        self.reply(&msg, &self.advertisement.properties()).await;
                    }
                    Ok(iface) => trace!(iface, "GetAll for foreign interface, ignoring"),
                    Err(e) => warn!("malformed GetAll body: {e}"),
                }
            }
            return;
        }

        if path.as_str() == self.service_path.as_str() {
            if interface.as_str() == OBJECT_MANAGER_IFACE && member.as_str() == "GetManagedObjects"
            {
                trace!("service GetManagedObjects");
                match self.service.managed_objects(&self.service_path) {
                    Ok(objects) => self.reply(&msg, &objects).await,
                    Err(e) => warn!("object tree construction failed: {e}"),
                }
            }
            return;
        }

        if interface.as_str() == GATT_CHARACTERISTIC_IFACE {
            let Some(key) = resolve_characteristic(&self.service_path, path) else {
                warn!(path = %path, "characteristic call on unknown path");
                return;
            };
            self.dispatch_characteristic(&msg, key, member.as_str()).await;
        }
    }

    async fn dispatch_characteristic(&self, msg: &Message, key: CharacteristicKey, member: &str) {
        let declared = self
            .service
            .characteristics
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.flags)
            .unwrap_or_default();

        match member {
            "ReadValue" => {
                if !declared.read {
                    warn!(%key, "read on a characteristic without the read flag");
                    return;
                }
                match self.handler.read(key).await {
                    Ok(payload) => self.reply(msg, &payload).await,
                    Err(e) => {
                        warn!(%key, "read behavior failed: {e}");
                        self.reply_failed(msg).await;
                    }
                }
            }
            "WriteValue" => {
                if !declared.write {
                    warn!(%key, "write on a characteristic without the write flag");
                    return;
                }
                let payload = match write_payload(msg) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(%key, "malformed WriteValue body: {e}");
                        self.reply_failed(msg).await;
                        return;
                    }
                };
                match self.handler.write(key, &payload).await {
                    Ok(()) => self.reply(msg, &0u32).await,
                    Err(e) => {
                        warn!(%key, "write behavior failed: {e}");
                        self.reply_failed(msg).await;
                    }
                }
            }
            "StartNotify" => {
                if !declared.notify {
                    warn!(%key, "notify on a characteristic without the notify flag");
                    return;
                }
                let (sink, notifications) = mpsc::unbounded_channel();
                match self.handler.start_notify(key, sink).await {
                    Ok(()) => {
                        self.spawn_notifier(key, notifications);
                        self.reply(msg, &()).await;
                    }
                    Err(e) => {
                        warn!(%key, "notify registration failed: {e}");
                        self.reply_failed(msg).await;
                    }
                }
            }
            "StopNotify" => {
                if !declared.notify {
                    warn!(%key, "notify on a characteristic without the notify flag");
                    return;
                }
                match self.handler.stop_notify(key).await {
                    Ok(()) => self.reply(msg, &()).await,
                    Err(e) => {
                        warn!(%key, "notify teardown failed: {e}");
                        self.reply_failed(msg).await;
                    }
                }
            }
            _ => trace!(%key, member, "ignoring unhandled characteristic member"),
        }
    }

    /// Emit one `PropertiesChanged` signal per queued notification payload
    ///
    /// The channel preserves per-subscription ordering; the task ends when
    /// the behavior drops its sink.
    fn spawn_notifier(&self, key: CharacteristicKey, mut notifications: mpsc::UnboundedReceiver<Vec<u8>>) {
        let connection = self.connection.clone();
        let path = match GattService::characteristic_path(&self.service_path, key) {
            Ok(path) => path,
            Err(e) => {
                warn!(%key, "notification path construction failed: {e}");
                return;
            }
        };

        tokio::spawn(async move {
            while let Some(payload) = notifications.recv().await {
                let changed: HashMap<&str, Value<'_>> =
                    HashMap::from([("Value", Value::from(payload))]);
                let result: zbus::Result<()> = async {
                    let signal =
                        Message::signal(path.as_ref(), PROPERTIES_IFACE, "PropertiesChanged")?
                            .destination(BLUEZ_SERVICE)?
                            .build(&(GATT_CHARACTERISTIC_IFACE, changed, Vec::<String>::new()))?;
                    connection.send(&signal).await
                }
                .await;
                if let Err(e) = result {
                    warn!("notification signal failed: {e}");
                }
            }
        });
    }

    async fn reply<T>(&self, call: &Message, body: &T)
    where
        T: Serialize + DynamicType,
    {
        let result: zbus::Result<()> = async {
            self.connection.send(&build_reply(call, body)?).await
        }
        .await;
        if let Err(e) = result {
            warn!("method reply failed: {e}");
        }
    }

    /// Generic operation-failed error; the underlying detail stays local
    async fn reply_failed(&self, call: &Message) {
        let result: zbus::Result<()> = async {
            self.connection.send(&build_failure(call)?).await
        }
        .await;
        if let Err(e) = result {
            warn!("error reply failed: {e}");
        }
    }
}

/// Method return carrying `body`, with the exact signature `body` implies
fn build_reply<T>(call: &Message, body: &T) -> zbus::Result<Message>
where
    T: Serialize + DynamicType,
{
    Message::method_reply(call)?.build(body)
}

/// Bodyless generic failure reply
fn build_failure(call: &Message) -> zbus::Result<Message> {
    Message::method_error(call, ERROR_FAILED)?.build(&())
}

/// First body argument of a `WriteValue` call (raw bytes; options ignored)
fn write_payload(call: &Message) -> zbus::Result<Vec<u8>> {
    let (payload, _options): (Vec<u8>, HashMap<String, OwnedValue>) =
        call.body().deserialize()?;
    Ok(payload)
}

/// Resolve a path below the service root back to its characteristic key
fn resolve_characteristic(
    service_path: &ObjectPath<'_>,
    path: &ObjectPath<'_>,
) -> Option<CharacteristicKey> {
    let suffix = path
        .as_str()
        .strip_prefix(service_path.as_str())?
        .strip_prefix('/')?;
    CharacteristicKey::from_path_suffix(suffix)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolve(service_path: &str, call_path: &str) -> Option<CharacteristicKey> {
        let service_path = ObjectPath::try_from(service_path.to_string()).unwrap();
        let call_path = ObjectPath::try_from(call_path.to_string()).unwrap();
        resolve_characteristic(&service_path, &call_path)
    }

    #[test]
    fn test_characteristic_path_resolution() {
        assert_eq!(
            resolve("/org/wifiprov/prov", "/org/wifiprov/prov/command"),
            Some(CharacteristicKey::Command)
        );
        assert_eq!(
            resolve("/org/wifiprov/prov", "/org/wifiprov/prov/connected"),
            Some(CharacteristicKey::Connected)
        );
        assert_eq!(resolve("/org/wifiprov/prov", "/org/wifiprov/prov"), None);
        assert_eq!(
            resolve("/org/wifiprov/prov", "/org/wifiprov/prov/bogus"),
            None
        );
        assert_eq!(resolve("/org/wifiprov/prov", "/org/other/connected"), None);
    }

    fn write_value_call<T>(body: &T) -> Message
    where
        T: Serialize + DynamicType,
    {
        Message::method("/org/wifiprov/prov/command", "WriteValue")
            .unwrap()
            .interface(GATT_CHARACTERISTIC_IFACE)
            .unwrap()
            .build(body)
            .unwrap()
    }

    #[test]
    fn test_write_payload_extraction() {
        let call = write_value_call(&(
            vec![0x7bu8, 0x7d],
            HashMap::<String, Value<'_>>::new(),
        ));
        assert_eq!(write_payload(&call).unwrap(), vec![0x7b, 0x7d]);

        // wrong body signature is an error, not a panic
        let bad = write_value_call(&"oops");
        assert!(write_payload(&bad).is_err());
    }

    #[test]
    fn test_reply_shapes() {
        let call = write_value_call(&(
            vec![0x01u8],
            HashMap::<String, Value<'_>>::new(),
        ));

        // write success carries a zero status code (signature "u")
        let write_reply = build_reply(&call, &0u32).unwrap();
        assert_eq!(write_reply.header().message_type(), Type::MethodReturn);
        assert_eq!(write_reply.body().deserialize::<u32>().unwrap(), 0);

        // read success carries the raw payload (signature "ay")
        let read_reply = build_reply(&call, &vec![0x01u8, 0x00]).unwrap();
        assert_eq!(
            read_reply.body().deserialize::<Vec<u8>>().unwrap(),
            vec![0x01, 0x00]
        );

        // notify success is an empty method return
        let empty_reply = build_reply(&call, &()).unwrap();
        assert_eq!(empty_reply.header().message_type(), Type::MethodReturn);
    }

    #[test]
    fn test_failure_reply_is_generic_bus_error() {
        let call = write_value_call(&(b"{not json".to_vec(), HashMap::<String, Value<'_>>::new()));

        let failure = build_failure(&call).unwrap();
        assert_eq!(failure.header().message_type(), Type::Error);
        assert_eq!(
            failure.header().error_name().map(|name| name.as_str()),
            Some(ERROR_FAILED)
        );
        // no detail leaks into the error body
        assert!(failure.body().deserialize::<()>().is_ok());
    }
}
