//! Command protocol for the write-only command characteristic
//!
//! A single write carries one UTF-8 JSON command. Sensitive fields are
//! AES-256-CBC encrypted with the pre-shared key and a per-command IV:
//!
//! ```json
//! {"type":"connect","iv":"<b64>","ssid":"<b64>","security":{"type":"wpa-psk","psk":"<b64>"}}
//! {"type":"disconnect","iv":"<b64>","challenge":"<b64 of 'disconnect'>"}
//! ```
//!
//! Disconnect is authorized by a challenge: the caller proves possession of
//! the pre-shared key by encrypting the fixed literal `disconnect`.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::core::crypto::Cipher;
use crate::core::error::{ProtocolError, ProtocolResult};
use crate::core::types::WifiSecurity;
use crate::network::NetworkBackend;

/// Plaintext the decrypted disconnect challenge must equal
const DISCONNECT_CHALLENGE: &[u8] = b"disconnect";

/// A decoded command, alive for one write-handler invocation only
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    Connect {
        iv: String,
        ssid: String,
        #[serde(default)]
        security: Option<SecuritySpec>,
    },
    Disconnect {
        iv: String,
        challenge: String,
    },
}

/// Security descriptor of a connect command, fields still encrypted
#[derive(Debug, Deserialize)]
pub struct SecuritySpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub psk: String,
}

/// Decode/validate/execute pipeline bridging BLE commands to the backend
///
/// Execution is serialized: one in-flight command at a time, later commands
/// wait on the gate instead of racing at the network layer.
pub struct CommandProcessor<B: NetworkBackend> {
    backend: Arc<B>,
    cipher: Cipher,
    gate: tokio::sync::Mutex<()>,
}

impl<B: NetworkBackend> CommandProcessor<B> {
    /// Create a processor bound to the backend and pre-shared key
    pub fn new(backend: Arc<B>, cipher: Cipher) -> Self {
        Self {
            backend,
            cipher,
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Execute one raw command payload
    ///
    /// Any error leaves the connection state untouched; nothing is partially
    /// applied and nothing is retried.
    pub async fn execute(&self, raw: &[u8]) -> ProtocolResult<()> {
        let command: Command = serde_json::from_slice(raw)?;
        let _in_flight = self.gate.lock().await;

        match command {
            Command::Connect { iv, ssid, security } => {
                let ssid = self.decrypt_string(&iv, &ssid)?;

                let security = match security {
                    Some(spec) if spec.kind == "wpa-psk" => {
                        let psk = self.decrypt_string(&iv, &spec.psk)?;
                        Some(WifiSecurity::WpaPsk { psk })
                    }
                    Some(spec) => {
                        return Err(ProtocolError::UnknownSecurityType(spec.kind));
                    }
                    None => None,
                };

                info!(%ssid, secured = security.is_some(), "connect command");
                self.backend.connect(&ssid, security.as_ref()).await?;
            }
            Command::Disconnect { iv, challenge } => {
                let challenge = self.cipher.decrypt(&iv, &challenge)?;
                if challenge != DISCONNECT_CHALLENGE {
                    debug!("disconnect challenge mismatch");
                    return Err(ProtocolError::InvalidChallenge);
                }

                info!("disconnect command");
                self.backend.disconnect().await?;
            }
        }

        Ok(())
    }

    fn decrypt_string(&self, iv: &str, data: &str) -> ProtocolResult<String> {
        let plaintext = self.cipher.decrypt(iv, data)?;
        String::from_utf8(plaintext).map_err(|_| ProtocolError::InvalidUtf8)
    }
}
