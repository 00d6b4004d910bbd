//! Runtime settings, validated before the service starts

use thiserror::Error;
use zbus::zvariant::{ObjectPath, OwnedObjectPath};

use crate::config::CliArgs;
use crate::core::crypto::KEY_SIZE;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("local key is not valid hex: {0}")]
    KeyEncoding(#[from] hex::FromHexError),

    #[error("local key must be {KEY_SIZE} bytes, got {0}")]
    KeyLength(usize),

    #[error("invalid object path: {0}")]
    Path(#[from] zbus::zvariant::Error),
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub key: [u8; KEY_SIZE],
    pub local_name: String,
    pub root_path: OwnedObjectPath,
    pub level: String,
}

impl TryFrom<CliArgs> for Settings {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let key_bytes = hex::decode(&args.local_key)?;
        let key: [u8; KEY_SIZE] = key_bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| ConfigError::KeyLength(bytes.len()))?;

        let root_path = ObjectPath::try_from(args.path)?.into();

        Ok(Settings {
            key,
            local_name: args.local_name,
            root_path,
            level: args.level,
        })
    }
}
