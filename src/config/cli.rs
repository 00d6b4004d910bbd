//! Command-line argument parsing

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[clap(name = "wifi-provisioning", version, author)]
#[clap(about = "WiFi credential provisioning over a BLE GATT service")]
pub struct CliArgs {
    /// Pre-shared 256-bit key as 64 hex characters
    #[clap(short = 'k', long)]
    pub local_key: String,

    /// Local name broadcast in the BLE advertisement
    #[clap(short = 'n', long, default_value = "wifi-prov")]
    pub local_name: String,

    /// D-Bus object path the peripheral objects are rooted at
    #[clap(long, default_value = "/org/wifiprov")]
    pub path: String,

    /// Log level (error, warn, info, debug, trace)
    #[clap(short = 'l', long, default_value = "info")]
    pub level: String,
}
