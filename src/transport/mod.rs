//! Transports exposing the provisioning endpoint to clients

pub mod ble;
