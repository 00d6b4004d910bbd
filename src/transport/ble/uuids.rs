//! Fixed UUIDs of the provisioning GATT service
//!
//! All five share the `c607d27b-8541-4947-xxxx-47258ea5e9d7` base; the
//! fourth group distinguishes service and characteristics.

use uuid::Uuid;

/// Provisioning service UUID (`...0000...`)
pub const SERVICE_UUID: Uuid = Uuid::from_bytes([
    0xc6, 0x07, 0xd2, 0x7b, 0x85, 0x41, 0x49, 0x47, 0x00, 0x00, 0x47, 0x25, 0x8e, 0xa5, 0xe9, 0xd7,
]);

/// Connection-status characteristic UUID (`...0001...`)
pub const CONNECTED_CHARACTERISTIC_UUID: Uuid = Uuid::from_bytes([
    0xc6, 0x07, 0xd2, 0x7b, 0x85, 0x41, 0x49, 0x47, 0x00, 0x01, 0x47, 0x25, 0x8e, 0xa5, 0xe9, 0xd7,
]);

/// MAC-address characteristic UUID (`...0002...`)
pub const MAC_CHARACTERISTIC_UUID: Uuid = Uuid::from_bytes([
    0xc6, 0x07, 0xd2, 0x7b, 0x85, 0x41, 0x49, 0x47, 0x00, 0x02, 0x47, 0x25, 0x8e, 0xa5, 0xe9, 0xd7,
]);

/// Access-point characteristic UUID (`...0003...`)
pub const AP_CHARACTERISTIC_UUID: Uuid = Uuid::from_bytes([
    0xc6, 0x07, 0xd2, 0x7b, 0x85, 0x41, 0x49, 0x47, 0x00, 0x03, 0x47, 0x25, 0x8e, 0xa5, 0xe9, 0xd7,
]);

/// Command characteristic UUID (`...0004...`)
pub const COMMAND_CHARACTERISTIC_UUID: Uuid = Uuid::from_bytes([
    0xc6, 0x07, 0xd2, 0x7b, 0x85, 0x41, 0x49, 0x47, 0x00, 0x04, 0x47, 0x25, 0x8e, 0xa5, 0xe9, 0xd7,
]);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_uuid_string_forms() {
        assert_eq!(
            SERVICE_UUID.to_string(),
            "c607d27b-8541-4947-0000-47258ea5e9d7"
        );
        assert_eq!(
            CONNECTED_CHARACTERISTIC_UUID.to_string(),
            "c607d27b-8541-4947-0001-47258ea5e9d7"
        );
        assert_eq!(
            MAC_CHARACTERISTIC_UUID.to_string(),
            "c607d27b-8541-4947-0002-47258ea5e9d7"
        );
        assert_eq!(
            AP_CHARACTERISTIC_UUID.to_string(),
            "c607d27b-8541-4947-0003-47258ea5e9d7"
        );
        assert_eq!(
            COMMAND_CHARACTERISTIC_UUID.to_string(),
            "c607d27b-8541-4947-0004-47258ea5e9d7"
        );
    }
}
