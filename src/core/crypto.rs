//! Symmetric decryption of BLE command fields
//!
//! Sensitive command fields (SSID, PSK, disconnect challenge) travel as
//! base64 ciphertext, encrypted with AES-256-CBC/PKCS7 under a pre-shared
//! key and a per-message IV supplied by the caller. Confidentiality is
//! provided here at the application layer; the BLE link itself is not
//! encrypted.

use aes::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::core::error::CryptoError;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the pre-shared key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector in bytes (AES block size)
pub const IV_SIZE: usize = 16;

/// AES-256-CBC decryptor bound to the process-lifetime pre-shared key
#[derive(Clone)]
pub struct Cipher {
    key: [u8; KEY_SIZE],
}

impl Cipher {
    /// Create a cipher from a 256-bit pre-shared key
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Decrypt a base64 ciphertext with a base64 IV
    ///
    /// The IV must be fresh per command; reuse across two different payloads
    /// with the same key is a caller error this layer does not detect.
    pub fn decrypt(&self, iv_b64: &str, data_b64: &str) -> Result<Vec<u8>, CryptoError> {
        let iv = BASE64.decode(iv_b64)?;
        let data = BASE64.decode(data_b64)?;

        let decryptor = Aes256CbcDec::new_from_slices(&self.key, &iv)
            .map_err(|_| CryptoError::InvalidIvLength)?;

        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&data)
            .map_err(|_| CryptoError::Decrypt)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug output
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use aes::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

    use super::{IV_SIZE, KEY_SIZE};

    type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

    /// Test counterpart of [`super::Cipher::decrypt`]: returns base64 ciphertext
    pub fn encrypt(key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> String {
        let ciphertext = Aes256CbcEnc::new_from_slices(key, iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        BASE64.encode(ciphertext)
    }

    pub fn encode_iv(iv: &[u8; IV_SIZE]) -> String {
        BASE64.encode(iv)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::test_support::{encode_iv, encrypt};
    use super::*;

    const KEY: [u8; KEY_SIZE] = [0x42; KEY_SIZE];
    const IV: [u8; IV_SIZE] = [0x24; IV_SIZE];

    #[test]
    fn test_round_trip() {
        let cipher = Cipher::new(KEY);

        for plaintext in [&b"home-net"[..], b"", b"s3cr3t!", &[0u8; 64]] {
            let ciphertext = encrypt(&KEY, &IV, plaintext);
            let decrypted = cipher.decrypt(&encode_iv(&IV), &ciphertext).unwrap();
            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let cipher = Cipher::new([0x01; KEY_SIZE]);
        let ciphertext = encrypt(&KEY, &IV, b"home-net");

        // Padding check makes a wrong key fail (not guaranteed in general
        // for CBC, but reliable for this ciphertext length)
        let result = cipher.decrypt(&encode_iv(&IV), &ciphertext);
        assert!(matches!(result, Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let cipher = Cipher::new(KEY);

        let result = cipher.decrypt("!!!", "AAAA");
        assert!(matches!(result, Err(CryptoError::Base64(_))));
    }

    #[test]
    fn test_invalid_iv_length_rejected() {
        let cipher = Cipher::new(KEY);
        let ciphertext = encrypt(&KEY, &IV, b"data");

        let short_iv = BASE64.encode([0u8; 4]);
        let result = cipher.decrypt(&short_iv, &ciphertext);
        assert!(matches!(result, Err(CryptoError::InvalidIvLength)));
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let cipher = Cipher::new(KEY);
        let truncated = BASE64.encode([0u8; 7]);

        let result = cipher.decrypt(&encode_iv(&IV), &truncated);
        assert!(matches!(result, Err(CryptoError::Decrypt)));
    }
}
