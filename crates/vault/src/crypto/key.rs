//! [`FieldKey`]: the process-wide AES-256 key.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cipher::CipherError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Length of the key's hex encoding as supplied in `ENCRYPTION_KEY`.
pub const KEY_HEX_LEN: usize = KEY_LEN * 2;

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// Loaded once at startup and shared read-only through
/// [`super::FieldCodec`]. The buffer is zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct FieldKey {
    bytes: [u8; KEY_LEN],
}

impl FieldKey {
    /// Parse a key from its 64-character hex form. Surrounding whitespace is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if the string has the wrong
    /// length or contains non-hex characters.
    pub fn from_hex(hex_key: &str) -> Result<Self, CipherError> {
        let hex_key = hex_key.trim();
        if hex_key.len() != KEY_HEX_LEN {
            return Err(CipherError::Configuration(format!(
                "expected {KEY_HEX_LEN} hex characters, got {}",
                hex_key.len()
            )));
        }
        let mut key = Self {
            bytes: [0u8; KEY_LEN],
        };
        hex::decode_to_slice(hex_key, &mut key.bytes)
            .map_err(|_| CipherError::Configuration("key is not valid hex".into()))?;
        Ok(key)
    }

    /// A fresh random key from the OS CSPRNG.
    #[cfg(test)]
    pub fn generate() -> Self {
        use rand::{rngs::OsRng, RngCore};
        let mut key = Self {
            bytes: [0u8; KEY_LEN],
        };
        OsRng.fill_bytes(&mut key.bytes);
        key
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("FieldKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_KEY: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    #[test]
    fn parses_valid_hex() {
        let key = FieldKey::from_hex(HEX_KEY).unwrap();
        assert_eq!(key.as_bytes()[1], 0x11);
        assert_eq!(key.as_bytes()[KEY_LEN - 1], 0xff);
    }

    #[test]
    fn trims_whitespace() {
        assert!(FieldKey::from_hex(&format!("  {HEX_KEY}\n")).is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        let err = FieldKey::from_hex(&HEX_KEY[..32]).unwrap_err();
        assert!(matches!(err, CipherError::Configuration(_)));
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn rejects_non_hex() {
        let bad = format!("zz{}", &HEX_KEY[2..]);
        assert!(matches!(
            FieldKey::from_hex(&bad),
            Err(CipherError::Configuration(_))
        ));
    }

    #[test]
    fn error_does_not_echo_key() {
        let bad = format!("zz{}", &HEX_KEY[2..]);
        let err = FieldKey::from_hex(&bad).unwrap_err();
        assert!(!err.to_string().contains(&HEX_KEY[2..]));
    }

    #[test]
    fn redacted_in_debug() {
        let key = FieldKey::from_hex(HEX_KEY).unwrap();
        let printed = format!("{key:?}");
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("0011"));
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(FieldKey::generate().as_bytes(), FieldKey::generate().as_bytes());
    }
}
