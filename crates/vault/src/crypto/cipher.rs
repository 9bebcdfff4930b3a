//! AES-256-CBC encryption and decryption of individual string fields.
//!
//! Every call to [`FieldCodec::encrypt`] draws a fresh 16-byte IV from the OS
//! CSPRNG, so the same plaintext never encrypts to the same blob twice.
//!
//! There is no authentication tag. A corrupted blob or the wrong key is
//! detected only through PKCS#7 padding or UTF-8 validation, which catches
//! most but not all tampering.

use std::{fmt, str::FromStr, sync::Arc};

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, Iv, Key, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use super::key::FieldKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Byte length of the CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Number of hex characters the IV occupies at the front of every blob.
pub const IV_HEX_LEN: usize = IV_LEN * 2;

/// Plaintext used by [`FieldCodec::self_test`].
const SELF_TEST_PROBE: &str = "salex-vault self-test ₹";

/// Errors produced by the cipher layer.
///
/// Messages never include plaintext, ciphertext, or key material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The encryption key is missing or malformed.
    #[error("encryption key misconfigured: {0}")]
    Configuration(String),

    /// The blob is malformed, was produced under another key, or is corrupted.
    #[error("decryption failed: {0}")]
    Decryption(&'static str),
}

/// A parsed ciphertext blob.
///
/// The string representation is `hex(iv) || hex(ciphertext)` with no
/// separator, version marker, or tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    /// Raw IV bytes.
    pub iv: [u8; IV_LEN],
    /// Raw PKCS#7-padded ciphertext; always a non-zero multiple of [`BLOCK_LEN`].
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", hex::encode(self.iv), hex::encode(&self.ciphertext))
    }
}

impl FromStr for EncryptedField {
    type Err = CipherError;

    /// Parse a stored blob back into an [`EncryptedField`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decryption`] if the blob is shorter than the IV,
    /// contains non-hex characters, or carries a ciphertext that is empty or
    /// not block aligned.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `get` also rejects a split that would land inside a multi-byte char.
        let (iv_hex, ct_hex) = match (s.get(..IV_HEX_LEN), s.get(IV_HEX_LEN..)) {
            (Some(iv), Some(ct)) => (iv, ct),
            _ => return Err(CipherError::Decryption("blob is too short to hold an IV")),
        };

        let mut iv = [0u8; IV_LEN];
        hex::decode_to_slice(iv_hex, &mut iv)
            .map_err(|_| CipherError::Decryption("IV is not valid hex"))?;

        let ciphertext =
            hex::decode(ct_hex).map_err(|_| CipherError::Decryption("ciphertext is not valid hex"))?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CipherError::Decryption("ciphertext is not block aligned"));
        }

        Ok(Self { iv, ciphertext })
    }
}

/// Symmetric codec for protected fields.
///
/// Holds the process-wide key behind an [`Arc`]; cloning is cheap and every
/// clone shares the same read-only key. Encrypt and decrypt take `&self` and
/// keep no state between calls, so a codec can be used from any number of
/// threads or tasks at once.
#[derive(Clone, Debug)]
pub struct FieldCodec {
    key: Arc<FieldKey>,
}

impl FieldCodec {
    /// Build a codec around an already validated key.
    pub fn new(key: FieldKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Build a codec from the configured hex key, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if no key is configured or the
    /// key is not 64 hex characters.
    pub fn from_hex_key(hex_key: Option<&str>) -> Result<Self, CipherError> {
        let hex_key = hex_key
            .ok_or_else(|| CipherError::Configuration("encryption key is missing".into()))?;
        Ok(Self::new(FieldKey::from_hex(hex_key)?))
    }

    /// Encrypt `plaintext` into a ciphertext blob.
    ///
    /// The empty string is a valid input and yields a 64-character blob
    /// (IV plus one full padding block).
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        self.seal(plaintext.as_bytes(), iv).to_string()
    }

    /// Decrypt a ciphertext blob produced by [`FieldCodec::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decryption`] if the blob is malformed, the
    /// padding does not validate (wrong key or corruption), or the recovered
    /// bytes are not UTF-8.
    pub fn decrypt(&self, blob: &str) -> Result<String, CipherError> {
        let field: EncryptedField = blob.parse()?;
        let plaintext = self.open(&field)?;
        String::from_utf8(plaintext)
            .map_err(|_| CipherError::Decryption("plaintext is not valid UTF-8"))
    }

    /// [`FieldCodec::encrypt`] for optional values. `None` passes through
    /// without touching the cipher.
    pub fn encrypt_optional(&self, plaintext: Option<&str>) -> Option<String> {
        plaintext.map(|p| self.encrypt(p))
    }

    /// [`FieldCodec::decrypt`] for optional values. `None` passes through
    /// without touching the cipher.
    ///
    /// # Errors
    ///
    /// Same as [`FieldCodec::decrypt`] when a blob is present.
    pub fn decrypt_optional(&self, blob: Option<&str>) -> Result<Option<String>, CipherError> {
        blob.map(|b| self.decrypt(b)).transpose()
    }

    /// Round-trip a fixed probe through the codec.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decryption`] if the probe does not survive the
    /// round trip.
    pub fn self_test(&self) -> Result<(), CipherError> {
        let blob = self.encrypt(SELF_TEST_PROBE);
        if self.decrypt(&blob)? != SELF_TEST_PROBE {
            return Err(CipherError::Decryption("self-test round trip mismatch"));
        }
        Ok(())
    }

    fn seal(&self, plaintext: &[u8], iv: [u8; IV_LEN]) -> EncryptedField {
        let ciphertext = Aes256CbcEnc::new(
            Key::<Aes256CbcEnc>::from_slice(self.key.as_bytes()),
            Iv::<Aes256CbcEnc>::from_slice(&iv),
        )
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        EncryptedField { iv, ciphertext }
    }

    fn open(&self, field: &EncryptedField) -> Result<Vec<u8>, CipherError> {
        Aes256CbcDec::new(
            Key::<Aes256CbcDec>::from_slice(self.key.as_bytes()),
            Iv::<Aes256CbcDec>::from_slice(&field.iv),
        )
        .decrypt_padded_vec_mut::<Pkcs7>(&field.ciphertext)
        .map_err(|_| CipherError::Decryption("padding check failed (wrong key or corrupted data)"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn codec() -> FieldCodec {
        FieldCodec::new(FieldKey::generate())
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let codec = codec();
        let blob = codec.encrypt("Acme Corp");
        assert!(blob.len() > IV_HEX_LEN);
        assert_eq!(codec.decrypt(&blob).unwrap(), "Acme Corp");
    }

    #[test]
    fn empty_string_is_one_padding_block() {
        let codec = codec();
        let blob = codec.encrypt("");
        assert_eq!(blob.len(), IV_HEX_LEN + BLOCK_LEN * 2);
        assert_eq!(codec.decrypt(&blob).unwrap(), "");
    }

    #[test]
    fn multi_byte_currency_survives() {
        let codec = codec();
        let blob = codec.encrypt("₹95,000");
        assert_eq!(codec.decrypt(&blob).unwrap(), "₹95,000");
    }

    #[test]
    fn long_and_mixed_inputs_round_trip() {
        let codec = codec();
        let inputs = [
            "John Doe".to_string(),
            "Dwight Schrute".to_string(),
            "2024-01-20".to_string(),
            "naïve café – 東京 🚀".to_string(),
            "x".repeat(15),
            "x".repeat(16),
            "x".repeat(17),
            "Add a short note about this sale... ".repeat(300),
            "₹".repeat(5_000),
        ];
        for input in &inputs {
            let blob = codec.encrypt(input);
            assert_eq!(&codec.decrypt(&blob).unwrap(), input);
        }
    }

    #[test]
    fn blobs_have_hex_iv_and_aligned_ciphertext() {
        let codec = codec();
        for len in [0usize, 1, 15, 16, 31, 32, 100] {
            let blob = codec.encrypt(&"a".repeat(len));
            assert!(blob[..IV_HEX_LEN].chars().all(|c| c.is_ascii_hexdigit()));
            let ct_hex_len = blob.len() - IV_HEX_LEN;
            assert_eq!(ct_hex_len % 2, 0);
            let ct_bytes = ct_hex_len / 2;
            assert!(ct_bytes >= BLOCK_LEN);
            assert_eq!(ct_bytes % BLOCK_LEN, 0);
            // PKCS#7 always adds at least one byte of padding.
            assert_eq!(ct_bytes, (len / BLOCK_LEN + 1) * BLOCK_LEN);
        }
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let codec = codec();
        let a = codec.encrypt("Acme Corp");
        let b = codec.encrypt("Acme Corp");
        assert_ne!(a, b);
        assert_eq!(codec.decrypt(&a).unwrap(), codec.decrypt(&b).unwrap());
    }

    #[test]
    fn ivs_do_not_repeat() {
        let codec = codec();
        let ivs: HashSet<String> = (0..1_000)
            .map(|_| codec.encrypt("same")[..IV_HEX_LEN].to_owned())
            .collect();
        assert_eq!(ivs.len(), 1_000);
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let a = codec();
        let b = codec();
        // CBC + PKCS#7 has no MAC, so a wrong key is caught by the padding and
        // UTF-8 checks. A false accept is possible in principle but needs both
        // to pass by chance.
        for _ in 0..16 {
            let blob = a.encrypt("Closed Won deal with Acme Corp");
            assert!(matches!(b.decrypt(&blob), Err(CipherError::Decryption(_))));
        }
    }

    #[test]
    fn tampered_ciphertext_never_yields_original() {
        let codec = codec();
        let original = "Tech Solutions paid ₹57,000 on 2024-02-28";
        let blob = codec.encrypt(original);
        for pos in IV_HEX_LEN..blob.len() {
            let mut chars: Vec<char> = blob.chars().collect();
            chars[pos] = if chars[pos] == '0' { '1' } else { '0' };
            let tampered: String = chars.into_iter().collect();
            match codec.decrypt(&tampered) {
                Ok(plaintext) => assert_ne!(plaintext, original, "flip at {pos}"),
                Err(e) => assert!(matches!(e, CipherError::Decryption(_)), "flip at {pos}"),
            }
        }
    }

    #[test]
    fn malformed_blobs_rejected() {
        let codec = codec();
        let valid = codec.encrypt("hello");
        let cases = [
            String::new(),
            "abc".to_string(),
            valid[..IV_HEX_LEN].to_string(),
            valid[..valid.len() - 2].to_string(),
            valid[..valid.len() - 1].to_string(),
            format!("zz{}", &valid[2..]),
            format!("{}zz", &valid[..valid.len() - 2]),
            format!("{}₹", &valid[..IV_HEX_LEN - 1]),
        ];
        for case in &cases {
            assert!(
                matches!(codec.decrypt(case), Err(CipherError::Decryption(_))),
                "accepted malformed blob {case:?}"
            );
        }
    }

    #[test]
    fn uppercase_hex_accepted() {
        let codec = codec();
        let blob = codec.encrypt("Jane Smith").to_uppercase();
        assert_eq!(codec.decrypt(&blob).unwrap(), "Jane Smith");
    }

    #[test]
    fn optional_values_pass_through() {
        let codec = codec();
        assert_eq!(codec.encrypt_optional(None), None);
        assert_eq!(codec.decrypt_optional(None), Ok(None));
        // Passthrough must not even parse its input: no blob, no error.
        let sealed = codec.encrypt_optional(Some("note")).unwrap();
        assert_eq!(codec.decrypt_optional(Some(&sealed)).unwrap().as_deref(), Some("note"));
    }

    #[test]
    fn missing_key_is_configuration_error() {
        assert!(matches!(
            FieldCodec::from_hex_key(None),
            Err(CipherError::Configuration(_))
        ));
        assert!(matches!(
            FieldCodec::from_hex_key(Some("not-hex")),
            Err(CipherError::Configuration(_))
        ));
    }

    const KNOWN_KEY: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";
    const KNOWN_IV: [u8; IV_LEN] = [15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0];
    // AES-256-CBC/PKCS#7 of "Acme Corp" under KNOWN_KEY and KNOWN_IV, as
    // produced by `openssl enc -aes-256-cbc` and stored by earlier deployments.
    const KNOWN_BLOB: &str = "0f0e0d0c0b0a0908070605040302010061cfe8e57743b16229fbaf89a6465b51";

    #[test]
    fn decrypts_known_stored_blob() {
        let codec = FieldCodec::from_hex_key(Some(KNOWN_KEY)).unwrap();
        assert_eq!(codec.decrypt(KNOWN_BLOB).unwrap(), "Acme Corp");
    }

    #[test]
    fn seal_with_known_iv_matches_stored_blob() {
        let codec = FieldCodec::from_hex_key(Some(KNOWN_KEY)).unwrap();
        assert_eq!(codec.seal(b"Acme Corp", KNOWN_IV).to_string(), KNOWN_BLOB);

        let parsed: EncryptedField = KNOWN_BLOB.parse().unwrap();
        assert_eq!(parsed.iv, KNOWN_IV);
        assert_eq!(parsed.to_string(), KNOWN_BLOB);
    }

    #[test]
    fn fixed_iv_is_deterministic() {
        let codec = codec();
        let iv = [7u8; IV_LEN];
        let a = codec.seal(b"Stanley Hudson", iv);
        let b = codec.seal(b"Stanley Hudson", iv);
        assert_eq!(a, b);
        assert_eq!(codec.open(&a).unwrap(), b"Stanley Hudson");
    }

    #[test]
    fn self_test_passes() {
        assert!(codec().self_test().is_ok());
    }

    #[test]
    fn concurrent_use_shares_one_codec() {
        let codec = codec();
        std::thread::scope(|s| {
            for t in 0..8 {
                let codec = &codec;
                s.spawn(move || {
                    for i in 0..50 {
                        let plaintext = format!("deal {t}-{i}");
                        let blob = codec.encrypt(&plaintext);
                        assert_eq!(codec.decrypt(&blob).unwrap(), plaintext);
                    }
                });
            }
        });
    }
}
